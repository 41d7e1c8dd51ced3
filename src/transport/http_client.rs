use crate::config::Config;
use crate::constants::USER_AGENT;
use crate::error::{AppError, AuthError};
use crate::presentation::navigation::Navigator;
use crate::session::credential::{Credential, CredentialStore};
use crate::session::interface::Authenticator;
use crate::transport::model::{ApiResponse, RequestDescriptor, RequestPhase};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Builds the HTTP client shared by the transport and the authenticator.
///
/// The cookie store must be on: the refresh token travels as an HttpOnly
/// cookie set at login and read back by the session-refresh endpoint.
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .timeout(Duration::from_secs(config.rest_api.timeout))
        .build()
}

/// Authenticated access to the feed API.
#[async_trait]
pub trait FeedHttpClient: Send + Sync {
    /// Sends one request and settles it into a 2xx response or a classified error.
    async fn send(&self, descriptor: RequestDescriptor) -> Result<ApiResponse, AppError>;

    /// Serializes `body`, sends it, and deserializes the response.
    async fn request<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> Result<R, AppError>
    where
        B: Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let mut descriptor = RequestDescriptor::new(method, path);
        if let Some(body) = body {
            descriptor = descriptor.with_json(body)?;
        }
        self.send(descriptor).await?.json()
    }
}

/// Session transport: attaches the current credential to every call and, on
/// the first `401`, renews the session once and resends. A second `401` for
/// the same request, or a failed renewal, ends the session.
pub struct SessionTransport {
    client: Client,
    config: Arc<Config>,
    credentials: Arc<CredentialStore>,
    authenticator: Arc<dyn Authenticator>,
    navigator: Arc<dyn Navigator>,
    renewal: Mutex<()>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Tracks and traces one request's walk through [`RequestPhase`].
struct PhaseTracker {
    label: String,
    phase: RequestPhase,
}

impl PhaseTracker {
    fn new(descriptor: &RequestDescriptor) -> Self {
        Self {
            label: descriptor.to_string(),
            phase: RequestPhase::Unsent,
        }
    }

    fn advance(&mut self, next: RequestPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "invalid request phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!("{}: {:?} -> {:?}", self.label, self.phase, next);
        self.phase = next;
    }

    fn on_error<T>(&mut self, result: Result<T, AppError>) -> Result<T, AppError> {
        if result.is_err() {
            self.advance(RequestPhase::Failed);
        }
        result
    }
}

impl SessionTransport {
    pub fn new(
        client: Client,
        config: Arc<Config>,
        credentials: Arc<CredentialStore>,
        authenticator: Arc<dyn Authenticator>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            client,
            config,
            credentials,
            authenticator,
            navigator,
            renewal: Mutex::new(()),
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        credential: Option<&Credential>,
    ) -> Result<Response, AppError> {
        let url = self.config.rest_api.url(descriptor.path());
        let mut request = self.client.request(descriptor.method().clone(), &url);
        if let Some(credential) = credential {
            request = request.header(AUTHORIZATION, credential.bearer_header()?);
        }
        if let Some(body) = descriptor.body() {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Obtains a fresh credential. Renewals are serialized; a request whose
    /// credential was already replaced by a concurrent renewal reuses the
    /// replacement instead of refreshing again, and one whose session was
    /// already ended by a concurrent request fails without refreshing.
    /// A failed refresh ends the session before the lock is released.
    async fn renew(&self, sent_with: Option<&Credential>) -> Result<(), AuthError> {
        let _guard = self.renewal.lock().await;
        match (sent_with, self.credentials.current()) {
            (_, Some(current)) if sent_with != Some(&current) => {
                debug!("Credential already renewed by a concurrent request");
                return Ok(());
            }
            (Some(_), None) => {
                debug!("Session already ended by a concurrent request");
                return Err(AuthError::RefreshRejected);
            }
            _ => {}
        }
        match self.authenticator.refresh().await {
            Ok(fresh) => {
                if let Err(e) = self.credentials.replace(fresh) {
                    warn!("Renewed credential could not be persisted: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                self.end_session(sent_with);
                Err(e)
            }
        }
    }

    /// Clears the credential and sends the user to the login entry point.
    /// Does not redirect again when a concurrent request already ended the
    /// session this request was sent with.
    fn end_session(&self, sent_with: Option<&Credential>) {
        let removed = self.credentials.clear().unwrap_or_else(|e| {
            warn!("Failed to clear persisted credential: {}", e);
            true
        });
        if removed || sent_with.is_none() {
            self.navigator.redirect_to_login();
        } else {
            debug!("Session already ended, skipping login redirect");
        }
    }

    fn reject(&self, tracker: &mut PhaseTracker, sent_with: Option<&Credential>) -> AppError {
        tracker.advance(RequestPhase::Failed);
        debug!("{}: terminal unauthenticated, ending session", tracker.label);
        self.end_session(sent_with);
        AppError::Unauthenticated
    }

    async fn settle(response: Response) -> Result<ApiResponse, AppError> {
        let status = response.status();
        let body = response.text().await?;
        debug!("Response Status: {}", status);

        if status.is_success() {
            return Ok(ApiResponse { status, body });
        }
        match status {
            StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN => Err(AppError::RejectedByPolicy {
                status,
                detail: Self::extract_detail(status, &body),
            }),
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthenticated),
            _ => {
                debug!("API request failed. Status: {}, Body: {}", status, body);
                Err(AppError::Unexpected { status, body })
            }
        }
    }

    fn extract_detail(status: StatusCode, body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(detail),
            }) => detail,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) if !body.trim().is_empty() => body.trim().to_string(),
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request rejected")
                .to_string(),
        }
    }
}

#[async_trait]
impl FeedHttpClient for SessionTransport {
    #[instrument(skip(self, descriptor), fields(request = %descriptor))]
    async fn send(&self, mut descriptor: RequestDescriptor) -> Result<ApiResponse, AppError> {
        let mut tracker = PhaseTracker::new(&descriptor);
        let sent_with = self.credentials.current();
        tracker.advance(RequestPhase::Sent);
        let mut response =
            tracker.on_error(self.dispatch(&descriptor, sent_with.as_ref()).await)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if descriptor.retried() {
                return Err(self.reject(&mut tracker, sent_with.as_ref()));
            }
            tracker.advance(RequestPhase::RenewalPending);
            if let Err(e) = self.renew(sent_with.as_ref()).await {
                // the session was ended inside renew
                debug!("Session renewal failed: {}", e);
                tracker.advance(RequestPhase::Failed);
                return Err(AppError::Unauthenticated);
            }
            descriptor.mark_retried();
            tracker.advance(RequestPhase::Resent);
            let renewed = self.credentials.current();
            response = tracker.on_error(self.dispatch(&descriptor, renewed.as_ref()).await)?;
            if response.status() == StatusCode::UNAUTHORIZED {
                // the descriptor is spent, no second renewal
                return Err(self.reject(&mut tracker, sent_with.as_ref()));
            }
        }

        let result = Self::settle(response).await;
        tracker.advance(if result.is_ok() {
            RequestPhase::Succeeded
        } else {
            RequestPhase::Failed
        });
        result
    }
}
