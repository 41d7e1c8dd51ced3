/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/
use crate::application::models::user::{User, UserCreate};
use crate::config::Config;
use crate::constants::{LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH, REGISTER_PATH};
use crate::error::AuthError;
use crate::session::credential::{Credential, CredentialStore};
use crate::session::interface::{Authenticator, TokenResponse};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Talks to the `/auth` endpoints.
///
/// Shares its `reqwest::Client` with the session transport so the refresh
/// cookie set at login is presented to the refresh endpoint.
pub struct FeedAuth {
    client: Client,
    config: Arc<Config>,
    credentials: Arc<CredentialStore>,
}

impl FeedAuth {
    pub fn new(client: Client, config: Arc<Config>, credentials: Arc<CredentialStore>) -> Self {
        Self {
            client,
            config,
            credentials,
        }
    }

    /// Creates an account. Does not log in.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn register(&self, user: &UserCreate) -> Result<User, AuthError> {
        let response = self
            .client
            .post(self.config.rest_api.url(REGISTER_PATH))
            .json(user)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Self::parse(response).await,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                debug!("Registration rejected: {}", response.text().await.unwrap_or_default());
                Err(AuthError::BadCredentials)
            }
            status => Err(AuthError::Unexpected(status)),
        }
    }

    /// Logs in with the credentials from the configuration.
    pub async fn login_with_config(&self) -> Result<Credential, AuthError> {
        let username = self.config.credentials.username.clone();
        let password = self.config.credentials.password.clone();
        self.login(&username, &password).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Authenticator for FeedAuth {
    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        debug!("Authenticating user: {}", username);
        let response = self
            .client
            .post(self.config.rest_api.url(LOGIN_PATH))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let token: TokenResponse = Self::parse(response).await?;
                let credential = Credential::new(token.access_token);
                if let Err(e) = self.credentials.replace(credential.clone()) {
                    warn!("Credential could not be persisted: {}", e);
                }
                info!("Authentication successful");
                Ok(credential)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(AuthError::BadCredentials),
            status => Err(AuthError::Unexpected(status)),
        }
    }

    #[instrument(skip(self))]
    async fn refresh(&self) -> Result<Credential, AuthError> {
        let response = self
            .client
            .post(self.config.rest_api.url(REFRESH_PATH))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let token: TokenResponse = Self::parse(response).await?;
                debug!("Session refreshed");
                Ok(Credential::new(token.access_token))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::RefreshRejected),
            status => Err(AuthError::Unexpected(status)),
        }
    }

    /// Tells the server to drop the refresh cookie, then forgets the
    /// credential locally whatever the server said.
    #[instrument(skip(self))]
    async fn logout(&self) -> Result<(), AuthError> {
        let mut request = self.client.post(self.config.rest_api.url(LOGOUT_PATH));
        if let Some(credential) = self.credentials.current() {
            match credential.bearer_header() {
                Ok(value) => request = request.header(AUTHORIZATION, value),
                Err(e) => warn!("Stored credential is not a valid header: {}", e),
            }
        }
        match request.send().await {
            Ok(response) if !response.status().is_success() => {
                warn!("Logout answered {}", response.status());
            }
            Ok(_) => {}
            Err(e) => warn!("Logout request failed: {}", e),
        }
        self.credentials.clear()?;
        info!("Logged out");
        Ok(())
    }
}
