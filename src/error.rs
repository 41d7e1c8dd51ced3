/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 14/10/26
 ******************************************************************************/
use crate::storage::local::StorageError;
use crate::transport::model::OutcomeClass;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the authenticator (login, refresh, logout).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("bad credentials")]
    BadCredentials,
    #[error("session refresh rejected")]
    RefreshRejected,
    #[error("unexpected http status: {0}")]
    Unexpected(StatusCode),
}

/// Errors surfaced to callers of the session transport and the services.
///
/// Whatever happens inside the transport, callers only ever observe one of
/// three classes, see [`AppError::class`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("rejected by policy ({status}): {detail}")]
    RejectedByPolicy { status: StatusCode, detail: String },
    #[error("unexpected http status: {status}")]
    Unexpected { status: StatusCode, body: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl AppError {
    /// Failure class used for user messaging and logging policy.
    pub fn class(&self) -> OutcomeClass {
        match self {
            AppError::Unauthenticated => OutcomeClass::Unauthenticated,
            AppError::RejectedByPolicy { .. } => OutcomeClass::RejectedByPolicy,
            _ => OutcomeClass::TransientFailure,
        }
    }

    /// Whether the failure is expected and should stay out of the error log.
    pub fn is_expected(&self) -> bool {
        !matches!(self.class(), OutcomeClass::TransientFailure)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Network(e) => AppError::Network(e),
            AuthError::Json(e) => AppError::Json(e),
            AuthError::Storage(e) => AppError::Storage(e),
            AuthError::BadCredentials | AuthError::RefreshRejected => AppError::Unauthenticated,
            AuthError::Unexpected(status) => AppError::Unexpected {
                status,
                body: String::new(),
            },
        }
    }
}
