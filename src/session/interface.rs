use crate::error::AuthError;
use crate::session::credential::Credential;
use serde::Deserialize;

/// Body returned by the login and session-refresh endpoints.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(alias = "credential")]
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Obtains credentials from the auth endpoints.
///
/// `login` persists the credential it obtains. `refresh` only returns the new
/// credential; storing it is up to the caller, which is the session transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<Credential, AuthError>;
    async fn refresh(&self) -> Result<Credential, AuthError>;
    async fn logout(&self) -> Result<(), AuthError>;
}
