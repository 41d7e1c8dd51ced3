/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 14/10/26
 ******************************************************************************/

//! The bearer credential and its single process-wide accessor.

use crate::constants::CREDENTIAL_STORAGE_KEY;
use crate::storage::local::{KeyValueStorage, StorageError};
use reqwest::header::{HeaderValue, InvalidHeaderValue};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Opaque bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value, flagged sensitive so it stays out of logs.
    pub fn bearer_header(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Owner of the one credential the client holds.
///
/// Loaded once from storage at startup, read by the transport on every send,
/// replaced on login or renewal, and cleared on logout or terminal auth
/// failure. Memory is authoritative; storage mirrors it for the next start.
pub struct CredentialStore {
    storage: Arc<dyn KeyValueStorage>,
    current: RwLock<Option<Credential>>,
}

impl CredentialStore {
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let current = match storage.get(CREDENTIAL_STORAGE_KEY) {
            Ok(Some(token)) if !token.trim().is_empty() => {
                debug!("Restored persisted credential");
                Some(Credential::new(token))
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to read persisted credential: {}", e);
                None
            }
        };
        Self {
            storage,
            current: RwLock::new(current),
        }
    }

    pub fn current(&self) -> Option<Credential> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Installs `credential`. The in-memory value is updated even when
    /// persisting it fails.
    pub fn replace(&self, credential: Credential) -> Result<(), StorageError> {
        let token = credential.as_str().to_string();
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credential);
        self.storage.set(CREDENTIAL_STORAGE_KEY, &token)
    }

    /// Forgets the credential. Returns whether one was held in memory; the
    /// in-memory value is gone even when removing it from storage fails.
    pub fn clear(&self) -> Result<bool, StorageError> {
        let previous = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        self.storage.remove(CREDENTIAL_STORAGE_KEY)?;
        Ok(previous.is_some())
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
