use crate::error::AppError;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One outbound API call.
///
/// The `retried` flag is set at most once, by the session transport, right
/// before the call is resent with a renewed credential. Nothing clears it.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    retried: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        debug_assert!(!self.retried, "request descriptor retried twice");
        self.retried = true;
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// A settled 2xx response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Deserializes the body. An empty body (e.g. `204 No Content`) reads as `null`.
    pub fn json<R: DeserializeOwned>(&self) -> Result<R, AppError> {
        let text = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        Ok(serde_json::from_str(text)?)
    }
}

/// How a call ended, as far as the UI is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeClass {
    Success,
    RejectedByPolicy,
    Unauthenticated,
    TransientFailure,
}

impl OutcomeClass {
    pub fn of<T>(result: &Result<T, AppError>) -> Self {
        match result {
            Ok(_) => OutcomeClass::Success,
            Err(e) => e.class(),
        }
    }
}

impl fmt::Display for OutcomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutcomeClass::Success => "success",
            OutcomeClass::RejectedByPolicy => "rejected_by_policy",
            OutcomeClass::Unauthenticated => "unauthenticated",
            OutcomeClass::TransientFailure => "transient_failure",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a single request inside the session transport.
///
/// `Unsent → Sent → {Succeeded | RenewalPending → Resent → {Succeeded | Failed} | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Unsent,
    Sent,
    RenewalPending,
    Resent,
    Succeeded,
    Failed,
}

impl RequestPhase {
    pub fn can_advance_to(self, next: RequestPhase) -> bool {
        use RequestPhase::*;
        matches!(
            (self, next),
            (Unsent, Sent)
                | (Sent, Succeeded)
                | (Sent, RenewalPending)
                | (Sent, Failed)
                | (RenewalPending, Resent)
                | (RenewalPending, Failed)
                | (Resent, Succeeded)
                | (Resent, Failed)
        )
    }
}
