//! Unified error handling for the loyalty client.

use honor_loyalty_core::DraftError;
use thiserror::Error;

use crate::session::StoreError;

/// Errors that can occur when talking to the loyalty backend.
///
/// Every variant is recoverable at the point of the failed action: the
/// operation is aborted and prior state is left intact. The exception is
/// [`ApiError::SessionExpired`], which has already cleared the session by the
/// time the caller sees it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Login rejected (wrong username or password).
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The backend rejected the bearer token. The session has been cleared.
    #[error("Session expired - please log in again")]
    SessionExpired,

    /// A protected call was attempted without a logged-in session.
    #[error("Not logged in")]
    NotAuthenticated,

    /// Input rejected, locally or by the backend.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backend refused the change because current state does not allow
    /// it (insufficient points, out of stock).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The logged-in staff member lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// Backend unreachable, timed out, or sent an unreadable body.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The login response carried a token whose claims could not be read.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Persisting or clearing the session failed.
    #[error("Session storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<DraftError> for ApiError {
    fn from(err: DraftError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl ApiError {
    /// Message suitable for showing to staff: the backend's own detail when
    /// one was provided, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::InvalidCredentials(msg)
            | Self::Validation(msg)
            | Self::Conflict(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Server { message: msg, .. }
                if !msg.is_empty() =>
            {
                msg.clone()
            }
            Self::SessionExpired | Self::NotAuthenticated => self.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Whether this error ended the staff session.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
