//! Password reset.
//!
//! [`ResetCodeRegistry`] owns the one-time codes (one live code per email, lazily
//! expired). [`PasswordResetService`] runs the request/confirm flow on top of it,
//! the credential store and the email dispatcher.

pub mod clock;
pub mod registry;
pub mod service;
pub mod store;

use std::fmt;

use crate::error::AppError;

pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::{random_code, ResetCodeRegistry, DEFAULT_CODE_TTL_MINUTES};
pub use service::{PasswordResetService, ResetRequestOutcome};
pub use store::{InMemoryResetCodeStore, ResetCodeStore, ResetEntry};

/// Failures of the reset flow, as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetError {
    /// No account is registered for the email.
    AccountNotFound,
    /// The code is wrong, was never issued, was already used, or has expired.
    InvalidOrExpiredCode,
    /// Reading or writing a store failed.
    Persistence(String),
}

impl fmt::Display for ResetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResetError::AccountNotFound => write!(f, "account not found"),
            ResetError::InvalidOrExpiredCode => write!(f, "invalid or expired reset code"),
            ResetError::Persistence(msg) => write!(f, "persistence failure: {}", msg),
        }
    }
}

impl std::error::Error for ResetError {}

/// A store reporting the account missing (e.g. deleted mid-reset) is `AccountNotFound`;
/// anything else is a persistence failure.
impl From<AppError> for ResetError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::NotFound(_) => ResetError::AccountNotFound,
            other => ResetError::Persistence(other.to_string()),
        }
    }
}
