//! Error types for flood control.

use std::time::Duration;

use thiserror::Error;

/// Failure of a moderation call against the messaging platform.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The bot lacks the rights to restrict members in this chat.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Network or platform failure unrelated to permissions.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not complete within the enforcement timeout.
    #[error("gateway call timed out after {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

/// Errors surfaced by the flood control core.
#[derive(Debug, Error)]
pub enum FloodError {
    /// Duration spec does not match `<positive-integer><m|h|d|w>`.
    #[error("invalid duration '{0}', expected something like 4m, 3h, 6d or 5w")]
    InvalidDuration(String),

    /// Threshold is positive but below the meaningful minimum.
    #[error("invalid threshold {0}: use 0 to disable or a number greater than 2")]
    InvalidThreshold(u32),

    /// Malformed or missing command argument.
    #[error("{0}")]
    InvalidArgument(String),

    /// Moderation call failed and was not handled by auto-disable.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Settings storage or admin lookup failed.
    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl FloodError {
    /// Whether the error was caused by user input and should be shown to the issuer.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDuration(_) | Self::InvalidThreshold(_) | Self::InvalidArgument(_)
        )
    }
}

pub type FloodResult<T> = Result<T, FloodError>;
