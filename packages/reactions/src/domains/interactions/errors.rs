use std::borrow::Cow;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::kernel::{ConnectError, PublishError, SessionStatus};

/// Errors returned by the interaction gateway.
///
/// None of these poison the gateway: after any of them the same gateway can
/// take the next user action.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("No identity resolved for this session")]
    IdentityMissing,

    #[error("Channel session is {0}, not ready")]
    SessionNotReady(SessionStatus),

    #[error("Comment rejected by moderation")]
    ModerationRejected,

    #[error("Comment rate limited for another {0:?}")]
    RateLimited(Duration),

    #[error("Comment exceeds {max} characters")]
    CommentTooLong { max: usize },

    #[error("Failed to open channel session: {0}")]
    ConnectFailed(#[from] ConnectError),

    #[error("Publish failed: {0}")]
    PublishFailed(#[source] anyhow::Error),
}

/// How the UI should treat an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Session cannot continue; redirect the user
    Fatal,
    /// User edits the input or waits
    Recoverable,
    /// Same action may be retried (after re-opening, for session errors)
    Retryable,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Fatal => write!(f, "fatal"),
            ErrorCategory::Recoverable => write!(f, "recoverable"),
            ErrorCategory::Retryable => write!(f, "retryable"),
        }
    }
}

impl GatewayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::IdentityMissing => ErrorCategory::Fatal,
            GatewayError::ModerationRejected
            | GatewayError::RateLimited(_)
            | GatewayError::CommentTooLong { .. } => ErrorCategory::Recoverable,
            GatewayError::SessionNotReady(_)
            | GatewayError::ConnectFailed(_)
            | GatewayError::PublishFailed(_) => ErrorCategory::Retryable,
        }
    }

    /// Text to show the user. Never includes transport internals.
    pub fn user_message(&self) -> Cow<'static, str> {
        match self {
            GatewayError::IdentityMissing => "Please set up your profile first.".into(),
            GatewayError::ModerationRejected => "Your comment cannot contain profanity.".into(),
            GatewayError::RateLimited(remaining) => {
                format!("Please wait {} seconds...", whole_seconds(*remaining)).into()
            }
            GatewayError::CommentTooLong { max } => {
                format!("Comments are limited to {} characters.", max).into()
            }
            GatewayError::SessionNotReady(_) | GatewayError::ConnectFailed(_) => {
                "Not connected to the presentation. Please reload and try again.".into()
            }
            GatewayError::PublishFailed(_) => "Could not send. Please try again.".into(),
        }
    }
}

impl From<PublishError> for GatewayError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::NotReady { status } => GatewayError::SessionNotReady(status),
            PublishError::Transport(cause) => GatewayError::PublishFailed(cause),
        }
    }
}

// Round up: 9.2s left still reads "10 seconds"
fn whole_seconds(remaining: Duration) -> u64 {
    let secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
