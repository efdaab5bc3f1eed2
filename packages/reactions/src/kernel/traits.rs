// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - the collaborators the gateway talks
// to. Moderation, rate limiting and message construction stay in domain code.
//
// Naming convention: Base* for trait names (e.g., BaseCredentialProvider)

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::common::Identity;
use crate::kernel::nats::NatsPublisher;

// =============================================================================
// Identity Provider Trait
// =============================================================================

pub trait BaseIdentityProvider: Send + Sync {
    /// The identity resolved for the current session, if any.
    ///
    /// `None` means the user must go through the profile flow first
    /// (see [`profile_redirect_path`](crate::common::profile_redirect_path)).
    fn current_identity(&self) -> Option<Identity>;
}

// =============================================================================
// Credential Provider Trait
// =============================================================================

/// Credential handed to the transport when a channel session opens
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Anonymous,
    Token(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Anonymous => write!(f, "Anonymous"),
            Credential::Token(_) => write!(f, "Token(<redacted>)"),
        }
    }
}

#[async_trait]
pub trait BaseCredentialProvider: Send + Sync {
    /// Acquire a credential for opening one channel session
    async fn acquire_credential(&self) -> Result<Credential>;
}

// =============================================================================
// Channel Connector Trait (Transport)
// =============================================================================

#[async_trait]
pub trait BaseChannelConnector: Send + Sync {
    /// Open a publish-capable connection to the broadcast transport
    async fn connect(&self, credential: &Credential) -> Result<Arc<dyn NatsPublisher>>;
}
