//! Gateway dependencies (using traits for testability)
//!
//! This module provides the dependency container every interaction gateway is
//! built from. The moderation filter and rate limiter are shared by all
//! sessions in the process; collaborators are trait objects so tests can
//! swap them out.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::common::moderation::ModerationFilter;
use crate::common::Identity;
use crate::config::Config;
use crate::domains::interactions::GatewaySettings;
use crate::kernel::nats::NatsConnector;
use crate::kernel::rate_limiter::CommentRateLimiter;
use crate::kernel::{
    BaseChannelConnector, BaseCredentialProvider, BaseIdentityProvider, Credential,
};

// =============================================================================
// Static Collaborators
// =============================================================================

/// Identity resolved once, up front (e.g. from a CLI flag or request header)
pub struct StaticIdentityProvider(pub Option<Identity>);

impl BaseIdentityProvider for StaticIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.0.clone()
    }
}

/// Hands out the same credential for every session
pub struct StaticCredentialProvider(pub Credential);

impl StaticCredentialProvider {
    /// Token credential when one is configured, anonymous otherwise
    pub fn from_token(token: Option<String>) -> Self {
        match token {
            Some(token) => Self(Credential::Token(token)),
            None => Self(Credential::Anonymous),
        }
    }
}

#[async_trait]
impl BaseCredentialProvider for StaticCredentialProvider {
    async fn acquire_credential(&self) -> Result<Credential> {
        Ok(self.0.clone())
    }
}

// =============================================================================
// GatewayDeps
// =============================================================================

/// Everything an [`InteractionGateway`](crate::domains::interactions::InteractionGateway) needs
#[derive(Clone)]
pub struct GatewayDeps {
    pub identity: Arc<dyn BaseIdentityProvider>,
    pub credentials: Arc<dyn BaseCredentialProvider>,
    pub connector: Arc<dyn BaseChannelConnector>,
    /// Shared across sessions; read-only after construction
    pub moderation: Arc<ModerationFilter>,
    /// Shared across sessions; keyed by username
    pub rate_limiter: Arc<CommentRateLimiter>,
    pub settings: GatewaySettings,
}

impl GatewayDeps {
    pub fn new(
        identity: Arc<dyn BaseIdentityProvider>,
        credentials: Arc<dyn BaseCredentialProvider>,
        connector: Arc<dyn BaseChannelConnector>,
        moderation: Arc<ModerationFilter>,
        rate_limiter: Arc<CommentRateLimiter>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            identity,
            credentials,
            connector,
            moderation,
            rate_limiter,
            settings,
        }
    }

    /// Production wiring: NATS transport, configured deny-list and cooldown.
    pub fn from_config(config: &Config, identity: Arc<dyn BaseIdentityProvider>) -> Result<Self> {
        let moderation = ModerationFilter::new(&config.moderation_config())
            .context("Failed to compile moderation deny-list")?;

        Ok(Self::new(
            identity,
            Arc::new(StaticCredentialProvider::from_token(
                config.nats_auth_token.clone(),
            )),
            Arc::new(NatsConnector::new(config.nats_url.clone())),
            Arc::new(moderation),
            Arc::new(CommentRateLimiter::new(config.comment_cooldown)),
            config.gateway_settings(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_credential_from_optional_token() {
        let anonymous = StaticCredentialProvider::from_token(None);
        assert_eq!(
            anonymous.acquire_credential().await.unwrap(),
            Credential::Anonymous
        );

        let token = StaticCredentialProvider::from_token(Some("secret".to_string()));
        assert_eq!(
            token.acquire_credential().await.unwrap(),
            Credential::Token("secret".to_string())
        );
    }

    #[test]
    fn from_config_wires_cooldown_and_settings() {
        let config = Config::from_lookup(|key| match key {
            "REACTIONS_NAMESPACE" => Some("cache1".to_string()),
            "COMMENT_COOLDOWN_SECS" => Some("30".to_string()),
            "MAX_COMMENT_CHARS" => Some("140".to_string()),
            _ => None,
        })
        .unwrap();

        let deps = GatewayDeps::from_config(
            &config,
            Arc::new(StaticIdentityProvider(Identity::new("alice"))),
        )
        .unwrap();

        assert_eq!(deps.rate_limiter.cooldown(), std::time::Duration::from_secs(30));
        assert_eq!(deps.settings.max_comment_chars, 140);
        assert!(!deps.moderation.is_empty());
        assert_eq!(
            deps.identity.current_identity().map(|i| i.username().to_string()),
            Some("alice".to_string())
        );
    }
}
