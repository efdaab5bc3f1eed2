// TestDependencies - mock implementations for testing
//
// Provides mock collaborators that can be assembled into GatewayDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::deps::{GatewayDeps, StaticIdentityProvider};
use super::nats::{NatsPublisher, TestNats};
use super::rate_limiter::{CommentRateLimiter, DEFAULT_COMMENT_COOLDOWN};
use super::{BaseChannelConnector, BaseCredentialProvider, Credential};
use crate::common::moderation::{ModerationConfig, ModerationFilter};
use crate::common::Identity;
use crate::config::DEFAULT_MAX_COMMENT_CHARS;
use crate::domains::interactions::GatewaySettings;

// =============================================================================
// Mock Connector
// =============================================================================

/// Connector that hands every session the same [`TestNats`]
pub struct TestConnector {
    nats: Arc<TestNats>,
    refuse: AtomicBool,
    connect_calls: AtomicUsize,
    credentials_seen: Mutex<Vec<Credential>>,
}

impl TestConnector {
    pub fn new() -> Self {
        Self::with_nats(Arc::new(TestNats::new()))
    }

    pub fn with_nats(nats: Arc<TestNats>) -> Self {
        Self {
            nats,
            refuse: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            credentials_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn nats(&self) -> &Arc<TestNats> {
        &self.nats
    }

    /// Make subsequent connects fail (or succeed again)
    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn credentials_seen(&self) -> Vec<Credential> {
        self.credentials_seen.lock().unwrap().clone()
    }
}

impl Default for TestConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseChannelConnector for TestConnector {
    async fn connect(&self, credential: &Credential) -> Result<Arc<dyn NatsPublisher>> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.credentials_seen
            .lock()
            .unwrap()
            .push(credential.clone());

        if self.refuse.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused by test connector");
        }

        Ok(self.nats.clone())
    }
}

// =============================================================================
// Mock Credential Provider
// =============================================================================

pub struct MockCredentialProvider {
    credential: Option<Credential>,
    calls: AtomicUsize,
}

impl MockCredentialProvider {
    pub fn token(token: &str) -> Self {
        Self {
            credential: Some(Credential::Token(token.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Provider whose acquisition always fails
    pub fn failing() -> Self {
        Self {
            credential: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BaseCredentialProvider for MockCredentialProvider {
    async fn acquire_credential(&self) -> Result<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.credential
            .clone()
            .ok_or_else(|| anyhow::anyhow!("token endpoint unavailable"))
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub struct TestDependencies {
    pub identity: Option<Identity>,
    pub connector: Arc<TestConnector>,
    pub credentials: Arc<MockCredentialProvider>,
    pub moderation: ModerationConfig,
    pub rate_limiter: Option<Arc<CommentRateLimiter>>,
    pub cooldown: Duration,
    pub settings: GatewaySettings,
}

impl TestDependencies {
    /// Identity "alice", empty deny-list, default cooldown
    pub fn new() -> Self {
        Self {
            identity: Identity::new("alice"),
            connector: Arc::new(TestConnector::new()),
            credentials: Arc::new(MockCredentialProvider::token("test-token")),
            moderation: ModerationConfig::empty(),
            rate_limiter: None,
            cooldown: DEFAULT_COMMENT_COOLDOWN,
            settings: GatewaySettings {
                max_comment_chars: DEFAULT_MAX_COMMENT_CHARS,
            },
        }
    }

    /// Set the resolved identity (`None` for an unresolved session)
    pub fn identity(mut self, username: Option<&str>) -> Self {
        self.identity = username.and_then(Identity::new);
        self
    }

    /// Add words to the deny-list
    pub fn deny_words(mut self, words: &[&str]) -> Self {
        self.moderation = self.moderation.with_extra_words(words.iter().copied());
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn max_comment_chars(mut self, max: usize) -> Self {
        self.settings.max_comment_chars = max;
        self
    }

    /// Share a limiter with other gateways (co-located sessions)
    pub fn shared_rate_limiter(mut self, limiter: Arc<CommentRateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Share a connector (and so a transport) with other gateways
    pub fn connector(mut self, connector: Arc<TestConnector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn credentials(mut self, credentials: MockCredentialProvider) -> Self {
        self.credentials = Arc::new(credentials);
        self
    }

    /// Convert into GatewayDeps for testing
    pub fn into_deps(self) -> GatewayDeps {
        let moderation = ModerationFilter::new(&self.moderation)
            .expect("test deny-list must compile");
        let rate_limiter = self
            .rate_limiter
            .unwrap_or_else(|| Arc::new(CommentRateLimiter::new(self.cooldown)));

        GatewayDeps::new(
            Arc::new(StaticIdentityProvider(self.identity)),
            self.credentials,
            self.connector,
            Arc::new(moderation),
            rate_limiter,
            self.settings,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
