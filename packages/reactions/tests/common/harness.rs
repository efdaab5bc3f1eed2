//! Test harness for gateway integration tests.
//!
//! Every test gets a fresh gateway for `alice` on channel
//! `cache1/session42`, wired to an in-memory transport (`TestNats`) with
//! "badword" on the deny-list.

use anyhow::{Context, Result};
use reactions_core::domains::interactions::InteractionGateway;
use reactions_core::kernel::{
    Channel, CommentRateLimiter, TestConnector, TestDependencies, TestNats,
};
use std::sync::Arc;
use test_context::AsyncTestContext;

pub const SUBJECT: &str = "cache1.session42";

pub fn test_channel() -> Channel {
    Channel::new("cache1", "session42").expect("valid test channel")
}

/// Test harness that owns one started gateway and its test doubles.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     ctx.gateway.send_comment("hello").await.unwrap();
///     assert_eq!(ctx.nats().publish_count(), 1);
/// }
/// ```
pub struct TestHarness {
    pub gateway: InteractionGateway,
    pub connector: Arc<TestConnector>,
    pub rate_limiter: Arc<CommentRateLimiter>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
            .await
            .expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.gateway.close().await;
    }
}

impl TestHarness {
    /// Default harness: alice, "badword" denied, 10s cooldown.
    pub async fn new() -> Result<Self> {
        Self::with_deps(TestDependencies::new().deny_words(&["badword"])).await
    }

    /// Harness built from custom test dependencies.
    pub async fn with_deps(deps: TestDependencies) -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let connector = deps.connector.clone();
        let deps = deps.into_deps();
        let rate_limiter = deps.rate_limiter.clone();

        let gateway = InteractionGateway::start(&deps, test_channel())
            .await
            .context("Failed to start gateway")?;

        Ok(Self {
            gateway,
            connector,
            rate_limiter,
        })
    }

    pub fn nats(&self) -> &TestNats {
        self.connector.nats()
    }

    /// Decoded payloads published to the test channel, in order.
    pub fn published(&self) -> Vec<serde_json::Value> {
        self.nats()
            .messages_for_subject(SUBJECT)
            .iter()
            .map(|m| {
                self.nats()
                    .deserialize_message(m)
                    .expect("published payload is JSON")
            })
            .collect()
    }
}
