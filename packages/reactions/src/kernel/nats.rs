//! NATS client abstraction for production and testing.
//!
//! Provides a trait-based NATS implementation that allows swapping between
//! real NATS connections and test mocks. Channel sessions only ever publish;
//! subscribing is the presenter's side of the channel.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

use super::traits::{BaseChannelConnector, Credential};

/// A published message.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub subject: String,
    pub payload: Bytes,
}

/// Trait for NATS publish operations.
///
/// This allows swapping between real NATS and test mocks.
#[async_trait]
pub trait NatsPublisher: Send + Sync {
    /// Publish a message to a subject.
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()>;

    /// Push buffered messages out before the connection is released.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Real NATS client publisher.
pub struct NatsClientPublisher {
    client: async_nats::Client,
}

impl NatsClientPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NatsPublisher for NatsClientPublisher {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()> {
        self.client.publish(subject, payload).await?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.client.flush().await?;
        Ok(())
    }
}

/// Opens real NATS connections for channel sessions.
pub struct NatsConnector {
    url: String,
    client_name: String,
}

impl NatsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client_name: "reactions-gateway".to_string(),
        }
    }
}

#[async_trait]
impl BaseChannelConnector for NatsConnector {
    async fn connect(&self, credential: &Credential) -> Result<Arc<dyn NatsPublisher>> {
        let options = match credential {
            Credential::Token(token) => async_nats::ConnectOptions::with_token(token.clone()),
            Credential::Anonymous => async_nats::ConnectOptions::new(),
        };

        let client = options
            .name(self.client_name.clone())
            .connect(self.url.as_str())
            .await
            .with_context(|| format!("Failed to connect to NATS at {}", self.url))?;

        Ok(Arc::new(NatsClientPublisher::new(client)))
    }
}

/// Mock NATS client that tracks published messages for testing.
///
/// This allows tests to inspect what messages would have been published
/// to NATS without requiring a real connection. Publishes can be made to
/// fail, or held until released to simulate a slow network.
pub struct TestNats {
    /// Messages published to subjects.
    published: RwLock<Vec<PublishedMessage>>,
    /// Every publish call, including failed ones.
    attempts: AtomicUsize,
    fail_publishes: AtomicBool,
    flushes: AtomicUsize,
    /// `true` while publishes may proceed.
    gate: watch::Sender<bool>,
}

impl Default for TestNats {
    fn default() -> Self {
        Self {
            published: RwLock::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail_publishes: AtomicBool::new(false),
            flushes: AtomicUsize::new(0),
            gate: watch::Sender::new(true),
        }
    }
}

impl TestNats {
    /// Create a new test NATS client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a published message.
    pub fn record_publish(&self, subject: String, payload: Bytes) {
        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(PublishedMessage { subject, payload });
    }

    /// Make subsequent publishes fail (or succeed again).
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    /// Park subsequent publishes until [`TestNats::release`] is called.
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    /// Let held publishes continue.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Get all published messages.
    pub fn published_messages(&self) -> Vec<PublishedMessage> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Get published messages for a specific subject.
    pub fn messages_for_subject(&self, subject: &str) -> Vec<PublishedMessage> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|m| m.subject == subject)
            .cloned()
            .collect()
    }

    /// Check if any message was published to a subject.
    pub fn was_published_to(&self, subject: &str) -> bool {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|m| m.subject == subject)
    }

    /// Get the count of published messages.
    pub fn publish_count(&self) -> usize {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Number of publish calls that reached the transport, successful or not.
    pub fn publish_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Clear all recorded messages.
    pub fn clear(&self) {
        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.attempts.store(0, Ordering::SeqCst);
    }

    /// Deserialize a published message payload as JSON.
    pub fn deserialize_message<T: serde::de::DeserializeOwned>(
        &self,
        msg: &PublishedMessage,
    ) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&msg.payload)
    }
}

#[async_trait]
impl NatsPublisher for TestNats {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .context("test transport gate dropped")?;

        if self.fail_publishes.load(Ordering::SeqCst) {
            anyhow::bail!("simulated transport failure");
        }

        self.record_publish(subject, payload);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
