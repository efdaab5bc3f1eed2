//! Publish-only connection to one broadcast channel.
//!
//! Lifecycle:
//!
//! ```text
//! Uninitialized --connect ok--> Ready --close--> Closed
//! ```
//!
//! A failed connect leaves the session `Uninitialized`; the caller retries
//! the connect, not the publish. Publishing outside `Ready` fails without
//! touching the transport.

use bytes::Bytes;
use std::fmt;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::nats::NatsPublisher;
use super::traits::{BaseChannelConnector, Credential};

// =============================================================================
// Channel
// =============================================================================

/// A named broadcast topic: `(namespace, name)`.
///
/// The namespace is a deployment constant, the name identifies one
/// presentation's interaction stream. Maps onto the NATS subject
/// `{namespace}.{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    namespace: String,
    name: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Channel namespace must not be empty")]
    EmptyNamespace,

    #[error("Channel name must not be empty")]
    EmptyName,

    #[error("Invalid character in channel {part}: {value:?}")]
    InvalidCharacter { part: &'static str, value: String },
}

impl Channel {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self, ChannelError> {
        let namespace = namespace.into();
        let name = name.into();

        if namespace.is_empty() {
            return Err(ChannelError::EmptyNamespace);
        }
        if name.is_empty() {
            return Err(ChannelError::EmptyName);
        }
        // Namespaces may be hierarchical ("prod.cache1"); names are a single token
        if !is_subject_safe(&namespace, true) {
            return Err(ChannelError::InvalidCharacter {
                part: "namespace",
                value: namespace,
            });
        }
        if !is_subject_safe(&name, false) {
            return Err(ChannelError::InvalidCharacter {
                part: "name",
                value: name,
            });
        }

        Ok(Self { namespace, name })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subject(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

fn is_subject_safe(value: &str, allow_dots: bool) -> bool {
    if allow_dots && value.split('.').any(str::is_empty) {
        return false;
    }
    value
        .chars()
        .all(|c| !c.is_whitespace() && c != '*' && c != '>' && (allow_dots || c != '.'))
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Uninitialized,
    Ready,
    Closed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Uninitialized => write!(f, "uninitialized"),
            SessionStatus::Ready => write!(f, "ready"),
            SessionStatus::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Channel session is already open")]
    AlreadyOpen,

    #[error("Channel session has been closed")]
    Closed,

    #[error("Failed to acquire channel credential: {0}")]
    Credential(#[source] anyhow::Error),

    #[error("Failed to connect to broadcast transport: {0}")]
    Transport(#[source] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Channel session is {status}, not ready")]
    NotReady { status: SessionStatus },

    #[error("Transport rejected publish: {0}")]
    Transport(#[source] anyhow::Error),
}

enum SessionState {
    Uninitialized,
    Ready(Arc<dyn NatsPublisher>),
    Closed,
}

impl SessionState {
    fn status(&self) -> SessionStatus {
        match self {
            SessionState::Uninitialized => SessionStatus::Uninitialized,
            SessionState::Ready(_) => SessionStatus::Ready,
            SessionState::Closed => SessionStatus::Closed,
        }
    }
}

/// Publish side of one channel, bound to it for its whole lifetime.
///
/// `publish` may be called concurrently. Each call forwards straight to the
/// transport connection, which keeps a single caller's successive publishes
/// in order.
pub struct ChannelSession {
    channel: Channel,
    subject: String,
    state: RwLock<SessionState>,
}

impl ChannelSession {
    /// A session in the `Uninitialized` state.
    pub fn new(channel: Channel) -> Self {
        let subject = channel.subject();
        Self {
            channel,
            subject,
            state: RwLock::new(SessionState::Uninitialized),
        }
    }

    /// Create a session and connect it in one step.
    pub async fn open(
        channel: Channel,
        credential: &Credential,
        connector: &dyn BaseChannelConnector,
    ) -> Result<Self, ConnectError> {
        let session = Self::new(channel);
        session.connect(credential, connector).await?;
        Ok(session)
    }

    /// Move an `Uninitialized` session to `Ready`.
    pub async fn connect(
        &self,
        credential: &Credential,
        connector: &dyn BaseChannelConnector,
    ) -> Result<(), ConnectError> {
        match self.status() {
            SessionStatus::Uninitialized => {}
            SessionStatus::Ready => return Err(ConnectError::AlreadyOpen),
            SessionStatus::Closed => return Err(ConnectError::Closed),
        }

        let publisher = match connector.connect(credential).await {
            Ok(publisher) => publisher,
            Err(e) => {
                warn!(channel = %self.channel, error = %e, "Channel session connect failed");
                return Err(ConnectError::Transport(e));
            }
        };

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        // Another connect or a close may have won while we were connecting
        match *state {
            SessionState::Uninitialized => {
                *state = SessionState::Ready(publisher);
                info!(channel = %self.channel, "Channel session ready");
                Ok(())
            }
            SessionState::Ready(_) => Err(ConnectError::AlreadyOpen),
            SessionState::Closed => Err(ConnectError::Closed),
        }
    }

    /// Send one message to the bound channel.
    pub async fn publish(&self, payload: Bytes) -> Result<(), PublishError> {
        let publisher = {
            let state = self.state.read().unwrap_or_else(|e| e.into_inner());
            match &*state {
                SessionState::Ready(publisher) => publisher.clone(),
                other => {
                    return Err(PublishError::NotReady {
                        status: other.status(),
                    })
                }
            }
        };

        // The publisher handle is owned here, so a concurrent close lets this
        // call finish or fail on its own.
        publisher
            .publish(self.subject.clone(), payload)
            .await
            .map_err(PublishError::Transport)?;

        debug!(subject = %self.subject, "Published to channel");
        Ok(())
    }

    /// Release the connection. Idempotent.
    pub async fn close(&self) {
        let previous = {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *state, SessionState::Closed)
        };

        if let SessionState::Ready(publisher) = previous {
            if let Err(e) = publisher.flush().await {
                warn!(channel = %self.channel, error = %e, "Flush on close failed");
            }
            info!(channel = %self.channel, "Channel session closed");
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .status()
    }

    pub fn is_ready(&self) -> bool {
        self.status() == SessionStatus::Ready
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}

impl fmt::Debug for ChannelSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSession")
            .field("channel", &self.channel)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::nats::TestNats;
    use crate::kernel::test_dependencies::TestConnector;

    fn channel() -> Channel {
        Channel::new("cache1", "session42").unwrap()
    }

    #[test]
    fn channel_maps_to_subject() {
        let channel = channel();
        assert_eq!(channel.subject(), "cache1.session42");
        assert_eq!(channel.to_string(), "cache1/session42");

        let nested = Channel::new("prod.cache1", "talk").unwrap();
        assert_eq!(nested.subject(), "prod.cache1.talk");
    }

    #[test]
    fn channel_rejects_unsafe_parts() {
        assert_eq!(Channel::new("", "s"), Err(ChannelError::EmptyNamespace));
        assert_eq!(Channel::new("ns", ""), Err(ChannelError::EmptyName));
        assert!(Channel::new("ns", "a.b").is_err());
        assert!(Channel::new("ns", "a b").is_err());
        assert!(Channel::new("ns", "*").is_err());
        assert!(Channel::new("ns..x", "s").is_err());
        assert!(Channel::new("ns>", "s").is_err());
    }

    #[tokio::test]
    async fn publish_before_connect_never_reaches_transport() {
        let connector = TestConnector::new();
        let session = ChannelSession::new(channel());

        let err = session.publish(Bytes::from_static(b"{}")).await.unwrap_err();

        assert!(matches!(
            err,
            PublishError::NotReady {
                status: SessionStatus::Uninitialized
            }
        ));
        assert_eq!(connector.nats().publish_attempts(), 0);
    }

    #[tokio::test]
    async fn open_publish_close_lifecycle() {
        let connector = TestConnector::new();
        let session = ChannelSession::open(channel(), &Credential::Anonymous, &connector)
            .await
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Ready);

        session.publish(Bytes::from_static(b"one")).await.unwrap();
        assert_eq!(connector.nats().messages_for_subject("cache1.session42").len(), 1);

        session.close().await;
        assert_eq!(session.status(), SessionStatus::Closed);
        assert_eq!(connector.nats().flush_count(), 1);

        let err = session.publish(Bytes::from_static(b"two")).await.unwrap_err();
        assert!(matches!(
            err,
            PublishError::NotReady {
                status: SessionStatus::Closed
            }
        ));
        assert_eq!(connector.nats().publish_attempts(), 1);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let connector = TestConnector::new();
        let session = ChannelSession::open(channel(), &Credential::Anonymous, &connector)
            .await
            .unwrap();

        session.close().await;
        session.close().await;

        assert_eq!(session.status(), SessionStatus::Closed);
        assert_eq!(connector.nats().flush_count(), 1);
    }

    #[tokio::test]
    async fn failed_connect_leaves_session_uninitialized_and_retryable() {
        let connector = TestConnector::new();
        connector.refuse_connections(true);
        let session = ChannelSession::new(channel());

        let err = session
            .connect(&Credential::Anonymous, &connector)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectError::Transport(_)));
        assert_eq!(session.status(), SessionStatus::Uninitialized);

        connector.refuse_connections(false);
        session
            .connect(&Credential::Anonymous, &connector)
            .await
            .unwrap();
        assert!(session.is_ready());
        assert_eq!(connector.connect_calls(), 2);
    }

    #[tokio::test]
    async fn connect_after_ready_or_closed_is_rejected() {
        let connector = TestConnector::new();
        let session = ChannelSession::open(channel(), &Credential::Anonymous, &connector)
            .await
            .unwrap();

        let err = session
            .connect(&Credential::Anonymous, &connector)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectError::AlreadyOpen));

        session.close().await;
        let err = session
            .connect(&Credential::Anonymous, &connector)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectError::Closed));
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced() {
        let connector = TestConnector::new();
        let session = ChannelSession::open(channel(), &Credential::Anonymous, &connector)
            .await
            .unwrap();
        connector.nats().fail_publishes(true);

        let err = session.publish(Bytes::from_static(b"x")).await.unwrap_err();

        assert!(matches!(err, PublishError::Transport(_)));
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn in_flight_publish_completes_after_close() {
        let nats = std::sync::Arc::new(TestNats::new());
        let connector = TestConnector::with_nats(nats.clone());
        let session = std::sync::Arc::new(
            ChannelSession::open(channel(), &Credential::Anonymous, &connector)
                .await
                .unwrap(),
        );

        nats.hold();
        let in_flight = {
            let session = session.clone();
            tokio::spawn(async move { session.publish(Bytes::from_static(b"late")).await })
        };
        while nats.publish_attempts() == 0 {
            tokio::task::yield_now().await;
        }

        session.close().await;
        nats.release();

        in_flight.await.unwrap().unwrap();
        assert_eq!(nats.publish_count(), 1);
        assert_eq!(session.status(), SessionStatus::Closed);
    }

    #[tokio::test]
    async fn single_caller_publishes_stay_in_order() {
        let connector = TestConnector::new();
        let session = ChannelSession::open(channel(), &Credential::Anonymous, &connector)
            .await
            .unwrap();

        for i in 0..10 {
            session.publish(Bytes::from(i.to_string())).await.unwrap();
        }

        let payloads: Vec<String> = connector
            .nats()
            .published_messages()
            .iter()
            .map(|m| String::from_utf8(m.payload.to_vec()).unwrap())
            .collect();
        let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(payloads, expected);
    }
}
