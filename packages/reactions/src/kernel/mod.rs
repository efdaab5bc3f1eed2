//! Kernel module - gateway infrastructure and dependencies.

pub mod channel_session;
pub mod deps;
pub mod nats;
pub mod rate_limiter;
pub mod test_dependencies;
pub mod traits;

pub use channel_session::{
    Channel, ChannelError, ChannelSession, ConnectError, PublishError, SessionStatus,
};
pub use deps::{GatewayDeps, StaticCredentialProvider, StaticIdentityProvider};
pub use nats::{NatsClientPublisher, NatsConnector, NatsPublisher, PublishedMessage, TestNats};
pub use rate_limiter::{CommentRateLimiter, RateDecision, DEFAULT_COMMENT_COOLDOWN};
pub use test_dependencies::{MockCredentialProvider, TestConnector, TestDependencies};
pub use traits::*;
