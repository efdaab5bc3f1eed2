//! Audience interactions: reactions and comments published to a presenter's channel.

pub mod codec;
pub mod errors;
pub mod gateway;
pub mod models;

pub use errors::{ErrorCategory, GatewayError};
pub use gateway::{GatewaySettings, InteractionGateway};
pub use models::{CommentMessage, InteractionMessage, Reaction, ReactionMessage, UnknownReaction};
