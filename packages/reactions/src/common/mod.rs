// Common types and utilities shared across the application

pub mod identity;
pub mod moderation;

pub use identity::{profile_redirect_path, Identity};
pub use moderation::{ModerationConfig, ModerationFilter, ModerationVerdict};
