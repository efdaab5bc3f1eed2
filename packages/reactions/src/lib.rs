// Live Reactions - interaction publishing gateway
//
// Turns audience actions (reaction presses, typed comments) into validated,
// moderated, rate-limited messages and publishes them onto a per-session
// broadcast channel that the presenter subscribes to.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
