use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::common::moderation::ModerationConfig;
use crate::domains::interactions::GatewaySettings;
use crate::kernel::rate_limiter::DEFAULT_COMMENT_COOLDOWN;

/// Default bound on comment length, in characters after trimming.
pub const DEFAULT_MAX_COMMENT_CHARS: usize = 500;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub nats_url: String,
    /// Deployment-wide channel namespace (e.g. "cache1")
    pub channel_namespace: String,
    pub nats_auth_token: Option<String>,
    pub comment_cooldown: Duration,
    pub max_comment_chars: usize,
    pub moderation_extra_words: Vec<String>,
    pub moderation_allowed_words: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let comment_cooldown = match lookup("COMMENT_COOLDOWN_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .context("COMMENT_COOLDOWN_SECS must be a whole number of seconds")?,
            ),
            None => DEFAULT_COMMENT_COOLDOWN,
        };

        let max_comment_chars = match lookup("MAX_COMMENT_CHARS") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("MAX_COMMENT_CHARS must be a valid number")?,
            None => DEFAULT_MAX_COMMENT_CHARS,
        };
        if max_comment_chars == 0 {
            anyhow::bail!("MAX_COMMENT_CHARS must be greater than zero");
        }

        Ok(Self {
            nats_url: lookup("NATS_URL").unwrap_or_else(|| "nats://localhost:4222".to_string()),
            channel_namespace: lookup("REACTIONS_NAMESPACE")
                .filter(|ns| !ns.trim().is_empty())
                .context("REACTIONS_NAMESPACE must be set")?,
            nats_auth_token: lookup("NATS_AUTH_TOKEN").filter(|t| !t.is_empty()),
            comment_cooldown,
            max_comment_chars,
            moderation_extra_words: split_word_list(lookup("MODERATION_EXTRA_WORDS")),
            moderation_allowed_words: split_word_list(lookup("MODERATION_ALLOWED_WORDS")),
        })
    }

    /// Gateway tuning derived from this configuration.
    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            max_comment_chars: self.max_comment_chars,
        }
    }

    /// Deny-list configuration: built-in words plus configured additions/removals.
    pub fn moderation_config(&self) -> ModerationConfig {
        ModerationConfig::default()
            .with_extra_words(self.moderation_extra_words.iter().cloned())
            .with_allowed_words(self.moderation_allowed_words.iter().cloned())
    }
}

fn split_word_list(raw: Option<String>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
