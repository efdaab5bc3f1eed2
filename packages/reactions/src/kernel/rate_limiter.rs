//! Per-identity comment cooldown.
//!
//! An accepted comment blocks its author for a fixed window; attempts inside
//! the window are denied with the remaining wait and change nothing. State is
//! created lazily on an identity's first attempt and checked against
//! `tokio::time::Instant`, so wall-clock adjustments never shorten or extend
//! a window (and paused-clock tests can drive it).
//!
//! Reactions never pass through here.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::common::Identity;

/// Minimum interval between accepted comments from one identity.
pub const DEFAULT_COMMENT_COOLDOWN: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { remaining: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

#[derive(Debug, Default)]
struct RateLimitState {
    blocked_until: Option<Instant>,
}

/// Cooldown gate keyed by username.
///
/// Safe to share between sessions. Each identity's state lives in its own
/// `DashMap` entry; the entry guard is held for the whole check-and-set, so
/// same-identity attempts serialize while other identities proceed in
/// parallel.
#[derive(Debug)]
pub struct CommentRateLimiter {
    cooldown: Duration,
    states: DashMap<String, RateLimitState>,
}

impl CommentRateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            states: DashMap::new(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Try to take the identity's comment slot.
    ///
    /// On `Allowed` the identity is blocked until `now + cooldown`.
    /// On `Denied` nothing changes.
    pub fn try_acquire(&self, identity: &Identity) -> RateDecision {
        let now = Instant::now();
        let mut state = self
            .states
            .entry(identity.username().to_string())
            .or_default();

        if let Some(blocked_until) = state.blocked_until {
            if blocked_until > now {
                return RateDecision::Denied {
                    remaining: blocked_until - now,
                };
            }
            // Window elapsed
            state.blocked_until = None;
        }

        state.blocked_until = Some(now + self.cooldown);
        RateDecision::Allowed
    }

    /// Remaining wait for `identity`, or `None` if it may comment now.
    ///
    /// Never creates state for unseen identities. State whose window has
    /// elapsed is dropped here, so a shared limiter only tracks identities
    /// that are still cooling down.
    pub fn remaining(&self, identity: &Identity) -> Option<Duration> {
        let now = Instant::now();
        let blocked_until = self
            .states
            .get(identity.username())
            .and_then(|state| state.blocked_until);

        match blocked_until {
            Some(until) if until > now => Some(until - now),
            Some(_) => {
                // Re-checked under the shard lock: a concurrent acquire keeps its entry
                self.states.remove_if(identity.username(), |_, state| {
                    state.blocked_until.map_or(true, |until| until <= now)
                });
                None
            }
            None => None,
        }
    }

    /// Drop identities whose window has elapsed (housekeeping).
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.states
            .retain(|_, state| state.blocked_until.is_some_and(|until| until > now));
    }

    /// Number of identities with tracked state.
    pub fn tracked_identities(&self) -> usize {
        self.states.len()
    }
}

impl Default for CommentRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_COMMENT_COOLDOWN)
    }
}
