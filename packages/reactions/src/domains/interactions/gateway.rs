use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::codec;
use super::errors::GatewayError;
use super::models::{InteractionMessage, Reaction};
use crate::common::moderation::{ModerationFilter, ModerationVerdict};
use crate::common::Identity;
use crate::kernel::{
    Channel, ChannelSession, CommentRateLimiter, ConnectError, GatewayDeps, RateDecision,
};

/// Per-deployment gateway tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Upper bound on comment length, in characters after trimming
    pub max_comment_chars: usize,
}

/// Turns one user's actions into messages on one channel.
///
/// Reactions go straight to the channel. Comments are trimmed, length-checked,
/// moderated and rate limited first. Nothing is retried: a failed publish is
/// returned to the caller, who decides whether the user tries again.
pub struct InteractionGateway {
    identity: Identity,
    session: ChannelSession,
    moderation: Arc<ModerationFilter>,
    rate_limiter: Arc<CommentRateLimiter>,
    settings: GatewaySettings,
    comment_ready: Arc<watch::Sender<bool>>,
    cooldown_timer: Mutex<Option<JoinHandle<()>>>,
}

impl InteractionGateway {
    /// Resolve the identity, acquire a credential and open the channel.
    ///
    /// Fails with `IdentityMissing` before touching the transport when no
    /// identity is available.
    pub async fn start(deps: &GatewayDeps, channel: Channel) -> Result<Self, GatewayError> {
        let identity = deps
            .identity
            .current_identity()
            .ok_or(GatewayError::IdentityMissing)?;

        let credential = deps
            .credentials
            .acquire_credential()
            .await
            .map_err(ConnectError::Credential)?;

        let session = ChannelSession::open(channel, &credential, deps.connector.as_ref()).await?;

        info!(
            username = %identity,
            channel = %session.channel(),
            "Interaction gateway started"
        );

        Ok(Self::new(
            identity,
            session,
            deps.moderation.clone(),
            deps.rate_limiter.clone(),
            deps.settings,
        ))
    }

    /// Assemble a gateway around an existing session (any status).
    pub fn new(
        identity: Identity,
        session: ChannelSession,
        moderation: Arc<ModerationFilter>,
        rate_limiter: Arc<CommentRateLimiter>,
        settings: GatewaySettings,
    ) -> Self {
        let ready = rate_limiter.remaining(&identity).is_none();
        Self {
            identity,
            session,
            moderation,
            rate_limiter,
            settings,
            comment_ready: Arc::new(watch::Sender::new(ready)),
            cooldown_timer: Mutex::new(None),
        }
    }

    /// Publish a reaction. Never moderated, never rate limited.
    pub async fn send_reaction(&self, reaction: Reaction) -> Result<(), GatewayError> {
        let message = InteractionMessage::reaction(&self.identity, reaction);
        self.publish(&message).await?;

        debug!(username = %self.identity, reaction = %reaction, "Reaction sent");
        Ok(())
    }

    /// Publish a comment.
    ///
    /// Blank input is a successful no-op. Otherwise the trimmed text must fit
    /// the length bound, pass moderation, and win the identity's rate-limit
    /// slot before it is published.
    pub async fn send_comment(&self, raw_text: &str) -> Result<(), GatewayError> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Ok(());
        }

        if text.chars().count() > self.settings.max_comment_chars {
            return Err(GatewayError::CommentTooLong {
                max: self.settings.max_comment_chars,
            });
        }

        if self.moderation.classify(text) == ModerationVerdict::Profane {
            warn!(username = %self.identity, "Comment rejected by moderation");
            return Err(GatewayError::ModerationRejected);
        }

        // Don't spend the cooldown on a session that cannot publish
        if !self.session.is_ready() {
            return Err(GatewayError::SessionNotReady(self.session.status()));
        }

        if let RateDecision::Denied { remaining } = self.rate_limiter.try_acquire(&self.identity) {
            warn!(
                username = %self.identity,
                remaining_ms = remaining.as_millis() as u64,
                "Comment rate limited"
            );
            return Err(GatewayError::RateLimited(remaining));
        }
        self.start_cooldown_timer();

        let message = InteractionMessage::comment(&self.identity, text);
        self.publish(&message).await?;

        debug!(username = %self.identity, chars = text.chars().count(), "Comment sent");
        Ok(())
    }

    /// `true` while this user may comment; flips to `false` for each cooldown.
    pub fn comment_availability(&self) -> watch::Receiver<bool> {
        self.comment_ready.subscribe()
    }

    /// Remaining cooldown for this user, if any.
    pub fn comment_cooldown_remaining(&self) -> Option<Duration> {
        self.rate_limiter.remaining(&self.identity)
    }

    /// Close the channel session and cancel the cooldown timer.
    pub async fn close(&self) {
        if let Some(timer) = self.take_cooldown_timer() {
            timer.abort();
        }
        self.session.close().await;
        info!(username = %self.identity, channel = %self.session.channel(), "Interaction gateway closed");
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn session(&self) -> &ChannelSession {
        &self.session
    }

    async fn publish(&self, message: &InteractionMessage) -> Result<(), GatewayError> {
        let payload =
            codec::encode(message).map_err(|e| GatewayError::PublishFailed(e.into()))?;

        self.session.publish(payload).await.map_err(|e| {
            warn!(
                username = %self.identity,
                kind = message.kind(),
                error = %e,
                "Publish failed"
            );
            GatewayError::from(e)
        })
    }

    // One timer per session: a new cooldown replaces the pending one.
    fn start_cooldown_timer(&self) {
        if let Some(previous) = self.take_cooldown_timer() {
            previous.abort();
        }
        self.comment_ready.send_replace(false);

        let cooldown = self.rate_limiter.cooldown();
        let ready = self.comment_ready.clone();
        let rate_limiter = self.rate_limiter.clone();
        let identity = self.identity.clone();

        let timer = tokio::spawn(async move {
            let mut wait = cooldown;
            // The limiter is the source of truth; another session of the same
            // identity may have taken the slot again while this one slept
            loop {
                tokio::time::sleep(wait).await;
                match rate_limiter.remaining(&identity) {
                    Some(remaining) => wait = remaining,
                    None => {
                        ready.send_replace(true);
                        break;
                    }
                }
            }
        });

        *self
            .cooldown_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(timer);
    }

    fn take_cooldown_timer(&self) -> Option<JoinHandle<()>> {
        self.cooldown_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

impl Drop for InteractionGateway {
    fn drop(&mut self) {
        if let Some(timer) = self.take_cooldown_timer() {
            timer.abort();
        }
    }
}
