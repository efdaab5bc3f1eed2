use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::common::Identity;

/// Fixed reaction vocabulary.
///
/// Serialized with the display name the audience sees on the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reaction {
    #[serde(rename = "Thumbs Up")]
    ThumbsUp,
    #[serde(rename = "Mindblown")]
    Mindblown,
    #[serde(rename = "Love It!")]
    LoveIt,
}

impl Reaction {
    pub const ALL: [Reaction; 3] = [Reaction::ThumbsUp, Reaction::Mindblown, Reaction::LoveIt];

    pub fn display_name(&self) -> &'static str {
        match self {
            Reaction::ThumbsUp => "Thumbs Up",
            Reaction::Mindblown => "Mindblown",
            Reaction::LoveIt => "Love It!",
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown reaction: {0:?}")]
pub struct UnknownReaction(pub String);

impl FromStr for Reaction {
    type Err = UnknownReaction;

    /// Accepts button names ("Love It!") and snake_case aliases ("love_it").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(reaction) = Reaction::ALL
            .into_iter()
            .find(|r| r.display_name().eq_ignore_ascii_case(trimmed))
        {
            return Ok(reaction);
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "thumbs_up" | "thumbsup" => Ok(Reaction::ThumbsUp),
            "mindblown" | "mind_blown" => Ok(Reaction::Mindblown),
            "love_it" | "loveit" => Ok(Reaction::LoveIt),
            _ => Err(UnknownReaction(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionMessage {
    username: String,
    reaction: Reaction,
}

impl ReactionMessage {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn reaction(&self) -> Reaction {
        self.reaction
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentMessage {
    username: String,
    text: String,
}

impl CommentMessage {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One message on an interaction channel.
///
/// Immutable once built; always carries the publishing identity's username.
/// Wire shape is tagged by `kind`:
///
/// ```json
/// {"kind":"reaction","username":"alice","reaction":"Thumbs Up"}
/// {"kind":"comment","username":"alice","text":"this is great"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionMessage {
    Reaction(ReactionMessage),
    Comment(CommentMessage),
}

impl InteractionMessage {
    pub fn reaction(identity: &Identity, reaction: Reaction) -> Self {
        InteractionMessage::Reaction(ReactionMessage {
            username: identity.username().to_string(),
            reaction,
        })
    }

    /// Build a comment. The gateway trims and validates `text` first.
    pub fn comment(identity: &Identity, text: impl Into<String>) -> Self {
        InteractionMessage::Comment(CommentMessage {
            username: identity.username().to_string(),
            text: text.into(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InteractionMessage::Reaction(_) => "reaction",
            InteractionMessage::Comment(_) => "comment",
        }
    }

    pub fn username(&self) -> &str {
        match self {
            InteractionMessage::Reaction(m) => m.username(),
            InteractionMessage::Comment(m) => m.username(),
        }
    }
}
