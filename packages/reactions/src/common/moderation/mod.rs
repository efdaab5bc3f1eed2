/// Comment moderation against a configurable deny-list
///
/// Classifies free-text comments as clean or profane before they are allowed
/// onto a channel. Reactions come from a fixed vocabulary and are never run
/// through moderation.
///
/// # Matching
///
/// - **Whole words, any case**: `BADWORD` matches `badword`, but `class`
///   never matches `ass`
/// - **Obfuscation tolerant**: common leetspeak (`$h1t`) and letter spacing
///   (`b a d w o r d`) are normalized before a second pass. Tokens without
///   letters are left alone, so `455 attendees` stays clean
///
/// # Configuration
///
/// The deny-list is fixed at construction. Deployments add domain-specific
/// terms and remove false positives through [`ModerationConfig`]; there is
/// no shared, mutable word list.
///
/// ```rust
/// use reactions_core::common::moderation::{ModerationConfig, ModerationFilter, ModerationVerdict};
///
/// let config = ModerationConfig::empty().with_extra_words(["badword"]);
/// let filter = ModerationFilter::new(&config).unwrap();
///
/// assert_eq!(filter.classify("that was a BADWORD take"), ModerationVerdict::Profane);
/// assert_eq!(filter.classify("this is great"), ModerationVerdict::Clean);
/// ```

pub mod filter;
pub mod word_list;

pub use filter::{ModerationConfig, ModerationFilter, ModerationVerdict};
pub use word_list::DEFAULT_DENIED_WORDS;
