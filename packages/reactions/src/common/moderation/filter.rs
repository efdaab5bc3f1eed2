use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

use super::word_list::DEFAULT_DENIED_WORDS;

/// Outcome of classifying a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationVerdict {
    Clean,
    Profane,
}

/// Deny-list configuration handed to [`ModerationFilter::new`]
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Start from [`DEFAULT_DENIED_WORDS`]
    pub include_defaults: bool,
    /// Domain-specific additions
    pub extra_words: Vec<String>,
    /// Words removed from the final list (false positives for this audience)
    pub allowed_words: Vec<String>,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            include_defaults: true,
            extra_words: Vec::new(),
            allowed_words: Vec::new(),
        }
    }
}

impl ModerationConfig {
    /// No built-in words; only what is added explicitly.
    pub fn empty() -> Self {
        Self {
            include_defaults: false,
            ..Self::default()
        }
    }

    pub fn with_extra_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_words.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn with_allowed_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_words.extend(words.into_iter().map(Into::into));
        self
    }
}

lazy_static! {
    // Single characters split by separators: "b a d", "b.a.d", "b-a-d"
    static ref SPACED_LETTERS: Regex = Regex::new(
        r"\b(?:\w[\s._*-]+){2,}\w\b"
    ).unwrap();

    static ref LETTER_SEPARATORS: Regex = Regex::new(r"[\s._*-]+").unwrap();

    static ref TOKEN: Regex = Regex::new(r"\S+").unwrap();
}

/// Read-only profanity classifier.
///
/// Holds one compiled case-insensitive, word-bounded alternation of every
/// denied word. Immutable after construction, so a single instance can be
/// shared (`Arc<ModerationFilter>`) across every session in the process.
#[derive(Debug)]
pub struct ModerationFilter {
    words: BTreeSet<String>,
    pattern: Option<Regex>,
}

impl ModerationFilter {
    pub fn new(config: &ModerationConfig) -> Result<Self, regex::Error> {
        let mut words: BTreeSet<String> = BTreeSet::new();

        if config.include_defaults {
            words.extend(DEFAULT_DENIED_WORDS.iter().filter_map(|w| canonical_word(w)));
        }
        words.extend(config.extra_words.iter().filter_map(|w| canonical_word(w)));

        for allowed in config.allowed_words.iter().filter_map(|w| canonical_word(w)) {
            words.remove(&allowed);
        }

        let pattern = build_pattern(&words)?;

        Ok(Self { words, pattern })
    }

    /// Classify `text` against the deny-list.
    ///
    /// Checks the raw text first, then the leetspeak-normalized text, then any
    /// runs of spaced-out single letters with their separators removed.
    pub fn classify(&self, text: &str) -> ModerationVerdict {
        let Some(pattern) = &self.pattern else {
            return ModerationVerdict::Clean;
        };

        if text.trim().is_empty() {
            return ModerationVerdict::Clean;
        }

        if pattern.is_match(text) {
            return ModerationVerdict::Profane;
        }

        let normalized = normalize_obfuscation(text);
        if pattern.is_match(&normalized) {
            return ModerationVerdict::Profane;
        }

        if self.spaced_run_is_denied(text) {
            return ModerationVerdict::Profane;
        }

        ModerationVerdict::Clean
    }

    // The whole collapsed run must be a denied word: "a s s e s s m e n t"
    // collapses to "assessment" and stays clean.
    fn spaced_run_is_denied(&self, text: &str) -> bool {
        SPACED_LETTERS.find_iter(text).any(|run| {
            let collapsed = LETTER_SEPARATORS.replace_all(run.as_str(), "").to_lowercase();
            let collapsed = normalize_token(&collapsed);
            self.words.contains(collapsed.as_str())
        })
    }

    pub fn is_profane(&self, text: &str) -> bool {
        self.classify(text) == ModerationVerdict::Profane
    }

    /// Canonical (lowercase, de-obfuscated) denied words, sorted.
    pub fn denied_words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Lowercase, de-obfuscate and strip surrounding punctuation from a configured word.
fn canonical_word(word: &str) -> Option<String> {
    let lowered = word.to_lowercase();
    let unquoted = lowered
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '!' | '?' | '.' | ',' | '"' | '\''));
    let normalized = normalize_obfuscation(unquoted);
    let trimmed = normalized.trim_matches(|c: char| !c.is_alphanumeric());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn build_pattern(words: &BTreeSet<String>) -> Result<Option<Regex>, regex::Error> {
    if words.is_empty() {
        return Ok(None);
    }

    // Longest first so "fucking" wins over "fuck" inside the alternation
    let mut ordered: Vec<&String> = words.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation = ordered
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
        .case_insensitive(true)
        .build()
        .map(Some)
}

/// Map common character substitutions back to the letters they stand for.
///
/// Only tokens that already contain a letter are rewritten, so plain numbers
/// ("455", "10/10") are left as they are.
fn normalize_obfuscation(text: &str) -> String {
    TOKEN
        .replace_all(text, |caps: &regex::Captures| normalize_token(&caps[0]))
        .into_owned()
}

fn normalize_token(token: &str) -> String {
    if !token.chars().any(|c| c.is_ascii_alphabetic()) {
        return token.to_string();
    }

    token
        .chars()
        .map(|c| match c {
            '0' => 'o',
            '1' | '!' => 'i',
            '3' => 'e',
            '4' | '@' => 'a',
            '5' | '$' => 's',
            '7' => 't',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_with(words: &[&str]) -> ModerationFilter {
        ModerationFilter::new(&ModerationConfig::empty().with_extra_words(words.iter().copied()))
            .unwrap()
    }

    #[test]
    fn matches_whole_words_case_insensitively() {
        let filter = filter_with(&["badword"]);

        assert!(filter.is_profane("that was a BADWORD take"));
        assert!(filter.is_profane("badword"));
        assert!(filter.is_profane("BadWord!"));
        assert!(filter.is_profane("ok, badword."));
    }

    #[test]
    fn does_not_match_inside_unrelated_words() {
        let filter = filter_with(&["ass"]);

        assert!(!filter.is_profane("this class is great"));
        assert!(!filter.is_profane("assessment pending"));
        assert!(!filter.is_profane("bass guitar"));
        assert!(filter.is_profane("what an ass"));
    }

    #[test]
    fn empty_text_is_clean() {
        let filter = ModerationFilter::new(&ModerationConfig::default()).unwrap();

        assert_eq!(filter.classify(""), ModerationVerdict::Clean);
        assert_eq!(filter.classify("   "), ModerationVerdict::Clean);
    }

    #[test]
    fn empty_deny_list_never_blocks() {
        let filter = ModerationFilter::new(&ModerationConfig::empty()).unwrap();

        assert!(filter.is_empty());
        assert!(!filter.is_profane("anything at all, shit included"));
    }

    #[test]
    fn leetspeak_is_normalized() {
        let filter = filter_with(&["shit", "badword"]);

        assert!(filter.is_profane("$h1t happens"));
        assert!(filter.is_profane("b4dw0rd"));
        assert!(!filter.is_profane("10 out of 10"));
    }

    #[test]
    fn plain_numbers_are_not_read_as_leetspeak() {
        let filter = ModerationFilter::new(&ModerationConfig::default()).unwrap();

        for text in [
            "We had 455 attendees",
            "see slide 455",
            "scores were 4 5 5",
            "a s s e s s m e n t",
            "5/5 would attend again",
        ] {
            assert_eq!(filter.classify(text), ModerationVerdict::Clean, "{}", text);
        }
        assert_eq!(filter.classify("what an 455hole"), ModerationVerdict::Profane);
    }

    #[test]
    fn spaced_out_letters_are_collapsed() {
        let filter = filter_with(&["badword"]);

        assert!(filter.is_profane("you are b a d w o r d"));
        assert!(filter.is_profane("b.a.d.w.o.r.d"));
        assert!(filter.is_profane("B 4 D W 0 R D"));
        assert!(!filter.is_profane("a b c d"));
        assert!(!filter.is_profane("b a d w o r d s"));
    }

    #[test]
    fn defaults_can_be_extended_and_trimmed() {
        let config = ModerationConfig::default()
            .with_extra_words(["Badword"])
            .with_allowed_words(["PISS"]);
        let filter = ModerationFilter::new(&config).unwrap();

        assert!(filter.is_profane("badword"));
        assert!(filter.is_profane("shit"));
        assert!(!filter.is_profane("piss"));
        assert!(filter.denied_words().any(|w| w == "badword"));
        assert!(filter.denied_words().all(|w| w != "piss"));
    }

    #[test]
    fn configured_words_are_canonicalized() {
        let filter = filter_with(&["  B4DW0RD! ", "", "!!"]);

        assert_eq!(filter.denied_words().collect::<Vec<_>>(), vec!["badword"]);
        assert!(filter.is_profane("badword"));
    }

    #[test]
    fn multi_word_terms_match_as_phrases() {
        let filter = filter_with(&["bad take"]);

        assert!(filter.is_profane("such a BAD TAKE honestly"));
        assert!(!filter.is_profane("bad takeaway"));
    }

    #[test]
    fn shared_filter_is_usable_across_threads() {
        let filter = std::sync::Arc::new(filter_with(&["badword"]));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let filter = filter.clone();
                std::thread::spawn(move || {
                    let text = if i % 2 == 0 { "badword" } else { "fine" };
                    filter.is_profane(text)
                })
            })
            .collect();

        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![true, false, true, false]);
    }
}
