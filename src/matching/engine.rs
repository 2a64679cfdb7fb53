//! Matching and progress engine.
//!
//! Aligns noisy recognition hypotheses against the expected word sequence and
//! advances a monotonic cursor through it, tolerating a bounded number of
//! skipped words.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::render::progress_percent;
use super::similarity::{normalize, phonetic_match, similarity};
use crate::error::ReadingError;

/// Default similarity threshold for interim (still evolving) hypotheses.
pub const DEFAULT_INTERIM_THRESHOLD: f64 = 0.35;

/// Default similarity threshold for final hypotheses.
pub const DEFAULT_FINAL_THRESHOLD: f64 = 0.6;

/// Default number of expected words that may be skipped in one step.
pub const DEFAULT_MAX_SKIP: usize = 1;

/// Longest prefix compared by the shared-prefix rule.
const PREFIX_LEN: usize = 3;

/// Shortest word length for which substring, phonetic and prefix rules apply.
const MIN_FUZZY_LEN: usize = 2;

/// Tuning for the matcher, injected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub interim_threshold: f64, // Similarity threshold for interim hypotheses
    pub final_threshold: f64,   // Similarity threshold for final hypotheses
    pub max_skip: usize,        // Lookahead beyond the current word (0 disables skipping)
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { interim_threshold: DEFAULT_INTERIM_THRESHOLD, final_threshold: DEFAULT_FINAL_THRESHOLD, max_skip: DEFAULT_MAX_SKIP }
    }
}

impl MatchConfig {
    /// Similarity threshold for a hypothesis of the given kind.
    pub fn threshold(&self, is_interim: bool) -> f64 {
        if is_interim { self.interim_threshold } else { self.final_threshold }
    }
}

/// One recognition update handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    pub transcript: String,        // Primary transcript
    pub alternatives: Vec<String>, // Every alternative transcript of the update
    pub is_interim: bool,          // Still-evolving guess
}

/// Outcome of one engine step, consumed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Session already finished or nothing loaded.
    NoOp,
    /// Nothing matched; the word at `at_index` stays the active target.
    Pending { at_index: usize, interim: bool },
    /// The current word was spoken.
    Advance { resolved_index: usize, next_current_index: usize },
    /// Words `skipped_index..matched_index` were accepted without a direct
    /// match because the word at `matched_index` was spoken.
    SkipAdvance { skipped_index: usize, matched_index: usize, next_current_index: usize },
    /// Every expected word has been resolved.
    Completed,
}

impl ProgressEvent {
    /// Number of expected words this event resolved, including any
    /// punctuation-only tokens passed over after the matched word.
    pub fn advanced_words(&self) -> usize {
        match self {
            ProgressEvent::Advance { resolved_index, next_current_index } => next_current_index - resolved_index,
            ProgressEvent::SkipAdvance { skipped_index, next_current_index, .. } => next_current_index - skipped_index,
            _ => 0,
        }
    }
}

/// Which rule accepted a (expected, spoken) pair. All rules are equivalent
/// in effect; the rule is kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Exact,
    Substring,
    Phonetic,
    Similar,
    Prefix,
}

/// Decide whether a spoken word matches an expected word.
///
/// Both inputs must already be normalized. Rules are tried in precedence
/// order and the first satisfied one is returned.
pub fn match_rule(expected: &str, spoken: &str, threshold: f64) -> Option<MatchRule> {
    let expected_len = expected.chars().count();
    let spoken_len = spoken.chars().count();

    if expected == spoken {
        return Some(MatchRule::Exact);
    }
    if spoken_len >= MIN_FUZZY_LEN && expected_len >= MIN_FUZZY_LEN && (expected.contains(spoken) || spoken.contains(expected)) {
        return Some(MatchRule::Substring);
    }
    if spoken_len >= MIN_FUZZY_LEN && phonetic_match(expected, spoken) {
        return Some(MatchRule::Phonetic);
    }
    if similarity(expected, spoken) >= threshold {
        return Some(MatchRule::Similar);
    }

    let prefix_len = PREFIX_LEN.min(spoken_len).min(expected_len);
    if prefix_len >= MIN_FUZZY_LEN && expected.chars().take(prefix_len).eq(spoken.chars().take(prefix_len)) {
        return Some(MatchRule::Prefix);
    }
    None
}

/// Collect the deduplicated lowercase words of a transcript and its alternatives.
pub fn candidate_words(transcript: &str, alternatives: &[String]) -> BTreeSet<String> {
    std::iter::once(transcript)
        .chain(alternatives.iter().map(String::as_str))
        .flat_map(str::split_whitespace)
        .map(str::to_lowercase)
        .collect()
}

/// Matching engine holding the expected words and the progress cursor.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: MatchConfig,
    words: Vec<String>,      // Expected words, original casing
    normalized: Vec<String>, // Expected words, normalized for matching
    cursor: usize,           // Index of the next word to be spoken
    finished: bool,          // Terminal until the next load or reset
}

impl Engine {
    /// Create an empty engine with the given matcher tuning.
    pub fn new(config: MatchConfig) -> Self {
        Self { config, ..Default::default() }
    }

    /// Load the text to practice, replacing any previous text.
    ///
    /// # Returns
    /// The number of expected words.
    ///
    /// # Errors
    /// Returns `ReadingError::EmptyInput` if the text is blank or has no
    /// speakable word; the engine state is left untouched in that case.
    pub fn load_text(&mut self, text: &str) -> Result<usize, ReadingError> {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let normalized: Vec<String> = words.iter().map(|w| normalize(w)).collect();
        if normalized.iter().all(String::is_empty) {
            return Err(ReadingError::EmptyInput);
        }

        self.words = words;
        self.normalized = normalized;
        self.cursor = 0;
        self.finished = false;
        self.pass_unspeakable();

        info!("📖 Loaded {} words", self.words.len());
        Ok(self.words.len())
    }

    /// Drop the loaded text and rewind. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.words.clear();
        self.normalized.clear();
        self.cursor = 0;
        self.finished = false;
    }

    /// Convenience wrapper around [`Engine::process_hypothesis`].
    pub fn process(&mut self, hypothesis: &Hypothesis) -> Vec<ProgressEvent> {
        self.process_hypothesis(&hypothesis.transcript, &hypothesis.alternatives, hypothesis.is_interim)
    }

    /// Match one recognition update against the expected words.
    ///
    /// Checks the current word first, then up to `max_skip` following words.
    /// A match further ahead accepts the words in between without verifying
    /// them. Never fails: unmatched input yields `Pending`.
    ///
    /// # Returns
    /// A non-empty list of events; `Completed` follows the advance that
    /// resolved the last word.
    pub fn process_hypothesis(&mut self, transcript: &str, alternatives: &[String], is_interim: bool) -> Vec<ProgressEvent> {
        if self.finished || self.cursor >= self.words.len() {
            return vec![ProgressEvent::NoOp];
        }

        let candidates: BTreeSet<String> =
            candidate_words(transcript, alternatives).iter().map(|w| normalize(w)).filter(|w| !w.is_empty()).collect();
        let threshold = self.config.threshold(is_interim);
        let last = self.cursor.saturating_add(self.config.max_skip).min(self.words.len() - 1);

        let matched = (self.cursor..=last).find_map(|index| {
            let expected = &self.normalized[index];
            candidates.iter().find_map(|spoken| {
                match_rule(expected, spoken, threshold).map(|rule| {
                    debug!("Matched word {} '{}' with spoken '{}' ({:?})", index, self.words[index], spoken, rule);
                    index
                })
            })
        });

        let mut events = Vec::with_capacity(2);
        match matched {
            Some(index) if index > self.cursor => {
                info!("⚡ Skipped {} word(s) before '{}'", index - self.cursor, self.words[index]);
                let skipped_index = self.cursor;
                self.cursor = index + 1;
                self.pass_unspeakable();
                events.push(ProgressEvent::SkipAdvance { skipped_index, matched_index: index, next_current_index: self.cursor });
            }
            Some(index) => {
                self.cursor = index + 1;
                self.pass_unspeakable();
                events.push(ProgressEvent::Advance { resolved_index: index, next_current_index: self.cursor });
            }
            None => {
                debug!("No match for '{}' (interim: {})", transcript, is_interim);
                return vec![ProgressEvent::Pending { at_index: self.cursor, interim: is_interim }];
            }
        }

        if self.cursor >= self.words.len() {
            self.finished = true;
            info!("🎉 All {} words read", self.words.len());
            events.push(ProgressEvent::Completed);
        }
        events
    }

    /// Move the cursor past tokens with nothing to say ("—", "&", "..."),
    /// which no spoken word can ever match.
    fn pass_unspeakable(&mut self) {
        while self.normalized.get(self.cursor).is_some_and(String::is_empty) {
            debug!("Passing over unspeakable token '{}'", self.words[self.cursor]);
            self.cursor += 1;
        }
    }

    /// Expected words with their original casing.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The word the reader is expected to say next, if any.
    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.cursor).map(String::as_str)
    }

    /// Rounded completion percentage.
    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.cursor, self.words.len())
    }
}
