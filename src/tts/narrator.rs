//! Read-aloud narration.
//!
//! Builds the utterance handed to the host's speech synthesizer and maps its
//! word-boundary events onto word highlights. Boundaries arrive in spoken
//! order, so the n-th word boundary highlights the n-th expected word.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Boundary event name reported for words.
const WORD_BOUNDARY: &str = "word";

/// Voice parameters for read-aloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    pub lang: String, // BCP 47 language tag
    pub rate: f32,    // Natural reading pace is slightly below 1.0
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self { lang: "en-US".to_string(), rate: 0.9, pitch: 1.0, volume: 1.0 }
    }
}

/// Utterance for the host's speech synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<String>,
    #[serde(flatten)]
    pub settings: SpeechSettings,
}

/// Highlight state driven by synthesis playback.
#[derive(Debug, Clone, Default)]
pub struct Narrator {
    speaking: bool,                // An utterance is playing
    total: usize,                  // Words in the utterance
    next_word: usize,              // Index highlighted by the next word boundary
    current: Option<usize>,        // Word being spoken
    highlighted: BTreeSet<usize>,  // Words marked as read
}

impl Narrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start narrating `words` from the beginning.
    ///
    /// # Returns
    /// The utterance to speak: the words joined by single spaces.
    pub fn begin(&mut self, words: &[String], voice: Option<&str>, settings: &SpeechSettings) -> Utterance {
        self.clear();
        self.speaking = true;
        self.total = words.len();

        if let Some(voice) = voice {
            info!("Using voice: {}", voice);
        }
        info!("🔊 Reading {} words aloud", words.len());

        Utterance { text: words.join(" "), voice: voice.map(str::to_string), settings: settings.clone() }
    }

    /// Handle a synthesizer boundary event.
    ///
    /// # Returns
    /// The index of the word now being spoken, if the boundary advanced.
    pub fn on_boundary(&mut self, name: &str) -> Option<usize> {
        if !self.speaking || name != WORD_BOUNDARY || self.next_word >= self.total {
            return None;
        }
        let index = self.next_word;
        self.current = Some(index);
        self.next_word += 1;
        debug!("Speaking word {}", index);
        Some(index)
    }

    /// Playback finished: every word counts as read.
    pub fn on_end(&mut self) {
        self.speaking = false;
        self.current = None;
        self.highlighted = (0..self.total).collect();
        info!("Finished reading");
    }

    /// Playback failed: drop the current-word marker.
    pub fn on_error(&mut self) {
        self.speaking = false;
        self.current = None;
    }

    /// Playback was cancelled: drop every highlight.
    pub fn cancel(&mut self) {
        self.clear();
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn highlighted(&self) -> &BTreeSet<usize> {
        &self.highlighted
    }

    fn clear(&mut self) {
        self.speaking = false;
        self.total = 0;
        self.next_word = 0;
        self.current = None;
        self.highlighted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Vec<String> {
        ["the", "quick", "fox"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_begin_builds_utterance() {
        let mut narrator = Narrator::new();
        let utterance = narrator.begin(&words(), Some("Samantha"), &SpeechSettings::default());
        assert_eq!(utterance.text, "the quick fox");
        assert_eq!(utterance.voice.as_deref(), Some("Samantha"));
        assert_eq!(utterance.settings.rate, 0.9);
        assert_eq!(utterance.settings.lang, "en-US");
        assert!(narrator.is_speaking());
    }

    #[test]
    fn test_word_boundaries_follow_spoken_order() {
        let mut narrator = Narrator::new();
        narrator.begin(&words(), None, &SpeechSettings::default());

        assert_eq!(narrator.on_boundary("word"), Some(0));
        assert_eq!(narrator.on_boundary("sentence"), None);
        assert_eq!(narrator.current(), Some(0));
        assert_eq!(narrator.on_boundary("word"), Some(1));
        assert_eq!(narrator.on_boundary("word"), Some(2));
        assert_eq!(narrator.on_boundary("word"), None);
        assert_eq!(narrator.current(), Some(2));
    }

    #[test]
    fn test_end_highlights_everything() {
        let mut narrator = Narrator::new();
        narrator.begin(&words(), None, &SpeechSettings::default());
        narrator.on_boundary("word");
        narrator.on_end();
        assert!(!narrator.is_speaking());
        assert_eq!(narrator.current(), None);
        assert_eq!(narrator.highlighted().len(), 3);
    }

    #[test]
    fn test_cancel_and_error_clear_current() {
        let mut narrator = Narrator::new();
        narrator.begin(&words(), None, &SpeechSettings::default());
        narrator.on_boundary("word");
        narrator.on_error();
        assert_eq!(narrator.current(), None);
        assert_eq!(narrator.on_boundary("word"), None);

        narrator.begin(&words(), None, &SpeechSettings::default());
        narrator.cancel();
        assert!(!narrator.is_speaking());
        assert!(narrator.highlighted().is_empty());
    }
}
