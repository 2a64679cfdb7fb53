//! Grouping of recognizer results into matcher hypotheses.

use serde::{Deserialize, Serialize};

use crate::matching::Hypothesis;

/// Confidence above which the best alternative is shown to the reader.
const DISPLAY_CONFIDENCE: f64 = 0.7;

/// One transcription alternative with the recognizer's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub transcript: String,
    #[serde(default)]
    pub confidence: f64,
}

/// One recognizer result group: ordered alternatives plus a final flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    #[serde(default)]
    pub is_final: bool,
    pub alternatives: Vec<Alternative>,
}

/// New results of one recognizer event, merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionBatch {
    interim_transcript: String,  // First alternatives of interim groups
    final_transcript: String,    // First alternatives of final groups
    alternatives: Vec<String>,   // Every alternative of every new group
    best: Option<(String, f64)>, // Highest-confidence alternative
}

impl RecognitionBatch {
    /// Merge the groups at or after `result_index`; earlier groups were
    /// already delivered by previous events.
    pub fn from_results(result_index: usize, results: &[RecognitionResult]) -> Self {
        let mut batch = Self::default();

        for result in results.iter().skip(result_index) {
            for alternative in &result.alternatives {
                batch.alternatives.push(alternative.transcript.clone());
                let best_confidence = batch.best.as_ref().map_or(0.0, |(_, c)| *c);
                if alternative.confidence > best_confidence {
                    batch.best = Some((alternative.transcript.clone(), alternative.confidence));
                }
            }

            let Some(first) = result.alternatives.first() else {
                continue;
            };
            if result.is_final {
                batch.final_transcript.push_str(&first.transcript);
                batch.final_transcript.push(' ');
            } else {
                batch.interim_transcript.push_str(&first.transcript);
            }
        }

        batch
    }

    /// Text to show as "what you said".
    pub fn display_text(&self) -> String {
        match &self.best {
            Some((transcript, confidence)) if *confidence > DISPLAY_CONFIDENCE => transcript.trim().to_string(),
            _ if !self.final_transcript.trim().is_empty() => self.final_transcript.trim().to_string(),
            _ => self.interim_transcript.trim().to_string(),
        }
    }

    /// Hypotheses to feed the engine: interim first, then final.
    pub fn hypotheses(&self) -> Vec<Hypothesis> {
        [(&self.interim_transcript, true), (&self.final_transcript, false)]
            .into_iter()
            .filter(|(transcript, _)| !transcript.trim().is_empty())
            .map(|(transcript, is_interim)| Hypothesis {
                transcript: transcript.trim().to_string(),
                alternatives: self.alternatives.clone(),
                is_interim,
            })
            .collect()
    }
}
