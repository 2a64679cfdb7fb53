//! Text-to-speech boundary.
//!
//! Read-aloud narration driven by the host's speech synthesizer.

mod narrator;

pub use narrator::{Narrator, SpeechSettings, Utterance};
