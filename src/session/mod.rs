//! Reading session state machine.
//!
//! A single handler takes host events one at a time and returns the effects
//! the host must perform. The session owns the matching engine, the
//! recognition lifecycle and the narrator, and decides which of the two
//! drivers (recognition progress or read-aloud playback) owns the highlight.

mod events;

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

pub use events::{Effect, HostEvent};

use crate::config::VoicePreferences;
use crate::error::ReadingError;
use crate::matching::{Engine, MatchConfig, ProgressEvent, WordView, render_state};
use crate::stt::{DEFAULT_RETRY_DELAY, RecognitionBatch, RecognitionController, RecognitionPhase, RecognitionResult, RecognizerCommand};
use crate::tts::{Narrator, SpeechSettings};

const STATUS_WELCOME: &str = "Enter text and click \"Load Text\" to begin.";
const STATUS_LOADED: &str = "Text loaded! Click \"Start Speaking\" to begin or \"Read Text Aloud\" to listen.";
const STATUS_LISTENING: &str = "🎤 Listening... Speak now!";
const STATUS_RETRYING: &str = "Listening... (retrying)";
const STATUS_STOPPED: &str = "Stopped listening.";
const STATUS_RECOGNITION_ENDED: &str = "Recognition stopped.";
const STATUS_READING: &str = "🔊 Reading text aloud...";
const STATUS_READ_DONE: &str = "Finished reading.";
const STATUS_READ_ERROR: &str = "Error reading text.";
const STATUS_COMPLETED: &str = "🎉 Amazing! You completed the paragraph!";
const STATUS_READY: &str = "Ready";
const COMPLETED_HINT: &str = "✨ Great job! Enter a new paragraph to continue practicing.";

/// Everything the session needs at construction.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub matching: MatchConfig,       // Matcher thresholds and lookahead
    pub retry_delay: Duration,       // Delay before restarting after transient errors
    pub speech: SpeechSettings,      // Read-aloud voice parameters
    pub voices: VoicePreferences,    // Read-aloud voice choice
    pub recognition_available: bool, // Host provides a speech recognizer
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            matching: MatchConfig::default(),
            retry_delay: DEFAULT_RETRY_DELAY,
            speech: SpeechSettings::default(),
            voices: VoicePreferences::default(),
            recognition_available: true,
        }
    }
}

/// Which driver owns the highlighted words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum HighlightDriver {
    #[default]
    Recognition,
    Synthesis,
}

/// Snapshot of what the UI should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub phase: RecognitionPhase,
    pub speaking: bool,
    pub cursor: usize,
    pub total: usize,
    pub progress: u8,
    pub status: String,
    pub recognized_text: String,
    pub words: Vec<WordView>,
}

/// One reading-practice session.
pub struct Session {
    engine: Engine,                       // Expected words and progress cursor
    recognition: RecognitionController,   // Recognizer lifecycle
    narrator: Narrator,                   // Read-aloud highlight state
    driver: HighlightDriver,              // Current owner of the highlight
    speech: SpeechSettings,               // Read-aloud voice parameters
    voices: VoicePreferences,             // Read-aloud voice choice
    installed_voices: Vec<String>,        // Voices reported by the host
    status: String,                       // Status line
    recognized_text: String,              // Last thing the reader said
}

impl Session {
    /// Create an idle session with no text loaded.
    pub fn new(settings: SessionSettings) -> Self {
        let status = if settings.recognition_available { STATUS_WELCOME.to_string() } else { ReadingError::RecognitionUnavailable.to_string() };

        Self {
            engine: Engine::new(settings.matching),
            recognition: RecognitionController::new(settings.recognition_available, settings.retry_delay),
            narrator: Narrator::new(),
            driver: HighlightDriver::Recognition,
            speech: settings.speech,
            voices: settings.voices,
            installed_voices: Vec::new(),
            status,
            recognized_text: String::new(),
        }
    }

    /// Effects to run once at startup: a missing recognizer is reported here
    /// and nowhere else.
    pub fn startup(&self) -> Vec<Effect> {
        if self.recognition.is_available() {
            Vec::new()
        } else {
            warn!("Speech recognition is not available on this host");
            vec![Effect::from(&ReadingError::RecognitionUnavailable)]
        }
    }

    /// Process one host event to completion.
    ///
    /// # Returns
    /// The effects the host must perform, in order.
    pub fn handle(&mut self, event: HostEvent) -> Vec<Effect> {
        debug!("Handling {:?}", event);
        match event {
            HostEvent::LoadText { text } => self.load_text(&text),
            HostEvent::StartListening => self.start_listening(),
            HostEvent::StopListening => self.stop_listening(),
            HostEvent::Reset => self.reset(),
            HostEvent::ReadAloud => self.toggle_read_aloud(),
            HostEvent::VoicesChanged { voices } => {
                debug!("{} synthesis voices installed", voices.len());
                self.installed_voices = voices;
                Vec::new()
            }
            HostEvent::Result { result_index, results } => self.on_results(result_index, &results),
            HostEvent::Error { error } => self.on_recognition_error(&error),
            HostEvent::End => self.on_recognition_end(),
            HostEvent::RestartDue => commands(self.recognition.on_restart_due()),
            HostEvent::Boundary { name, char_index } => {
                if self.driver == HighlightDriver::Synthesis
                    && let Some(index) = self.narrator.on_boundary(&name)
                {
                    debug!("Boundary at char {} -> word {}", char_index, index);
                }
                Vec::new()
            }
            HostEvent::SpeechEnd => {
                if self.narrator.is_speaking() {
                    self.narrator.on_end();
                    self.status = STATUS_READ_DONE.to_string();
                }
                Vec::new()
            }
            HostEvent::SpeechError { error } => {
                if self.narrator.is_speaking() {
                    warn!("Speech synthesis error: {}", error);
                    self.narrator.on_error();
                    self.status = STATUS_READ_ERROR.to_string();
                }
                Vec::new()
            }
        }
    }

    fn load_text(&mut self, text: &str) -> Vec<Effect> {
        if let Err(e) = self.engine.load_text(text) {
            warn!("Rejected text: {}", e);
            return vec![Effect::from(&e)];
        }

        let mut effects = self.cancel_speech();
        if self.recognition.phase() == RecognitionPhase::Completed {
            effects.extend(commands(self.recognition.reset()));
        }
        self.driver = HighlightDriver::Recognition;
        self.recognized_text.clear();
        self.status = STATUS_LOADED.to_string();
        effects
    }

    fn start_listening(&mut self) -> Vec<Effect> {
        let has_text = !self.engine.is_empty() && !self.engine.is_finished();
        match self.recognition.start(has_text) {
            Ok(started) => {
                // Synthesis gives up the highlight before recognition takes it.
                let mut effects = self.cancel_speech();
                effects.extend(commands(started));
                self.driver = HighlightDriver::Recognition;
                self.status = STATUS_LISTENING.to_string();
                debug!("Waiting for '{}'", self.engine.current_word().unwrap_or_default());
                effects
            }
            Err(e) => {
                warn!("Cannot start listening: {}", e);
                self.status = e.to_string();
                vec![Effect::from(&e)]
            }
        }
    }

    fn stop_listening(&mut self) -> Vec<Effect> {
        let effects = commands(self.recognition.stop());
        if self.recognition.phase() == RecognitionPhase::Idle {
            self.status = STATUS_STOPPED.to_string();
        }
        effects
    }

    fn reset(&mut self) -> Vec<Effect> {
        let mut effects = commands(self.recognition.reset());
        effects.extend(self.cancel_speech());
        self.engine.reset();
        self.driver = HighlightDriver::Recognition;
        self.recognized_text.clear();
        self.status = STATUS_READY.to_string();
        effects
    }

    fn toggle_read_aloud(&mut self) -> Vec<Effect> {
        if self.narrator.is_speaking() {
            info!("⏸️  Read-aloud stopped");
            return self.cancel_speech();
        }
        if self.engine.is_empty() {
            debug!("Nothing to read aloud");
            return Vec::new();
        }

        // Recognition gives up the highlight before synthesis takes it.
        let mut effects = commands(self.recognition.stop());
        let voice = self.voices.select(&self.installed_voices);
        let utterance = self.narrator.begin(self.engine.words(), voice, &self.speech);
        self.driver = HighlightDriver::Synthesis;
        self.status = STATUS_READING.to_string();
        effects.push(Effect::Speak { utterance });
        effects
    }

    fn on_results(&mut self, result_index: usize, results: &[RecognitionResult]) -> Vec<Effect> {
        let batch = RecognitionBatch::from_results(result_index, results);
        let display = batch.display_text();
        if !display.is_empty() {
            self.recognized_text = display;
        }

        if !self.recognition.is_listening() {
            debug!("Ignoring results while not listening");
            return Vec::new();
        }

        let mut effects = Vec::new();
        for hypothesis in batch.hypotheses() {
            for event in self.engine.process(&hypothesis) {
                if event == ProgressEvent::NoOp {
                    continue;
                }
                effects.push(Effect::Progress { event });
                if event == ProgressEvent::Completed {
                    effects.extend(commands(self.recognition.complete()));
                    self.status = STATUS_COMPLETED.to_string();
                    self.recognized_text = COMPLETED_HINT.to_string();
                }
            }
        }
        effects
    }

    fn on_recognition_error(&mut self, code: &str) -> Vec<Effect> {
        let was_listening = self.recognition.is_listening();
        let (error, effects) = self.recognition.on_error(code);
        let mut effects = commands(effects);

        if error.is_recoverable() {
            if was_listening {
                self.status = STATUS_RETRYING.to_string();
            }
        } else {
            self.status = error.to_string();
            effects.push(Effect::from(&error));
        }
        effects
    }

    fn on_recognition_end(&mut self) -> Vec<Effect> {
        let effects = commands(self.recognition.on_end());
        if effects.is_empty() && self.recognition.phase() == RecognitionPhase::Idle && self.driver == HighlightDriver::Recognition {
            self.status = STATUS_RECOGNITION_ENDED.to_string();
        }
        effects
    }

    /// Stop read-aloud if it is playing and drop its highlights.
    fn cancel_speech(&mut self) -> Vec<Effect> {
        let speaking = self.narrator.is_speaking();
        self.narrator.cancel();
        if speaking { vec![Effect::CancelSpeech] } else { Vec::new() }
    }

    /// Project the session onto what the UI should show.
    pub fn view(&self) -> SessionView {
        let words = match self.driver {
            HighlightDriver::Synthesis => render_state(self.engine.words(), self.narrator.current(), self.narrator.highlighted()),
            HighlightDriver::Recognition => {
                let cursor = self.engine.cursor();
                let resolved: BTreeSet<usize> = (0..cursor).collect();
                let current = (cursor < self.engine.len()).then_some(cursor);
                render_state(self.engine.words(), current, &resolved)
            }
        };

        SessionView {
            phase: self.recognition.phase(),
            speaking: self.narrator.is_speaking(),
            cursor: self.engine.cursor(),
            total: self.engine.len(),
            progress: self.engine.progress_percent(),
            status: self.status.clone(),
            recognized_text: self.recognized_text.clone(),
            words,
        }
    }
}

fn commands(commands: Vec<RecognizerCommand>) -> Vec<Effect> {
    commands.into_iter().map(Effect::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::render::WordState;
    use crate::stt::Alternative;

    fn session() -> Session {
        Session::new(SessionSettings::default())
    }

    fn said(transcript: &str, is_final: bool) -> HostEvent {
        HostEvent::Result {
            result_index: 0,
            results: vec![RecognitionResult { is_final, alternatives: vec![Alternative { transcript: transcript.to_string(), confidence: 0.9 }] }],
        }
    }

    fn listening(text: &str) -> Session {
        let mut session = session();
        session.handle(HostEvent::LoadText { text: text.to_string() });
        assert_eq!(session.handle(HostEvent::StartListening), vec![Effect::StartRecognizer]);
        session
    }

    fn states(session: &Session) -> Vec<WordState> {
        session.view().words.iter().map(|w| w.state).collect()
    }

    #[test]
    fn test_load_blank_text_notifies_without_state_change() {
        let mut session = session();
        let effects = session.handle(HostEvent::LoadText { text: "  ".to_string() });
        assert!(matches!(&effects[..], [Effect::Notify { recoverable: true, .. }]));
        assert_eq!(session.view().total, 0);
        assert_eq!(session.view().status, STATUS_WELCOME);
    }

    #[test]
    fn test_start_without_text_is_refused() {
        let mut session = session();
        let effects = session.handle(HostEvent::StartListening);
        assert!(matches!(&effects[..], [Effect::Notify { .. }]));
        assert_eq!(session.view().phase, RecognitionPhase::Idle);
    }

    #[test]
    fn test_unavailable_recognizer_reported_once_at_startup() {
        let mut session = Session::new(SessionSettings { recognition_available: false, ..Default::default() });
        assert_eq!(session.startup().len(), 1);
        session.handle(HostEvent::LoadText { text: "hello".to_string() });
        let effects = session.handle(HostEvent::StartListening);
        assert_eq!(effects, vec![Effect::from(&ReadingError::RecognitionUnavailable)]);
    }

    #[test]
    fn test_full_practice_run() {
        let mut session = listening("the quick brown fox");
        assert_eq!(states(&session)[0], WordState::Current);

        session.handle(said("the", true));
        assert_eq!(session.view().cursor, 1);
        assert_eq!(session.view().progress, 25);

        let effects = session.handle(said("brown", true));
        assert_eq!(session.view().cursor, 3);
        assert!(matches!(effects[0], Effect::Progress { event: ProgressEvent::SkipAdvance { skipped_index: 1, matched_index: 2, .. } }));
        assert_eq!(states(&session), vec![WordState::Highlighted, WordState::Highlighted, WordState::Highlighted, WordState::Current]);

        let effects = session.handle(said("fox", true));
        assert!(effects.contains(&Effect::Progress { event: ProgressEvent::Completed }));
        assert!(effects.contains(&Effect::StopRecognizer));
        let view = session.view();
        assert_eq!(view.phase, RecognitionPhase::Completed);
        assert_eq!(view.progress, 100);
        assert_eq!(view.status, STATUS_COMPLETED);
        assert!(view.words.iter().all(|w| w.state == WordState::Highlighted));

        // The recognizer's own end event does not overwrite the celebration.
        assert!(session.handle(HostEvent::End).is_empty());
        assert_eq!(session.view().status, STATUS_COMPLETED);
        assert!(matches!(&session.handle(HostEvent::StartListening)[..], [Effect::Notify { .. }]));
    }

    #[test]
    fn test_interim_then_final_in_one_event() {
        let mut session = listening("one two three");
        let event = HostEvent::Result {
            result_index: 0,
            results: vec![
                RecognitionResult { is_final: true, alternatives: vec![Alternative { transcript: "one".to_string(), confidence: 0.9 }] },
                RecognitionResult { is_final: false, alternatives: vec![Alternative { transcript: "xyz".to_string(), confidence: 0.2 }] },
            ],
        };
        let effects = session.handle(event);
        // Interim goes first and already carries every alternative of the
        // event, so it advances; the final one then pends on the next word.
        assert!(matches!(effects[0], Effect::Progress { event: ProgressEvent::Advance { resolved_index: 0, .. } }));
        assert!(matches!(effects[1], Effect::Progress { event: ProgressEvent::Pending { at_index: 1, interim: false } }));
        assert_eq!(session.view().recognized_text, "one");
    }

    #[test]
    fn test_results_ignored_when_not_listening() {
        let mut session = session();
        session.handle(HostEvent::LoadText { text: "one two".to_string() });
        assert!(session.handle(said("one", true)).is_empty());
        assert_eq!(session.view().cursor, 0);
    }

    #[test]
    fn test_transient_error_retries_after_delay() {
        let mut session = listening("one two");
        assert_eq!(session.handle(HostEvent::Error { error: "network".to_string() }), vec![Effect::ScheduleRestart { delay_ms: 1000 }]);
        assert_eq!(session.view().status, STATUS_RETRYING);
        assert!(session.handle(HostEvent::End).is_empty());
        assert_eq!(session.handle(HostEvent::RestartDue), vec![Effect::StartRecognizer]);
        assert_eq!(session.view().phase, RecognitionPhase::Listening);
    }

    #[test]
    fn test_fatal_error_halts_session() {
        let mut session = listening("one two");
        session.handle(said("one", true));
        let effects = session.handle(HostEvent::Error { error: "not-allowed".to_string() });
        assert!(matches!(&effects[..], [Effect::Notify { recoverable: false, .. }]));
        let view = session.view();
        assert_eq!(view.phase, RecognitionPhase::Idle);
        assert_eq!(view.status, "Error: not-allowed");
        assert_eq!(view.cursor, 1);
    }

    #[test]
    fn test_end_while_listening_restarts() {
        let mut session = listening("one two");
        assert_eq!(session.handle(HostEvent::End), vec![Effect::StartRecognizer]);
        session.handle(HostEvent::StopListening);
        assert!(session.handle(HostEvent::End).is_empty());
        assert_eq!(session.view().status, STATUS_RECOGNITION_ENDED);
    }

    #[test]
    fn test_read_aloud_takes_highlight_from_recognition() {
        let mut session = listening("the quick fox");
        session.handle(HostEvent::VoicesChanged { voices: vec!["Alex".to_string(), "Samantha".to_string()] });
        session.handle(said("the", true));

        let effects = session.handle(HostEvent::ReadAloud);
        assert_eq!(effects[0], Effect::StopRecognizer);
        match &effects[1] {
            Effect::Speak { utterance } => {
                assert_eq!(utterance.text, "the quick fox");
                assert_eq!(utterance.voice.as_deref(), Some("Samantha"));
            }
            other => panic!("unexpected effect: {:?}", other),
        }
        assert!(states(&session).iter().all(|s| *s == WordState::Plain));

        session.handle(HostEvent::Boundary { name: "word".to_string(), char_index: 0 });
        session.handle(HostEvent::Boundary { name: "word".to_string(), char_index: 4 });
        assert_eq!(states(&session), vec![WordState::Plain, WordState::Current, WordState::Plain]);

        session.handle(HostEvent::SpeechEnd);
        assert!(states(&session).iter().all(|s| *s == WordState::Highlighted));
        assert_eq!(session.view().status, STATUS_READ_DONE);
        // Recognition progress is untouched by read-aloud.
        assert_eq!(session.view().cursor, 1);
    }

    #[test]
    fn test_start_listening_cancels_read_aloud() {
        let mut session = session();
        session.handle(HostEvent::LoadText { text: "one two".to_string() });
        session.handle(HostEvent::ReadAloud);
        let effects = session.handle(HostEvent::StartListening);
        assert_eq!(effects, vec![Effect::CancelSpeech, Effect::StartRecognizer]);
        assert!(!session.view().speaking);
        assert_eq!(states(&session), vec![WordState::Current, WordState::Plain]);
        // Late boundaries from the cancelled utterance change nothing.
        session.handle(HostEvent::Boundary { name: "word".to_string(), char_index: 0 });
        assert_eq!(states(&session), vec![WordState::Current, WordState::Plain]);
    }

    #[test]
    fn test_read_aloud_toggle_cancels() {
        let mut session = session();
        session.handle(HostEvent::LoadText { text: "one two".to_string() });
        session.handle(HostEvent::ReadAloud);
        assert_eq!(session.handle(HostEvent::ReadAloud), vec![Effect::CancelSpeech]);
        assert!(!session.view().speaking);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut session = listening("one two");
        session.handle(said("one", true));
        session.handle(HostEvent::Error { error: "no-speech".to_string() });

        let effects = session.handle(HostEvent::Reset);
        assert_eq!(effects, vec![Effect::CancelRestart, Effect::StopRecognizer]);
        assert!(session.handle(HostEvent::Reset).is_empty());

        let view = session.view();
        assert_eq!(view.phase, RecognitionPhase::Idle);
        assert_eq!(view.total, 0);
        assert_eq!(view.cursor, 0);
        assert_eq!(view.progress, 0);
        assert_eq!(view.status, STATUS_READY);
        assert!(session.handle(HostEvent::RestartDue).is_empty());
    }

    #[test]
    fn test_reload_after_completion_allows_new_session() {
        let mut session = listening("hi");
        session.handle(said("hi", true));
        assert_eq!(session.view().phase, RecognitionPhase::Completed);

        session.handle(HostEvent::LoadText { text: "bye now".to_string() });
        let view = session.view();
        assert_eq!(view.phase, RecognitionPhase::Idle);
        assert_eq!(view.cursor, 0);
        assert_eq!(session.handle(HostEvent::StartListening), vec![Effect::StartRecognizer]);
    }
}
