//! Messages exchanged between the session and its host.

use serde::{Deserialize, Serialize};

use crate::error::ReadingError;
use crate::matching::ProgressEvent;
use crate::stt::{RecognitionResult, RecognizerCommand};
use crate::tts::Utterance;

fn default_boundary_name() -> String {
    "word".to_string()
}

/// Event delivered by the host: a user command, a recognizer event, a
/// synthesizer event, or a timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// User loaded text to practice.
    LoadText { text: String },
    /// User asked to start listening.
    StartListening,
    /// User asked to stop listening.
    StopListening,
    /// User reset everything.
    Reset,
    /// User toggled read-aloud.
    ReadAloud,
    /// Installed synthesis voices became known or changed.
    VoicesChanged { voices: Vec<String> },
    /// Recognizer delivered results; groups before `result_index` were
    /// delivered by earlier events.
    Result {
        #[serde(default)]
        result_index: usize,
        results: Vec<RecognitionResult>,
    },
    /// Recognizer reported an error code.
    Error { error: String },
    /// Recognizer stopped.
    End,
    /// Retry timer armed by `Effect::ScheduleRestart` fired.
    RestartDue,
    /// Synthesizer reached a boundary.
    Boundary {
        #[serde(default = "default_boundary_name")]
        name: String,
        #[serde(default)]
        char_index: usize,
    },
    /// Synthesizer finished the utterance.
    SpeechEnd,
    /// Synthesizer failed.
    SpeechError {
        #[serde(default)]
        error: String,
    },
}

/// Action the host must perform on behalf of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    StartRecognizer,
    StopRecognizer,
    /// Post `HostEvent::RestartDue` after the delay.
    ScheduleRestart { delay_ms: u64 },
    CancelRestart,
    Speak { utterance: Utterance },
    CancelSpeech,
    Progress { event: ProgressEvent },
    /// Show a message to the user.
    Notify { message: String, recoverable: bool },
}

impl From<RecognizerCommand> for Effect {
    fn from(command: RecognizerCommand) -> Self {
        match command {
            RecognizerCommand::Start => Effect::StartRecognizer,
            RecognizerCommand::Stop => Effect::StopRecognizer,
            RecognizerCommand::ScheduleRestart(delay) => Effect::ScheduleRestart { delay_ms: delay.as_millis() as u64 },
            RecognizerCommand::CancelRestart => Effect::CancelRestart,
        }
    }
}

impl From<&ReadingError> for Effect {
    fn from(error: &ReadingError) -> Self {
        Effect::Notify { message: error.to_string(), recoverable: error.is_recoverable() }
    }
}
