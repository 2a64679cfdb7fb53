//! Recognition lifecycle state machine.
//!
//! Tracks whether the external recognizer should be running and decides when
//! to start, stop or restart it. The recognizer itself lives in the host; this
//! module only emits commands for it.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ReadingError;

/// Recognizer error codes retried automatically.
const TRANSIENT_ERRORS: &[&str] = &["network", "no-speech"];

/// Default delay before restarting after a transient error.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Lifecycle phase of a practice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionPhase {
    #[default]
    Idle,
    Listening,
    Completed,
}

/// Command for the host's recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerCommand {
    Start,
    Stop,
    ScheduleRestart(Duration),
    CancelRestart,
}

/// Map a recognizer error code to a session error.
pub fn classify_error(code: &str) -> ReadingError {
    if TRANSIENT_ERRORS.contains(&code) {
        ReadingError::RecognitionTransient { code: code.to_string() }
    } else {
        ReadingError::RecognitionFatal { code: code.to_string() }
    }
}

/// Recognition controller: `Idle -> Listening -> {Idle, Completed}`.
#[derive(Debug, Clone)]
pub struct RecognitionController {
    phase: RecognitionPhase,
    available: bool,        // Host has a recognizer at all
    retry_delay: Duration,  // Delay before restarting after a transient error
    restart_pending: bool,  // A restart timer is armed
}

impl RecognitionController {
    /// Create a controller.
    ///
    /// # Arguments
    /// * `available` - Whether the host platform provides a recognizer
    /// * `retry_delay` - Delay before restarting after a transient error
    pub fn new(available: bool, retry_delay: Duration) -> Self {
        Self { phase: RecognitionPhase::Idle, available, retry_delay, restart_pending: false }
    }

    pub fn phase(&self) -> RecognitionPhase {
        self.phase
    }

    pub fn is_listening(&self) -> bool {
        self.phase == RecognitionPhase::Listening
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Begin listening.
    ///
    /// # Arguments
    /// * `has_text` - Whether text is loaded and not yet finished
    ///
    /// # Errors
    /// Returns `RecognitionUnavailable` without a recognizer and
    /// `NothingLoaded` when there is nothing to read.
    pub fn start(&mut self, has_text: bool) -> Result<Vec<RecognizerCommand>, ReadingError> {
        if !self.available {
            return Err(ReadingError::RecognitionUnavailable);
        }
        if !has_text {
            return Err(ReadingError::NothingLoaded);
        }
        if self.phase == RecognitionPhase::Listening {
            debug!("Recognition already running");
            return Ok(Vec::new());
        }

        info!("🎤 Starting recognition");
        self.phase = RecognitionPhase::Listening;
        Ok(vec![RecognizerCommand::Start])
    }

    /// Stop listening. Idempotent.
    pub fn stop(&mut self) -> Vec<RecognizerCommand> {
        let mut commands = self.cancel_restart();
        if self.phase == RecognitionPhase::Listening {
            info!("Stopping recognition");
            self.phase = RecognitionPhase::Idle;
            commands.push(RecognizerCommand::Stop);
        }
        commands
    }

    /// Every expected word was read: stop and become terminal.
    pub fn complete(&mut self) -> Vec<RecognizerCommand> {
        let mut commands = self.cancel_restart();
        if self.phase == RecognitionPhase::Listening {
            commands.push(RecognizerCommand::Stop);
        }
        self.phase = RecognitionPhase::Completed;
        commands
    }

    /// Back to idle after a reset or a new text load.
    pub fn reset(&mut self) -> Vec<RecognizerCommand> {
        let commands = self.stop();
        self.phase = RecognitionPhase::Idle;
        commands
    }

    /// Handle a recognizer error.
    ///
    /// # Returns
    /// The classified error and the commands to run. Transient errors keep
    /// the session listening and arm a restart; fatal ones stop it.
    pub fn on_error(&mut self, code: &str) -> (ReadingError, Vec<RecognizerCommand>) {
        let error = classify_error(code);
        match error {
            ReadingError::RecognitionTransient { .. } => {
                warn!("Transient recognition error: {}", code);
                if self.phase != RecognitionPhase::Listening || self.restart_pending {
                    return (error, Vec::new());
                }
                self.restart_pending = true;
                (error, vec![RecognizerCommand::ScheduleRestart(self.retry_delay)])
            }
            _ => {
                warn!("❌ Recognition error: {}", code);
                let commands = self.cancel_restart();
                if self.phase == RecognitionPhase::Listening {
                    self.phase = RecognitionPhase::Idle;
                }
                (error, commands)
            }
        }
    }

    /// The recognizer ended on its own. Restart it if the session still
    /// wants to listen and no retry timer will do so.
    pub fn on_end(&mut self) -> Vec<RecognizerCommand> {
        if self.phase == RecognitionPhase::Listening && !self.restart_pending {
            debug!("Recognizer ended while listening, restarting");
            vec![RecognizerCommand::Start]
        } else {
            Vec::new()
        }
    }

    /// The retry timer fired.
    pub fn on_restart_due(&mut self) -> Vec<RecognizerCommand> {
        if !self.restart_pending {
            debug!("Ignoring stale restart timer");
            return Vec::new();
        }
        self.restart_pending = false;
        if self.phase == RecognitionPhase::Listening {
            info!("🔄 Restarting recognition");
            vec![RecognizerCommand::Start]
        } else {
            Vec::new()
        }
    }

    fn cancel_restart(&mut self) -> Vec<RecognizerCommand> {
        if std::mem::take(&mut self.restart_pending) { vec![RecognizerCommand::CancelRestart] } else { Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listening() -> RecognitionController {
        let mut controller = RecognitionController::new(true, DEFAULT_RETRY_DELAY);
        controller.start(true).unwrap();
        controller
    }

    #[test]
    fn test_classify_error() {
        assert!(matches!(classify_error("network"), ReadingError::RecognitionTransient { .. }));
        assert!(matches!(classify_error("no-speech"), ReadingError::RecognitionTransient { .. }));
        assert!(matches!(classify_error("not-allowed"), ReadingError::RecognitionFatal { .. }));
    }

    #[test]
    fn test_start_requires_recognizer_and_text() {
        let mut controller = RecognitionController::new(false, DEFAULT_RETRY_DELAY);
        assert_eq!(controller.start(true), Err(ReadingError::RecognitionUnavailable));

        let mut controller = RecognitionController::new(true, DEFAULT_RETRY_DELAY);
        assert_eq!(controller.start(false), Err(ReadingError::NothingLoaded));
        assert_eq!(controller.phase(), RecognitionPhase::Idle);
        assert_eq!(controller.start(true), Ok(vec![RecognizerCommand::Start]));
        assert_eq!(controller.start(true), Ok(vec![]));
    }

    #[test]
    fn test_end_restarts_only_while_listening() {
        let mut controller = listening();
        assert_eq!(controller.on_end(), vec![RecognizerCommand::Start]);

        assert_eq!(controller.stop(), vec![RecognizerCommand::Stop]);
        assert!(controller.on_end().is_empty());
    }

    #[test]
    fn test_transient_error_schedules_single_restart() {
        let mut controller = listening();
        let (error, commands) = controller.on_error("network");
        assert!(error.is_recoverable());
        assert_eq!(commands, vec![RecognizerCommand::ScheduleRestart(DEFAULT_RETRY_DELAY)]);

        // The recognizer ends right after the error; the timer owns the restart.
        assert!(controller.on_end().is_empty());
        assert!(controller.on_error("no-speech").1.is_empty());

        assert_eq!(controller.on_restart_due(), vec![RecognizerCommand::Start]);
        assert!(controller.on_restart_due().is_empty());
        assert!(controller.is_listening());
    }

    #[test]
    fn test_stop_cancels_pending_restart() {
        let mut controller = listening();
        controller.on_error("network");
        assert_eq!(controller.stop(), vec![RecognizerCommand::CancelRestart, RecognizerCommand::Stop]);
        assert!(controller.on_restart_due().is_empty());
        assert!(controller.stop().is_empty());
    }

    #[test]
    fn test_fatal_error_halts() {
        let mut controller = listening();
        let (error, commands) = controller.on_error("audio-capture");
        assert_eq!(error, ReadingError::RecognitionFatal { code: "audio-capture".to_string() });
        assert!(commands.is_empty());
        assert_eq!(controller.phase(), RecognitionPhase::Idle);
        assert!(controller.on_end().is_empty());
    }

    #[test]
    fn test_complete_is_terminal_until_reset() {
        let mut controller = listening();
        assert_eq!(controller.complete(), vec![RecognizerCommand::Stop]);
        assert_eq!(controller.phase(), RecognitionPhase::Completed);
        assert!(controller.on_end().is_empty());

        assert!(controller.reset().is_empty());
        assert_eq!(controller.phase(), RecognitionPhase::Idle);
    }
}
