//! Session snapshot output.
//!
//! Writes one snapshot per handled event to stdout, as a readable line or as
//! JSON. Logs go to stderr, so stdout stays machine-readable in JSON mode.

use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;

use crate::config::OutputFormat;
use crate::matching::render::to_text_line;
use crate::matching::ProgressEvent;
use crate::session::{Effect, SessionView};

#[derive(Serialize)]
struct Snapshot<'a> {
    view: &'a SessionView,
    effects: &'a [Effect],
}

/// Short human-readable form of an effect.
pub fn describe(effect: &Effect) -> String {
    match effect {
        Effect::StartRecognizer => "start recognizer".to_string(),
        Effect::StopRecognizer => "stop recognizer".to_string(),
        Effect::ScheduleRestart { delay_ms } => format!("restart recognizer in {}ms", delay_ms),
        Effect::CancelRestart => "cancel recognizer restart".to_string(),
        Effect::Speak { utterance } => {
            format!("speak {} chars with {}", utterance.text.chars().count(), utterance.voice.as_deref().unwrap_or("default voice"))
        }
        Effect::CancelSpeech => "cancel speech".to_string(),
        Effect::Progress { event } => match event {
            ProgressEvent::NoOp => "no-op".to_string(),
            ProgressEvent::Pending { at_index, .. } => format!("waiting for word {}", at_index),
            ProgressEvent::Advance { resolved_index, .. } => format!("read word {}", resolved_index),
            ProgressEvent::SkipAdvance { skipped_index, matched_index, .. } => {
                format!("read {} words, skipping {}..{}", event.advanced_words(), skipped_index, matched_index)
            }
            ProgressEvent::Completed => "completed".to_string(),
        },
        Effect::Notify { message, .. } => format!("notify: {}", message),
    }
}

/// Writes session snapshots in the configured format.
pub struct Printer {
    format: OutputFormat,
}

impl Printer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a snapshot into a string (without trailing newline).
    pub fn render(&self, view: &SessionView, effects: &[Effect]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string(&Snapshot { view, effects })?),
            OutputFormat::Text => {
                let mut out = format!("{:>3}% {:<10} {}", view.progress, format!("{:?}", view.phase).to_lowercase(), to_text_line(&view.words));
                for effect in effects {
                    out.push_str(&format!("\n     -> {}", describe(effect)));
                }
                out.push_str(&format!("\n     status: {}", view.status));
                if !view.recognized_text.is_empty() {
                    out.push_str(&format!("\n     heard: {}", view.recognized_text));
                }
                Ok(out)
            }
        }
    }

    /// Write a snapshot to stdout.
    pub fn print(&self, view: &SessionView, effects: &[Effect]) -> Result<()> {
        let rendered = self.render(view, effects)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", rendered)?;
        stdout.flush()?;
        Ok(())
    }
}
