//! Application configuration and CLI argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::voices::{self, DEFAULT_PREFERRED_VOICES, DEFAULT_VOICE_KEYWORDS, VoicePreferences};
use crate::matching::MatchConfig;
use crate::session::SessionSettings;
use crate::tts::SpeechSettings;

/// How session snapshots are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One human-readable line per event (default)
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Reading coach configuration.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "reading-coach")]
#[command(author, version, about = "A reading-practice coach driven by speech recognition events", long_about = None)]
pub struct AppConfig {
    /// List the read-aloud voice preference order and exit
    #[arg(long)]
    pub list_voice_preferences: bool,

    /// Host event script (JSON lines); reads stdin when omitted
    #[arg(long, short = 's', env = "READING_COACH_SCRIPT")]
    pub script: Option<PathBuf>,

    /// Text to load before the script starts
    #[arg(long, short = 't', conflicts_with = "text_file")]
    pub text: Option<String>,

    /// File whose contents are loaded before the script starts
    #[arg(long)]
    pub text_file: Option<PathBuf>,

    /// Start listening right after the initial text is loaded
    #[arg(long)]
    pub auto_start: bool,

    /// Similarity threshold for interim recognition results (0.0 - 1.0)
    #[arg(long, default_value = "0.35", value_parser = parse_unit_interval)]
    pub interim_threshold: f64,

    /// Similarity threshold for final recognition results (0.0 - 1.0)
    #[arg(long, default_value = "0.6", value_parser = parse_unit_interval)]
    pub final_threshold: f64,

    /// How many expected words may be skipped when a later word is spoken
    #[arg(long, default_value = "1")]
    pub max_skip: usize,

    /// Delay in milliseconds before restarting the recognizer after a network or no-speech error
    #[arg(long, default_value = "1000")]
    pub retry_delay_ms: u64,

    /// Treat the host as having no speech recognizer
    #[arg(long)]
    pub no_recognizer: bool,

    /// Read-aloud language tag
    #[arg(long, default_value = "en-US")]
    pub lang: String,

    /// Read-aloud speech rate (0.1 - 10.0, 0.9 is a natural reading pace)
    #[arg(long, default_value = "0.9")]
    pub speech_rate: f32,

    /// Read-aloud pitch (0.0 - 2.0)
    #[arg(long, default_value = "1.0")]
    pub speech_pitch: f32,

    /// Read-aloud volume (0.0 - 1.0)
    #[arg(long, default_value = "1.0")]
    pub speech_volume: f32,

    /// Preferred read-aloud voice name fragment, best first (repeatable)
    #[arg(long = "preferred-voice", default_values_t = DEFAULT_PREFERRED_VOICES.iter().map(|s| s.to_string()).collect::<Vec<_>>())]
    pub preferred_voices: Vec<String>,

    /// Fallback keyword for read-aloud voice names (repeatable)
    #[arg(long = "voice-keyword", default_values_t = DEFAULT_VOICE_KEYWORDS.iter().map(|s| s.to_string()).collect::<Vec<_>>())]
    pub voice_keywords: Vec<String>,

    /// Output format for session snapshots
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl AppConfig {
    /// Parse configuration from command line arguments.
    pub fn from_args() -> Self {
        let config = Self::parse();

        if config.list_voice_preferences {
            voices::print_preferences(&config.voice_preferences());
            std::process::exit(0);
        }

        config
    }

    /// Matcher tuning derived from the thresholds and skip limit.
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig { interim_threshold: self.interim_threshold, final_threshold: self.final_threshold, max_skip: self.max_skip }
    }

    /// Read-aloud voice parameters.
    pub fn speech_settings(&self) -> SpeechSettings {
        SpeechSettings { lang: self.lang.clone(), rate: self.speech_rate, pitch: self.speech_pitch, volume: self.speech_volume }
    }

    /// Read-aloud voice preferences.
    pub fn voice_preferences(&self) -> VoicePreferences {
        VoicePreferences { preferred: self.preferred_voices.clone(), keywords: self.voice_keywords.clone() }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Everything the session needs.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            matching: self.match_config(),
            retry_delay: self.retry_delay(),
            speech: self.speech_settings(),
            voices: self.voice_preferences(),
            recognition_available: !self.no_recognizer,
        }
    }

    /// Initial text from `--text` or `--text-file`, if any.
    pub fn initial_text(&self) -> Result<Option<String>> {
        if let Some(ref text) = self.text {
            return Ok(Some(text.clone()));
        }
        match self.text_file {
            Some(ref path) => {
                let text = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Failed to read text file {}: {}", path.display(), e))?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref path) = self.script
            && !path.exists()
        {
            anyhow::bail!("Script file not found: {}", path.display());
        }

        if let Some(ref path) = self.text_file
            && !path.exists()
        {
            anyhow::bail!("Text file not found: {}", path.display());
        }

        if self.auto_start && self.text.is_none() && self.text_file.is_none() {
            anyhow::bail!("--auto-start needs --text or --text-file");
        }

        if self.interim_threshold > self.final_threshold {
            anyhow::bail!("Interim threshold must not exceed the final threshold");
        }

        if !(0.1..=10.0).contains(&self.speech_rate) {
            anyhow::bail!("Speech rate must be between 0.1 and 10.0");
        }

        if !(0.0..=2.0).contains(&self.speech_pitch) {
            anyhow::bail!("Speech pitch must be between 0.0 and 2.0");
        }

        if !(0.0..=1.0).contains(&self.speech_volume) {
            anyhow::bail!("Speech volume must be between 0.0 and 1.0");
        }

        Ok(())
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        match self.script {
            Some(ref path) => info!("  Script: {}", path.display()),
            None => info!("  Script: stdin"),
        }
        info!("  Interim threshold: {}", self.interim_threshold);
        info!("  Final threshold: {}", self.final_threshold);
        info!("  Max skip: {}", self.max_skip);
        info!("  Retry delay: {}ms", self.retry_delay_ms);
        info!("  Recognizer: {}", if self.no_recognizer { "unavailable" } else { "available" });
        info!("  Speech: {} rate={} pitch={} volume={}", self.lang, self.speech_rate, self.speech_pitch, self.speech_volume);
        info!("  Preferred voices: {}", self.preferred_voices.len());
        info!("  Output: {}", self.output);
    }
}

/// Parse and validate a value in `[0.0, 1.0]`.
fn parse_unit_interval(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a valid float", s))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("value must be between 0.0 and 1.0, got {}", value))
    }
}
