//! Configuration module for the reading coach.
//!
//! Provides CLI argument parsing and configuration management.

#[allow(clippy::module_inception)]
mod config;
mod voices;

pub use config::{AppConfig, OutputFormat};
pub use voices::VoicePreferences;
