//! Voice preferences for reading text aloud.
//!
//! Installed synthesis voices depend on the platform, so the choice is driven
//! by an ordered list of preferred voice names plus fallback keywords, both
//! overridable from the command line.

use serde::{Deserialize, Serialize};

/// High-quality English voices, best first. Matched as substrings of the
/// installed voice names.
pub const DEFAULT_PREFERRED_VOICES: &[&str] = &[
    "Google US English",
    "Google UK English Female",
    "Microsoft Aria Online (Natural)",
    "Microsoft Jenny Online (Natural)",
    "Samantha",
    "Siri",
    "Microsoft Zira Desktop",
    "Google UK English",
    "Victoria",
    "Karen",
    "Fiona",
];

/// Lowercase fragments identifying acceptable fallback voices.
pub const DEFAULT_VOICE_KEYWORDS: &[&str] = &["female", "siri", "samantha", "zira", "victoria", "karen", "susan", "fiona", "linda"];

/// Ordered voice preference list with a keyword fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicePreferences {
    pub preferred: Vec<String>, // Voice name fragments, best first
    pub keywords: Vec<String>,  // Lowercase fallback fragments
}

impl Default for VoicePreferences {
    fn default() -> Self {
        Self {
            preferred: DEFAULT_PREFERRED_VOICES.iter().map(|s| s.to_string()).collect(),
            keywords: DEFAULT_VOICE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl VoicePreferences {
    /// Pick a voice among the installed ones.
    ///
    /// Tries each preferred name in order, then any voice whose name contains
    /// a fallback keyword, then the first installed voice.
    ///
    /// # Returns
    /// The chosen voice name, or `None` when no voice is installed.
    pub fn select<'a>(&self, installed: &'a [String]) -> Option<&'a str> {
        let preferred = self.preferred.iter().find_map(|pref| installed.iter().find(|voice| voice.contains(pref.as_str())));
        if let Some(voice) = preferred {
            return Some(voice.as_str());
        }

        let fallback = installed.iter().find(|voice| {
            let name = voice.to_lowercase();
            self.keywords.iter().any(|keyword| name.contains(&keyword.to_lowercase()))
        });

        fallback.or_else(|| installed.first()).map(String::as_str)
    }
}

/// Print the voice preference order.
pub fn print_preferences(preferences: &VoicePreferences) {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  Read-aloud voice preferences");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();
    println!("{:<4} PREFERRED VOICE", "#");
    println!("{}", "─".repeat(50));
    for (i, name) in preferences.preferred.iter().enumerate() {
        println!("{:<4} {}", i + 1, name);
    }
    println!();
    println!("Fallback keywords: {}", preferences.keywords.join(", "));
    println!();
    println!("Usage:");
    println!("  ./reading-coach --preferred-voice \"Samantha\" --preferred-voice \"Karen\"");
    println!("  ./reading-coach --voice-keyword female");
}
