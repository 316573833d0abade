//! Configuration types for the arbitration engine.

use serde::{Deserialize, Serialize};

use crate::error::{ArbiterError, Result};

/// Configuration for one arbitration session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Words that always interrupt playback when heard mid-speech
    /// (case-insensitive, single tokens).
    pub command_words: Vec<String>,
    /// Passive acknowledgement words that never interrupt playback
    /// (case-insensitive, single tokens).
    ///
    /// An utterance made up entirely of these words lets playback continue.
    pub filler_words: Vec<String>,
    /// How long to wait (ms) for a finalized utterance after an interruption
    /// candidate before treating the candidate as a false positive and
    /// leaving playback running.
    pub false_interruption_timeout_ms: u64,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            command_words: vec![
                "stop".to_owned(),
                "wait".to_owned(),
                "cancel".to_owned(),
                "no".to_owned(),
            ],
            filler_words: vec![
                "yeah".to_owned(),
                "ok".to_owned(),
                "okay".to_owned(),
                "hmm".to_owned(),
                "uh-huh".to_owned(),
                "right".to_owned(),
            ],
            false_interruption_timeout_ms: 1_000,
        }
    }
}

impl ArbiterConfig {
    /// Check that the configuration can drive a session.
    ///
    /// # Errors
    ///
    /// Returns an error if either word list is empty, contains a blank or
    /// multi-word entry, or overlaps the other list, or if the timeout is
    /// zero.
    pub fn validate(&self) -> Result<()> {
        if self.command_words.is_empty() {
            return Err(ArbiterError::Config("command word list is empty".into()));
        }
        if self.filler_words.is_empty() {
            return Err(ArbiterError::Config("filler word list is empty".into()));
        }
        if self.false_interruption_timeout_ms == 0 {
            return Err(ArbiterError::Config(
                "false_interruption_timeout_ms must be non-zero".into(),
            ));
        }

        for word in self.command_words.iter().chain(&self.filler_words) {
            if word.trim().is_empty() {
                return Err(ArbiterError::Config("word list contains a blank entry".into()));
            }
            if word.split_whitespace().count() > 1 {
                return Err(ArbiterError::Config(format!(
                    "word list entries must be single tokens: {word:?}"
                )));
            }
        }

        // A word in both lists would make classification ambiguous.
        for cmd in &self.command_words {
            let cmd_lower = cmd.to_lowercase();
            if self
                .filler_words
                .iter()
                .any(|f| f.to_lowercase() == cmd_lower)
            {
                return Err(ArbiterError::Config(format!(
                    "word appears in both command and filler lists: {cmd:?}"
                )));
            }
        }

        Ok(())
    }

    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ArbiterError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ArbiterError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
