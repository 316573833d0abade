//! Utterance classification against configured word lists.

use std::collections::HashSet;

use crate::config::ArbiterConfig;

/// How a finalized utterance should be read while the agent is speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A hard command ("stop", "wait") — always a genuine interruption.
    Command,
    /// A passive acknowledgement ("yeah", "uh-huh") — not an interruption.
    Filler,
    /// Anything else. Arbitration fails open and treats it as an interruption.
    Content,
}

/// Classifies finalized utterances into command / filler / content.
///
/// Pure and deterministic: the same text always classifies the same way.
/// Matching is case-insensitive and token-based, with leading/trailing
/// punctuation stripped so STT formatting ("Stop!", "yeah,") doesn't break
/// comparisons.
#[derive(Debug, Clone)]
pub struct UtteranceClassifier {
    command_words: HashSet<String>,
    filler_words: HashSet<String>,
}

impl UtteranceClassifier {
    /// Build a classifier from the configured word lists.
    pub fn new(config: &ArbiterConfig) -> Self {
        Self {
            command_words: config
                .command_words
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
            filler_words: config
                .filler_words
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
        }
    }

    /// Classify a finalized utterance.
    ///
    /// A zero-token utterance classifies as [`Classification::Filler`]: an
    /// empty transcript carries no content to arbitrate against.
    pub fn classify(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split_whitespace()
            .map(clean_token)
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.iter().any(|t| self.command_words.contains(*t)) {
            return Classification::Command;
        }

        if tokens.iter().all(|t| self.filler_words.contains(*t)) {
            return Classification::Filler;
        }

        Classification::Content
    }
}

/// Strip leading/trailing punctuation from a token, keeping `-` and `'`
/// so words like "uh-huh" survive intact.
fn clean_token(token: &str) -> &str {
    token.trim_matches(|c: char| c.is_ascii_punctuation() && c != '-' && c != '\'')
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn classifier() -> UtteranceClassifier {
        UtteranceClassifier::new(&ArbiterConfig::default())
    }

    #[test]
    fn command_word_classifies_as_command() {
        assert_eq!(classifier().classify("stop"), Classification::Command);
        assert_eq!(
            classifier().classify("wait a second"),
            Classification::Command
        );
    }

    #[test]
    fn command_matching_is_case_insensitive() {
        assert_eq!(classifier().classify("STOP"), Classification::Command);
        assert_eq!(classifier().classify("No, wait"), Classification::Command);
    }

    #[test]
    fn command_word_inside_another_word_does_not_match() {
        // "no" must not match inside "know".
        assert_eq!(
            classifier().classify("i know that place"),
            Classification::Content
        );
    }

    #[test]
    fn punctuation_is_stripped_before_matching() {
        assert_eq!(classifier().classify("Stop!"), Classification::Command);
        assert_eq!(classifier().classify("yeah."), Classification::Filler);
    }

    #[test]
    fn all_filler_tokens_classify_as_filler() {
        assert_eq!(classifier().classify("yeah"), Classification::Filler);
        assert_eq!(classifier().classify("ok right"), Classification::Filler);
        assert_eq!(classifier().classify("uh-huh"), Classification::Filler);
    }

    #[test]
    fn mixed_filler_and_content_classifies_as_content() {
        assert_eq!(
            classifier().classify("yeah but actually"),
            Classification::Content
        );
    }

    #[test]
    fn unrecognized_text_classifies_as_content() {
        assert_eq!(
            classifier().classify("what time is the meeting"),
            Classification::Content
        );
    }

    #[test]
    fn empty_utterance_classifies_as_filler() {
        assert_eq!(classifier().classify(""), Classification::Filler);
        assert_eq!(classifier().classify("   "), Classification::Filler);
    }

    #[test]
    fn command_beats_filler_in_mixed_utterance() {
        assert_eq!(classifier().classify("yeah no"), Classification::Command);
    }
}
