//! The per-session arbitration state machine.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::arbiter::events::{Decision, SessionCommand, Utterance};
use crate::classifier::{Classification, UtteranceClassifier};
use crate::config::ArbiterConfig;
use crate::error::Result;

/// Whether synthesized speech is currently audible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// The agent is silent.
    Idle,
    /// The agent's synthesized speech is playing.
    Speaking,
}

/// Candidate-interruption latch.
///
/// Armed only while playback is audible; cleared when an utterance resolves
/// it, when the resume timeout fires, or when playback finishes with the
/// latch still set (a race that never resolved).
#[derive(Debug, Clone, Copy, Default)]
struct InterruptLatch {
    armed_at: Option<Instant>,
}

impl InterruptLatch {
    fn arm(&mut self, now: Instant) {
        if self.armed_at.is_none() {
            self.armed_at = Some(now);
        }
    }

    fn clear(&mut self) {
        self.armed_at = None;
    }

    fn is_pending(&self) -> bool {
        self.armed_at.is_some()
    }

    fn armed_at(&self) -> Option<Instant> {
        self.armed_at
    }
}

/// Result of arbitrating one utterance (or one timer expiry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The verdict.
    pub decision: Decision,
    /// At most one command toward the speech-session runtime.
    pub command: Option<SessionCommand>,
}

/// The arbitration state machine for a single session.
///
/// Total over (state, event): every pair has a defined transition and no
/// transition can fail, so per-event processing never errors. All state is
/// owned here — nothing is shared across sessions.
pub struct ArbiterPolicy {
    playback: PlaybackState,
    latch: InterruptLatch,
    classifier: UtteranceClassifier,
    resume_timeout: Duration,
}

impl ArbiterPolicy {
    /// Build a policy from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid (empty or
    /// overlapping word lists, zero timeout).
    pub fn new(config: &ArbiterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            playback: PlaybackState::Idle,
            latch: InterruptLatch::default(),
            classifier: UtteranceClassifier::new(config),
            resume_timeout: Duration::from_millis(config.false_interruption_timeout_ms),
        })
    }

    /// Current playback state.
    pub fn playback_state(&self) -> PlaybackState {
        self.playback
    }

    /// Whether a candidate interruption is latched, awaiting a transcript.
    pub fn latch_pending(&self) -> bool {
        self.latch.is_pending()
    }

    /// Deadline at which an unresolved candidate becomes a false positive.
    ///
    /// `None` when no candidate is latched.
    pub fn resume_deadline(&self) -> Option<Instant> {
        self.latch.armed_at().map(|t| t + self.resume_timeout)
    }

    /// Playback became audible. Idempotent.
    pub fn on_playback_started(&mut self) {
        if self.playback == PlaybackState::Speaking {
            debug!("playback start while already speaking (ignored)");
            return;
        }
        self.playback = PlaybackState::Speaking;
        debug!("playback started");
    }

    /// Playback stopped through the normal (non-interrupted) path. Idempotent.
    pub fn on_playback_finished(&mut self) {
        if self.playback == PlaybackState::Idle {
            debug!("playback finish while already idle (ignored)");
            return;
        }
        self.playback = PlaybackState::Idle;
        if self.latch.is_pending() {
            // Stale latch: the candidate never resolved before playback ended.
            self.latch.clear();
            debug!("cleared stale interrupt latch on playback finish");
        }
        debug!("playback finished");
    }

    /// A candidate interruption signal arrived.
    ///
    /// Arms the latch only while speech is audible — an interruption while
    /// the agent is silent is meaningless. Returns `true` when the latch was
    /// newly armed (the caller should start the resume timer).
    pub fn on_interruption_candidate(&mut self, now: Instant) -> bool {
        if self.playback != PlaybackState::Speaking {
            debug!("interruption candidate while idle (ignored)");
            return false;
        }
        if self.latch.is_pending() {
            // First candidate wins; the resume timer keeps its deadline.
            debug!("interruption candidate while latch armed (ignored)");
            return false;
        }
        self.latch.arm(now);
        info!("interruption candidate latched, awaiting transcript");
        true
    }

    /// A finalized utterance arrived — arbitrate it.
    pub fn on_utterance_final(&mut self, utterance: &Utterance) -> Outcome {
        match (self.playback, self.latch.is_pending()) {
            // Agent silent: nothing to arbitrate against, forward as a
            // normal conversational turn. No classification needed.
            (PlaybackState::Idle, _) => {
                debug!("forwarding utterance (agent silent)");
                Outcome {
                    decision: Decision::Forward,
                    command: Some(SessionCommand::ForwardUserMessage(utterance.text.clone())),
                }
            }

            // Agent speaking, no candidate latched: background speech that
            // VAD never flagged as an interruption attempt. Discard.
            (PlaybackState::Speaking, false) => {
                info!(text = %utterance.text, "suppressing utterance during playback (no candidate latched)");
                Outcome {
                    decision: Decision::Suppress,
                    command: None,
                }
            }

            // Agent speaking with a latched candidate: classify and decide.
            (PlaybackState::Speaking, true) => {
                self.latch.clear();
                match self.classifier.classify(&utterance.text) {
                    Classification::Command => {
                        info!("command interruption accepted");
                        Outcome {
                            decision: Decision::Interrupt,
                            command: Some(SessionCommand::StopPlayback),
                        }
                    }
                    Classification::Filler => {
                        info!("passive acknowledgement ignored, playback continues");
                        Outcome {
                            decision: Decision::Resume,
                            command: None,
                        }
                    }
                    // Fail open: unrecognized input is treated as a genuine
                    // interruption. The utterance is not forwarded.
                    Classification::Content => {
                        info!("unrecognized input treated as interruption");
                        Outcome {
                            decision: Decision::Interrupt,
                            command: Some(SessionCommand::StopPlayback),
                        }
                    }
                }
            }
        }
    }

    /// The resume timer fired: the latched candidate never produced a
    /// transcript. Clear the latch and leave playback running.
    pub fn on_resume_timeout(&mut self) -> Outcome {
        self.latch.clear();
        info!("interruption candidate timed out, resuming playback");
        Outcome {
            decision: Decision::Resume,
            command: None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn policy() -> ArbiterPolicy {
        ArbiterPolicy::new(&ArbiterConfig::default()).expect("default config is valid")
    }

    fn utterance(text: &str) -> Utterance {
        Utterance {
            text: text.to_owned(),
            finalized_at: Instant::now(),
        }
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let config = ArbiterConfig {
            command_words: Vec::new(),
            ..Default::default()
        };
        assert!(ArbiterPolicy::new(&config).is_err());
    }

    #[test]
    fn idle_utterance_forwards_regardless_of_content() {
        let mut p = policy();
        for text in ["hello", "stop", "yeah"] {
            let outcome = p.on_utterance_final(&utterance(text));
            assert_eq!(outcome.decision, Decision::Forward);
            assert_eq!(
                outcome.command,
                Some(SessionCommand::ForwardUserMessage(text.to_owned()))
            );
        }
    }

    #[test]
    fn candidate_while_idle_is_a_no_op() {
        let mut p = policy();
        assert!(!p.on_interruption_candidate(Instant::now()));
        assert!(!p.latch_pending());
        assert!(p.resume_deadline().is_none());
    }

    #[test]
    fn candidate_while_speaking_arms_latch() {
        let mut p = policy();
        p.on_playback_started();
        assert!(p.on_interruption_candidate(Instant::now()));
        assert!(p.latch_pending());
        assert!(p.resume_deadline().is_some());
    }

    #[test]
    fn repeated_candidate_keeps_first_deadline() {
        let mut p = policy();
        p.on_playback_started();
        let first = Instant::now();
        assert!(p.on_interruption_candidate(first));
        let deadline = p.resume_deadline();
        assert!(!p.on_interruption_candidate(first + Duration::from_millis(200)));
        assert_eq!(p.resume_deadline(), deadline);
    }

    #[test]
    fn speaking_without_latch_suppresses() {
        let mut p = policy();
        p.on_playback_started();
        let outcome = p.on_utterance_final(&utterance("what time is the meeting"));
        assert_eq!(outcome.decision, Decision::Suppress);
        assert!(outcome.command.is_none());
    }

    #[test]
    fn filler_with_latch_resumes_and_clears() {
        let mut p = policy();
        p.on_playback_started();
        p.on_interruption_candidate(Instant::now());
        let outcome = p.on_utterance_final(&utterance("yeah"));
        assert_eq!(outcome.decision, Decision::Resume);
        assert!(outcome.command.is_none());
        assert!(!p.latch_pending());
    }

    #[test]
    fn command_with_latch_interrupts_and_stops_playback() {
        let mut p = policy();
        p.on_playback_started();
        p.on_interruption_candidate(Instant::now());
        let outcome = p.on_utterance_final(&utterance("stop"));
        assert_eq!(outcome.decision, Decision::Interrupt);
        assert_eq!(outcome.command, Some(SessionCommand::StopPlayback));
        assert!(!p.latch_pending());
    }

    #[test]
    fn content_with_latch_fails_open_to_interrupt() {
        let mut p = policy();
        p.on_playback_started();
        p.on_interruption_candidate(Instant::now());
        let outcome = p.on_utterance_final(&utterance("what time is the meeting"));
        assert_eq!(outcome.decision, Decision::Interrupt);
        assert_eq!(outcome.command, Some(SessionCommand::StopPlayback));
    }

    #[test]
    fn content_interrupt_does_not_forward_the_utterance() {
        let mut p = policy();
        p.on_playback_started();
        p.on_interruption_candidate(Instant::now());
        let outcome = p.on_utterance_final(&utterance("tell me about rust"));
        assert!(!matches!(
            outcome.command,
            Some(SessionCommand::ForwardUserMessage(_))
        ));
    }

    #[test]
    fn playback_events_are_idempotent() {
        let mut p = policy();
        p.on_playback_started();
        p.on_playback_started();
        assert_eq!(p.playback_state(), PlaybackState::Speaking);
        p.on_playback_finished();
        p.on_playback_finished();
        assert_eq!(p.playback_state(), PlaybackState::Idle);
    }

    #[test]
    fn stale_latch_cleared_on_playback_finish() {
        let mut p = policy();
        p.on_playback_started();
        p.on_interruption_candidate(Instant::now());
        assert!(p.latch_pending());
        p.on_playback_finished();
        assert!(!p.latch_pending());
        assert!(p.resume_deadline().is_none());
    }

    #[test]
    fn resume_timeout_clears_latch_without_command() {
        let mut p = policy();
        p.on_playback_started();
        p.on_interruption_candidate(Instant::now());
        let outcome = p.on_resume_timeout();
        assert_eq!(outcome.decision, Decision::Resume);
        assert!(outcome.command.is_none());
        assert!(!p.latch_pending());
    }

    #[test]
    fn empty_utterance_with_latch_resumes() {
        let mut p = policy();
        p.on_playback_started();
        p.on_interruption_candidate(Instant::now());
        let outcome = p.on_utterance_final(&utterance(""));
        assert_eq!(outcome.decision, Decision::Resume);
        assert!(outcome.command.is_none());
    }
}
