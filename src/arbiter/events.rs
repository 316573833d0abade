//! Message types exchanged between an arbitration session and its embedder.

use std::time::Instant;

/// A complete, committed transcript of one user turn.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// The transcribed text.
    pub text: String,
    /// When the transcript was finalized.
    pub finalized_at: Instant,
}

/// Inbound events from the speech-session runtime.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Synthesized speech became audible.
    PlaybackStarted,
    /// Synthesized speech stopped (normal end of playback).
    PlaybackFinished,
    /// Low-confidence signal that the user may be trying to interrupt
    /// (e.g. VAD fired while the agent was speaking).
    InterruptionCandidate,
    /// A finalized user transcript arrived.
    UtteranceFinalized(Utterance),
}

/// Outbound commands issued to the speech-session runtime.
///
/// Commands are fire-and-forget: the runtime may reject one (nothing is
/// playing) and that is its silent no-op, not an arbitration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Stop synthesized speech immediately.
    StopPlayback,
    /// Forward the text as a new user message.
    ForwardUserMessage(String),
}

/// Per-utterance arbitration verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Agent was silent — forward the utterance as a normal turn.
    Forward,
    /// Agent was speaking with no candidate latched — discard the utterance.
    Suppress,
    /// False interruption — leave playback running.
    Resume,
    /// Genuine interruption — stop playback.
    Interrupt,
}

/// Observability notices broadcast by a session (best-effort, may lag).
#[derive(Debug, Clone)]
pub enum ArbiterNotice {
    /// An interruption candidate was latched, awaiting a transcript.
    LatchArmed,
    /// A latched candidate timed out without a transcript and was
    /// treated as a false positive.
    LatchExpired,
    /// An utterance was arbitrated.
    DecisionMade {
        /// The verdict for this utterance.
        decision: Decision,
        /// The utterance text.
        text: String,
    },
}
