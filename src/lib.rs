//! Talkover: interrupt arbitration for real-time voice agents.
//!
//! When a user speaks while the agent's synthesized speech is playing, the
//! runtime has to choose: stop talking, keep going, or ignore the noise.
//! This crate implements that choice as a small, embeddable decision engine:
//!
//! - **Playback tracking**: playback started/finished events drive a
//!   per-session [`arbiter::PlaybackState`]
//! - **Candidate latching**: a low-confidence interruption signal arms a
//!   latch, but only while speech is audible
//! - **Classification**: the finalized transcript is classified as a hard
//!   command, a filler acknowledgement, or real content
//! - **Arbitration**: the policy emits at most one command per utterance —
//!   stop playback, forward the message, or nothing
//!
//! A latched candidate that never produces a transcript times out and is
//! treated as a false positive, leaving playback running.
//!
//! Each speech session gets one [`ArbiterSession`] task fed by a single
//! serialized event queue, so arbitration state never observes interleaved
//! updates and concurrent sessions are fully independent.

pub mod arbiter;
pub mod classifier;
pub mod config;
pub mod error;

pub use arbiter::{ArbiterSession, Decision, SessionCommand, SessionHandle};
pub use classifier::{Classification, UtteranceClassifier};
pub use config::ArbiterConfig;
pub use error::{ArbiterError, Result};
