//! Interrupt arbitration: the policy state machine and its per-session
//! event loop.
//!
//! [`policy::ArbiterPolicy`] is the synchronous core — a total state machine
//! over playback state and the candidate latch. [`session::ArbiterSession`]
//! wraps one policy in a tokio task fed by a serialized event queue and owns
//! the resume-timeout deadline.

pub mod events;
pub mod policy;
pub mod session;

pub use events::{ArbiterNotice, Decision, SessionCommand, SessionEvent, Utterance};
pub use policy::{ArbiterPolicy, Outcome, PlaybackState};
pub use session::{ArbiterSession, SessionHandle};
