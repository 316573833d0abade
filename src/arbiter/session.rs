//! Serialized per-session event loop.
//!
//! Each speech session gets one [`ArbiterSession`] task. All inbound events
//! funnel through a single queue and are applied to the policy in arrival
//! order, so playback state, latch, and timer never observe interleaved
//! updates. The resume-timeout deadline is polled by the same loop that
//! processes events, which makes cancel-before-fire structural: clearing the
//! latch drops the deadline before the next poll.

use std::time::Instant;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::arbiter::events::{ArbiterNotice, SessionCommand, SessionEvent, Utterance};
use crate::arbiter::policy::ArbiterPolicy;
use crate::config::ArbiterConfig;
use crate::error::Result;

/// Buffer size for the best-effort notice broadcast.
const NOTICE_CHANNEL_SIZE: usize = 32;

/// Handle for delivering events into a running arbitration session.
///
/// Cloneable; all clones feed the same serialized queue. Events sent after
/// shutdown are ignored and logged, never errors.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Synthesized speech became audible.
    pub fn playback_started(&self) {
        self.dispatch(SessionEvent::PlaybackStarted);
    }

    /// Synthesized speech stopped.
    pub fn playback_finished(&self) {
        self.dispatch(SessionEvent::PlaybackFinished);
    }

    /// A low-confidence interruption signal fired.
    pub fn interruption_candidate(&self) {
        self.dispatch(SessionEvent::InterruptionCandidate);
    }

    /// A finalized user transcript arrived.
    pub fn utterance_finalized(&self, text: impl Into<String>) {
        self.dispatch(SessionEvent::UtteranceFinalized(Utterance {
            text: text.into(),
            finalized_at: Instant::now(),
        }));
    }

    /// Request graceful shutdown of the session task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn dispatch(&self, event: SessionEvent) {
        if self.cancel.is_cancelled() || self.event_tx.send(event).is_err() {
            // Late event for a torn-down session.
            warn!("event dropped: session already shut down");
        }
    }
}

/// A single arbitration session bound to one speech session.
///
/// Sessions are fully independent: all arbitration state lives inside the
/// spawned task, so concurrent sessions cannot interfere.
pub struct ArbiterSession {
    handle: SessionHandle,
    task: JoinHandle<()>,
    notice_tx: broadcast::Sender<ArbiterNotice>,
}

impl ArbiterSession {
    /// Spawn the session task. Outbound commands are emitted on `cmd_tx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn spawn(
        config: ArbiterConfig,
        cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    ) -> Result<Self> {
        let policy = ArbiterPolicy::new(&config)?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (notice_tx, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_session_loop(
            policy,
            event_rx,
            cmd_tx,
            notice_tx.clone(),
            cancel.clone(),
        ));

        Ok(Self {
            handle: SessionHandle { event_tx, cancel },
            task,
            notice_tx,
        })
    }

    /// Get a handle for delivering events into this session.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Subscribe to observability notices (best-effort; slow readers may lag).
    pub fn notices(&self) -> broadcast::Receiver<ArbiterNotice> {
        self.notice_tx.subscribe()
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.handle.shutdown();
    }

    /// Wait for the session task to finish after shutdown.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

async fn run_session_loop(
    mut policy: ArbiterPolicy,
    mut event_rx: mpsc::UnboundedReceiver<SessionEvent>,
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    notice_tx: broadcast::Sender<ArbiterNotice>,
    cancel: CancellationToken,
) {
    info!("arbitration session started");

    loop {
        // Snapshot the deadline before building the future so the select
        // arms below can borrow the policy mutably.
        let resume_deadline = policy.resume_deadline();
        let resume_fut = async move {
            match resume_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            () = cancel.cancelled() => break,
            () = resume_fut => {
                let _ = policy.on_resume_timeout();
                let _ = notice_tx.send(ArbiterNotice::LatchExpired);
            }
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    SessionEvent::PlaybackStarted => policy.on_playback_started(),
                    SessionEvent::PlaybackFinished => policy.on_playback_finished(),
                    SessionEvent::InterruptionCandidate => {
                        if policy.on_interruption_candidate(Instant::now()) {
                            let _ = notice_tx.send(ArbiterNotice::LatchArmed);
                        }
                    }
                    SessionEvent::UtteranceFinalized(utterance) => {
                        let outcome = policy.on_utterance_final(&utterance);
                        if let Some(cmd) = outcome.command {
                            if cmd_tx.send(cmd).is_err() {
                                // Embedder dropped the command channel; keep
                                // arbitrating so session state stays consistent.
                                warn!("command channel closed, dropping command");
                            }
                        }
                        let _ = notice_tx.send(ArbiterNotice::DecisionMade {
                            decision: outcome.decision,
                            text: utterance.text,
                        });
                    }
                }
            }
        }
    }

    info!("arbitration session stopped");
}
