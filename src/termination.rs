//! Deciding when sampling stops.
//!
//! [`Termination`] is a one-way `RUNNING -> STOPPED` switch with two
//! independent triggers: the input stream running out, and an interrupt from
//! the operating system. Whichever fires first wins; later triggers are no-ops.
//! Every waiter is released, including ones that start waiting after the
//! switch flipped.

use std::fmt;
use std::future;
use std::io;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// The interrupt that stopped sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptSignal {
    /// SIGINT (Ctrl+C)
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for InterruptSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterruptSignal::Interrupt => write!(f, "SIGINT"),
            InterruptSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Why sampling stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The input reached end-of-stream.
    InputExhausted,
    /// Reading the input failed; treated like end-of-stream.
    InputFailed,
    Interrupted(InterruptSignal),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::InputExhausted => write!(f, "input exhausted"),
            StopReason::InputFailed => write!(f, "input read failed"),
            StopReason::Interrupted(signal) => write!(f, "interrupted by {signal}"),
        }
    }
}

/// Shared single-fire stop signal.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Debug, Clone)]
pub struct Termination {
    state: Arc<watch::Sender<Option<StopReason>>>,
}

impl Termination {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            state: Arc::new(sender),
        }
    }

    /// Move to `STOPPED` with `reason`.
    ///
    /// Returns `true` if this call performed the transition, `false` if
    /// sampling had already stopped (the first reason is kept).
    pub fn trigger(&self, reason: StopReason) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(reason);
            true
        })
    }

    pub fn is_stopped(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// The reason recorded by the first trigger, if any.
    pub fn reason(&self) -> Option<StopReason> {
        *self.state.borrow()
    }

    /// Wait until sampling has stopped and return why.
    ///
    /// Resolves immediately if it already has.
    pub async fn stopped(&self) -> StopReason {
        let mut receiver = self.state.subscribe();
        // `wait_for` only errors once the sender is gone, and `self` holds it.
        let reason = receiver
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|state| *state);
        match reason {
            Some(reason) => reason,
            None => future::pending().await,
        }
    }
}

impl Default for Termination {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for SIGINT or SIGTERM.
#[cfg(unix)]
pub async fn interrupt_signal() -> io::Result<InterruptSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => Ok(InterruptSignal::Interrupt),
        _ = sigterm.recv() => Ok(InterruptSignal::Terminate),
    }
}

/// Wait for Ctrl+C.
#[cfg(not(unix))]
pub async fn interrupt_signal() -> io::Result<InterruptSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(InterruptSignal::Interrupt)
}

/// Trigger `termination` when the process is interrupted.
///
/// If the signal handlers cannot be installed, the error is logged and only
/// the input can stop sampling.
pub fn spawn_interrupt_listener(termination: Termination) -> JoinHandle<()> {
    tokio::spawn(async move {
        match interrupt_signal().await {
            Ok(signal) => {
                warn!(%signal, "got signal, stopping");
                termination.trigger(StopReason::Interrupted(signal));
            }
            Err(err) => error!(%err, "failed to install interrupt handler"),
        }
    })
}
