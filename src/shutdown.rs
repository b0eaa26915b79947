//! Signal-driven shutdown.
//!
//! SIGINT and SIGTERM never run daemon code from an asynchronous handler.
//! The listener task only raises a [`ShutdownSignal`]; the scheduler checks
//! it at the start of each tick, during the idle wait and between EC poll
//! iterations, and then walks the release path on its own thread of control.

use crate::errors::Result;
use log::info;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Exit status used after a signal-triggered shutdown
pub const SHUTDOWN_EXIT_CODE: i32 = 1;

/// Why the daemon is stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReason {
    pub signal: i32,
}

impl ShutdownReason {
    pub fn from_signal(signal: i32) -> Self {
        Self { signal }
    }

    /// Notice printed to the console before resources are released
    pub fn notice(&self) -> String {
        format!("shutting down on signal {:02} ...", self.signal)
    }
}

/// Cloneable cooperative cancellation flag
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<Option<ShutdownReason>>>,
    rx: watch::Receiver<Option<ShutdownReason>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Raise the flag. The first reason wins; later triggers are ignored.
    pub fn trigger(&self, reason: ShutdownReason) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.rx.borrow()
    }

    pub fn is_triggered(&self) -> bool {
        self.reason().is_some()
    }

    /// Resolve once the flag has been raised
    pub async fn triggered(&self) -> ShutdownReason {
        let mut rx = self.rx.clone();
        loop {
            if let Some(reason) = *rx.borrow_and_update() {
                return reason;
            }
            if rx.changed().await.is_err() {
                // The sender lives as long as `self`, so this never resolves
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Register SIGINT/SIGTERM handlers and spawn the task that raises `shutdown`.
///
/// Handlers are registered before this returns, so a signal delivered right
/// after startup is not lost. Must be called from inside the tokio runtime.
pub fn install_signal_handlers(shutdown: ShutdownSignal) -> Result<JoinHandle<()>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        let signo = tokio::select! {
            _ = interrupt.recv() => libc::SIGINT,
            _ = terminate.recv() => libc::SIGTERM,
        };
        info!("Received signal {}", signo);
        shutdown.trigger(ShutdownReason::from_signal(signo));
    }))
}
