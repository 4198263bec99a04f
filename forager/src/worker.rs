//! Dedicated worker thread driving a routine run.
//!
//! Decouples scheduling from the orchestrator: [`crate::routine::Routine`]
//! is a plain object, this module owns the thread. The handle's `wait` is a
//! bounded join used by callers for UI responsiveness after a stop request;
//! it is not a cancellation guarantee, since cancellation stays cooperative.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::routine::{Routine, RoutineControl};
use crate::session::SessionFactory;

/// Handle to a routine run executing on its own thread.
pub struct RoutineHandle {
    control: RoutineControl,
    done: mpsc::Receiver<()>,
    thread: Option<thread::JoinHandle<()>>,
}

/// Run the routine on a dedicated worker thread.
pub fn spawn<F>(routine: Routine<F>) -> Result<RoutineHandle>
where
    F: SessionFactory + Send + 'static,
    F::Session: 'static,
{
    let control = routine.control();
    let (done_tx, done_rx) = mpsc::channel();
    let thread = thread::Builder::new()
        .name("forager-routine".to_string())
        .spawn(move || {
            routine.run();
            // Receiver may be gone when the caller dropped the handle.
            let _ = done_tx.send(());
        })
        .context("spawn routine worker thread")?;
    Ok(RoutineHandle {
        control,
        done: done_rx,
        thread: Some(thread),
    })
}

impl RoutineHandle {
    /// Request the run to stop; forwarded to the currently executing
    /// sub-task. Idempotent and callable from any thread.
    pub fn request_stop(&self) {
        debug!("stop requested");
        self.control.request_stop();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.control.is_stop_requested()
    }

    /// Wait up to `timeout` for the run to end. Returns whether it ended.
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.done.recv_timeout(timeout) {
            Ok(()) => true,
            // Worker gone means the run is over either way.
            Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    /// Block until the worker thread exits.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
