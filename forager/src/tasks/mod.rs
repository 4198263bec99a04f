//! Interruptible units of work executed by the routine pipeline.
//!
//! A task runs synchronously on the worker thread and fails in one of two
//! ways: a recognized condition raises [`TaskAbort`] (abort this step, the
//! orchestrator decides whether the pipeline continues), while any other
//! error propagates untouched and is reported as unknown. Cancellation is
//! cooperative: `interrupt` sets a flag the task checks at its polling
//! points; nothing is stopped forcibly.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use crate::report::RunLog;
use crate::session::Session;

mod collect;
mod protection;
mod special_skill;

pub use collect::CollectResourceTask;
pub use protection::EnsureProtectionTask;
pub use special_skill::ActivateSpecialSkillTask;

/// Recognized failure signal: abort the current step without crashing the run.
///
/// Carries no payload; the reason is logged at the point of detection.
/// Recognized via `err.downcast_ref::<TaskAbort>()` (see [`is_abort`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskAbort;

impl fmt::Display for TaskAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("task aborted")
    }
}

impl std::error::Error for TaskAbort {}

/// Whether the error is the recognized abort signal rather than a crash.
pub fn is_abort(err: &anyhow::Error) -> bool {
    err.downcast_ref::<TaskAbort>().is_some()
}

/// Shared cooperative interruption flag.
///
/// Cloned handles observe the same flag, so the orchestrator can forward a
/// stop request from another thread to the task currently executing. Once
/// set, the flag is never cleared within a run.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cooperative interruption. Idempotent.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A unit of work in the routine pipeline.
pub trait Task {
    /// Perform the unit of work synchronously on the calling thread.
    ///
    /// Returns `Ok(())` on success, [`TaskAbort`] (through `anyhow`) on a
    /// recognized failure, and any other error on a crash.
    fn start(&mut self, session: &dyn Session, log: &dyn RunLog) -> Result<()>;

    /// Handle to this task's interruption flag, used by the orchestrator to
    /// forward stop requests across threads.
    fn interrupt_flag(&self) -> InterruptFlag;

    /// Set the interrupted flag, observed cooperatively by `start`.
    fn interrupt(&self) {
        self.interrupt_flag().interrupt();
    }

    /// Whether the interrupted flag is set.
    fn is_interrupted(&self) -> bool {
        self.interrupt_flag().is_interrupted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_signal_survives_anyhow_roundtrip() {
        let err = anyhow::Error::from(TaskAbort);
        assert!(is_abort(&err));
        assert!(!is_abort(&anyhow::anyhow!("transport broke")));
    }

    #[test]
    fn interrupt_flag_is_shared_and_sticky() {
        let flag = InterruptFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_interrupted());
        handle.interrupt();
        handle.interrupt();
        assert!(flag.is_interrupted());
    }
}
