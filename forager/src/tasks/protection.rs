//! Ensure the player is protected before any movement.

use anyhow::Result;
use tracing::debug;

use crate::report::{Indent, RunLog};
use crate::session::Session;
use crate::tasks::{InterruptFlag, Task, TaskAbort};

/// Marker in the status text while a protection is active.
const PROTECTION_STATUS_MARKER: &str = "Schutz";

/// Activates the given protection item unless a protection is already active.
///
/// Single synchronous round-trips, no polling, so there is no suspension
/// point to check the interrupted flag at.
pub struct EnsureProtectionTask {
    item_name: String,
    interrupted: InterruptFlag,
}

impl EnsureProtectionTask {
    pub fn new(item_name: impl Into<String>) -> Self {
        Self {
            item_name: item_name.into(),
            interrupted: InterruptFlag::new(),
        }
    }
}

impl Task for EnsureProtectionTask {
    fn start(&mut self, session: &dyn Session, log: &dyn RunLog) -> Result<()> {
        log.info("Ensuring protection...", Indent::Top);

        let status = session.status_text()?;
        if status.contains(PROTECTION_STATUS_MARKER) {
            log.info("Protection is already active.", Indent::First);
            return Ok(());
        }

        debug!(item = %self.item_name, "activating protection item");
        if session.has_item(&self.item_name)? && session.activate_item(&self.item_name)? {
            log.info("Activated protection spell.", Indent::First);
            Ok(())
        } else {
            log.error("Protection spell not found.", Indent::First);
            Err(TaskAbort.into())
        }
    }

    fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupted.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::is_abort;
    use crate::test_support::{RecordingLog, ScriptedSession};

    #[test]
    fn succeeds_when_protection_already_active() {
        let session = ScriptedSession::new();
        session.set_status_text("Krank, Schutz");
        let log = RecordingLog::new();

        let mut task = EnsureProtectionTask::new("protection scroll");
        task.start(&session, &log).expect("start");

        assert!(log.contains_info("Protection is already active."));
        // No inventory round-trip when the status already shows protection.
        assert!(session.activated_items().is_empty());
    }

    #[test]
    fn activates_item_when_not_protected() {
        let session = ScriptedSession::new();
        session.add_item("protection scroll");
        let log = RecordingLog::new();

        let mut task = EnsureProtectionTask::new("protection scroll");
        task.start(&session, &log).expect("start");

        assert_eq!(session.activated_items(), vec!["protection scroll"]);
        assert!(log.contains_info("Activated protection spell."));
    }

    #[test]
    fn aborts_when_item_present_but_activation_fails() {
        let session = ScriptedSession::new();
        session.add_item("protection scroll");
        session.set_activate_item_ok(false);
        let log = RecordingLog::new();

        let mut task = EnsureProtectionTask::new("protection scroll");
        let err = task.start(&session, &log).unwrap_err();

        assert!(is_abort(&err));
        // Activation was attempted before the failure was reported.
        assert_eq!(session.activated_items(), vec!["protection scroll"]);
        assert!(log.contains_error("Protection spell not found."));
    }

    #[test]
    fn aborts_when_item_missing() {
        let session = ScriptedSession::new();
        let log = RecordingLog::new();

        let mut task = EnsureProtectionTask::new("protection scroll");
        let err = task.start(&session, &log).unwrap_err();

        assert!(is_abort(&err));
        assert!(log.contains_error("Protection spell not found."));
    }
}
