//! Activate the player's special skill before any movement.

use anyhow::Result;

use crate::report::{Indent, RunLog};
use crate::session::Session;
use crate::tasks::{InterruptFlag, Task, TaskAbort};

/// One atomic remote call; cannot be meaningfully canceled mid-flight.
pub struct ActivateSpecialSkillTask {
    interrupted: InterruptFlag,
}

impl ActivateSpecialSkillTask {
    pub fn new() -> Self {
        Self {
            interrupted: InterruptFlag::new(),
        }
    }
}

impl Default for ActivateSpecialSkillTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for ActivateSpecialSkillTask {
    fn start(&mut self, session: &dyn Session, log: &dyn RunLog) -> Result<()> {
        log.info("Activating special skill...", Indent::Top);
        if session.activate_special_ability()? {
            log.info("Activated special skill.", Indent::First);
            Ok(())
        } else {
            log.error("Failed to activate special skill.", Indent::First);
            Err(TaskAbort.into())
        }
    }

    fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupted.clone()
    }
}
