//! Move to a destination and collect its resource.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::config::{Destination, MoveType};
use crate::report::{Indent, RunLog};
use crate::session::{Frame, Session};
use crate::tasks::{InterruptFlag, Task, TaskAbort};

/// Interval between checks for movement completion.
const MOVEMENT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Moves the session to a destination and collects a resource by clicking
/// the destination's anchor.
///
/// The movement poll loop is the only suspension point in the whole engine;
/// the interrupted flag is checked on every iteration, not only at loop
/// entry, so a stop request is honored within one interval.
pub struct CollectResourceTask {
    destination: Destination,
    allowed_moves: Vec<MoveType>,
    poll_interval: Duration,
    interrupted: InterruptFlag,
}

impl CollectResourceTask {
    pub fn new(destination: Destination, allowed_moves: &[MoveType]) -> Self {
        Self {
            destination,
            allowed_moves: allowed_moves.to_vec(),
            poll_interval: MOVEMENT_POLL_INTERVAL,
            interrupted: InterruptFlag::new(),
        }
    }

    /// Override the movement poll interval. Tests shorten it.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sleep-then-poll until the session reports no active movement task.
    ///
    /// On interruption the in-flight movement is canceled at the session
    /// before aborting, so the remote side does not keep walking.
    fn await_arrival(&self, session: &dyn Session, log: &dyn RunLog) -> Result<()> {
        while session.has_active_movement()? {
            thread::sleep(self.poll_interval);
            if self.is_interrupted() {
                session.cancel_movement()?;
                log.info("Movement canceled.", Indent::First);
                return Err(TaskAbort.into());
            }
        }
        Ok(())
    }
}

impl Task for CollectResourceTask {
    fn start(&mut self, session: &dyn Session, log: &dyn RunLog) -> Result<()> {
        // Move to the destination.
        log.info(
            &format!("Moving to {}...", self.destination.name),
            Indent::Top,
        );
        debug!(x = self.destination.x, y = self.destination.y, "requesting movement");
        session.move_to(self.destination.x, self.destination.y, &self.allowed_moves)?;
        self.await_arrival(session, log)?;
        if !session.last_movement_succeeded()? {
            log.error("Movement was aborted.", Indent::First);
            return Err(TaskAbort.into());
        }
        log.info(
            &format!("Arrival at {}.", self.destination.name),
            Indent::First,
        );

        // Collect the resource.
        log.info(
            &format!("Collecting {}...", self.destination.resource_name),
            Indent::Top,
        );
        if !session.click_anchor_by_text(Frame::Main, self.destination.anchor_text)? {
            log.error("Collection anchor not found.", Indent::First);
            return Err(TaskAbort.into());
        }
        log.info(
            &format!("Collected {}.", self.destination.resource_name),
            Indent::First,
        );
        Ok(())
    }

    fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupted.clone()
    }
}
