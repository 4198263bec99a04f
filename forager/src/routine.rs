//! The routine orchestrator: a fixed pipeline of interruptible sub-tasks.
//!
//! One [`Routine`] drives one run: open the session, optionally ensure
//! protection, optionally activate the special skill, then visit the
//! configured destinations in [`ResourceTask::ALL`] order. A recognized
//! failure ([`TaskAbort`]) inside a resource collection aborts only that
//! resource; anywhere else it stops the pipeline. Unknown errors always stop
//! the pipeline and are reported with diagnostic detail. Teardown (logout,
//! driver shutdown) and the completion callback run exactly once on every
//! exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, info};

use crate::config::{ResourceTask, RoutineConfig};
use crate::report::{Indent, RunLog};
use crate::session::{OpenRequest, SessionFactory};
use crate::tasks::{
    ActivateSpecialSkillTask, CollectResourceTask, EnsureProtectionTask, InterruptFlag, Task,
    TaskAbort, is_abort,
};

/// Concurrency surface of a running routine.
///
/// Cloneable and usable from any thread while the worker executes the
/// pipeline. The current-task slot is mutex-guarded so a concurrent stop
/// request always forwards interruption to the task that is actually
/// executing, never to a torn read.
#[derive(Clone, Default)]
pub struct RoutineControl {
    stop: Arc<AtomicBool>,
    current: Arc<Mutex<Option<InterruptFlag>>>,
}

impl RoutineControl {
    /// Request the run to stop and forward interruption to the current
    /// sub-task. Idempotent; safe to call concurrently with the worker.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        let slot = self.current.lock().expect("current task slot poisoned");
        if let Some(flag) = slot.as_ref() {
            flag.interrupt();
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Register the given task's flag as the current interruption target.
    ///
    /// A stop requested before registration is forwarded immediately, so a
    /// task never starts unaware of an earlier stop.
    fn register(&self, flag: InterruptFlag) {
        let mut slot = self.current.lock().expect("current task slot poisoned");
        if self.is_stop_requested() {
            flag.interrupt();
        }
        *slot = Some(flag);
    }

    /// Drop the current interruption target; late stop requests become
    /// flag-only.
    fn clear(&self) {
        let mut slot = self.current.lock().expect("current task slot poisoned");
        *slot = None;
    }
}

/// One run of the routine pipeline.
///
/// Plain data and behavior; scheduling belongs to the caller. Production
/// code drives it through [`crate::worker::spawn`], tests may call
/// [`Routine::run`] synchronously.
pub struct Routine<F: SessionFactory> {
    config: RoutineConfig,
    factory: F,
    log: Arc<dyn RunLog>,
    control: RoutineControl,
    poll_interval: Option<Duration>,
    on_finished: Option<Box<dyn FnOnce() + Send>>,
    session: Option<F::Session>,
}

impl<F: SessionFactory> Routine<F> {
    pub fn new(config: RoutineConfig, factory: F, log: Arc<dyn RunLog>) -> Self {
        Self {
            config,
            factory,
            log,
            control: RoutineControl::default(),
            poll_interval: None,
            on_finished: None,
            session: None,
        }
    }

    /// Callback invoked exactly once when the run ends, after teardown,
    /// regardless of outcome.
    pub fn on_finished(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_finished = Some(Box::new(callback));
        self
    }

    /// Override the movement poll interval for every collection task.
    /// Tests shorten it.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Handle for stop requests; grab it before handing the routine to a
    /// worker thread.
    pub fn control(&self) -> RoutineControl {
        self.control.clone()
    }

    /// Execute the pipeline to completion on the calling thread.
    ///
    /// Never panics out of a failure: recognized aborts end the run quietly
    /// (their reason was logged at the point of detection), unknown errors
    /// are reported, and teardown plus the completion callback run in every
    /// case.
    pub fn run(mut self) {
        let result = self.execute();
        self.teardown();
        match result {
            Ok(()) => info!("routine finished"),
            Err(err) if is_abort(&err) => {
                if self.control.is_stop_requested() {
                    self.log.info("Routine stopped.", Indent::Top);
                }
            }
            Err(err) => self.log.unknown_error(&err),
        }
        if let Some(callback) = self.on_finished.take() {
            callback();
        }
    }

    fn execute(&mut self) -> Result<()> {
        // Login and create the session.
        self.log.info("Creating session...", Indent::Top);
        if self.config.credentials.is_blank() {
            self.log.error("Invalid username or password.", Indent::First);
            return Err(TaskAbort.into());
        }
        let request = OpenRequest {
            credentials: self.config.credentials.clone(),
            world: self.config.world,
            browser: self.config.browser.clone(),
        };
        // Visible while a slow driver start keeps `open` busy.
        self.log.info("Starting driver...", Indent::First);
        let session = self.factory.open(&request)?;
        self.session = Some(session);
        self.log.info("Session created.", Indent::First);

        // Ensure protection if desired.
        if let Some(item) = self.config.protection_item.clone() {
            let mut task = EnsureProtectionTask::new(item);
            self.register_and_start(&mut task)?;
        }

        // Activate the special skill if desired.
        if self.config.use_special_skill {
            let mut task = ActivateSpecialSkillTask::new();
            self.register_and_start(&mut task)?;
        }

        // Collect resources in the fixed declared order, never in
        // configuration-insertion order.
        for resource in ResourceTask::ALL {
            if self.config.resources.contains(&resource) {
                self.collect_resource(resource)?;
            }
        }
        Ok(())
    }

    /// Attempt one resource collection; its recognized failure aborts only
    /// this resource. A stop request observed afterwards leaves the loop.
    fn collect_resource(&mut self, resource: ResourceTask) -> Result<()> {
        debug!(?resource, "starting collection");
        let mut task = CollectResourceTask::new(resource.destination(), &self.config.movement);
        if let Some(interval) = self.poll_interval {
            task = task.with_poll_interval(interval);
        }
        match self.register_and_start(&mut task) {
            Ok(()) => {}
            // Recognized failure of this resource only; continue with the next.
            Err(err) if is_abort(&err) => {}
            Err(err) => return Err(err),
        }
        if self.control.is_stop_requested() {
            return Err(TaskAbort.into());
        }
        Ok(())
    }

    /// Register the task as current, then run it on this thread.
    fn register_and_start(&mut self, task: &mut dyn Task) -> Result<()> {
        self.control.register(task.interrupt_flag());
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| anyhow!("sub-task started without an open session"))?;
        task.start(session, self.log.as_ref())
    }

    /// Log out and shut down the driver. `self.session` is taken, so a
    /// second invocation would be a no-op on the session.
    fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            self.factory.close(session, false);
        }
        self.factory.shutdown(false);
        self.control.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::{Credentials, MoveType, World};
    use crate::session::BrowserSettings;
    use crate::test_support::{FactoryEvent, RecordingLog, ScriptedFactory, ScriptedSession};

    fn config(resources: &[ResourceTask]) -> RoutineConfig {
        RoutineConfig {
            credentials: Credentials {
                username: "user".to_string(),
                password: "secret".to_string(),
            },
            world: World(5),
            browser: BrowserSettings::default(),
            movement: vec![MoveType::Walk],
            protection_item: None,
            use_special_skill: false,
            resources: resources.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn routine(
        config: RoutineConfig,
        factory: ScriptedFactory,
        log: &Arc<RecordingLog>,
    ) -> Routine<ScriptedFactory> {
        Routine::new(config, factory, Arc::clone(log) as Arc<dyn RunLog>)
            .with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn blank_credentials_abort_before_opening_a_session() {
        let factory = ScriptedFactory::new(ScriptedSession::new());
        let events = factory.events();
        let log = Arc::new(RecordingLog::new());
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&finished);

        let mut cfg = config(&[ResourceTask::OilBarrel]);
        cfg.credentials.username = String::new();
        routine(cfg, factory, &log)
            .on_finished(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .run();

        assert!(log.contains_error("Invalid username or password."));
        // Rejected before any driver work was announced.
        assert!(!log.contains_info("Starting driver..."));
        assert!(!log.has_unknown_error());
        // No session was opened; teardown still shuts the driver down once.
        assert_eq!(
            events.lock().expect("events").as_slice(),
            &[FactoryEvent::Shutdown { forceful: false }]
        );
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        // No movement was attempted.
        assert!(!log.messages().iter().any(|m| m.starts_with("Moving to")));
    }

    #[test]
    fn resources_run_in_declared_order_not_configured_order() {
        let session = ScriptedSession::new();
        session.add_anchor("Getreide mitnehmen");
        session.add_anchor("Ölfässer mitnehmen");
        session.add_anchor("Sumpfgasflaschen mitnehmen");
        let factory = ScriptedFactory::new(session);
        let log = Arc::new(RecordingLog::new());

        // Configured "backwards"; the BTreeSet plus the ALL filter fixes the order.
        let cfg = config(&[
            ResourceTask::OilBarrel,
            ResourceTask::MarshGas,
            ResourceTask::BaruCorn,
        ]);
        routine(cfg, factory, &log).run();

        let moves: Vec<String> = log
            .messages()
            .into_iter()
            .filter(|m| m.starts_with("Moving to"))
            .collect();
        assert_eq!(
            moves,
            vec![
                "Moving to corn storehouse...",
                "Moving to gas storehouse...",
                "Moving to oil storehouse...",
            ]
        );
    }

    #[test]
    fn failed_collection_does_not_stop_later_resources() {
        let session = ScriptedSession::new();
        // First movement fails, second succeeds.
        session.queue_movement_result(false);
        session.add_anchor("Fische mitnehmen");
        let factory = ScriptedFactory::new(session);
        let log = Arc::new(RecordingLog::new());

        let cfg = config(&[ResourceTask::BaruCorn, ResourceTask::GlodoFish]);
        routine(cfg, factory, &log).run();

        assert!(log.contains_error("Movement was aborted."));
        assert!(log.contains_info("Collected glodo fish."));
        assert!(!log.contains_info("Collecting baru corn..."));
        assert!(!log.has_unknown_error());
    }

    #[test]
    fn protection_failure_stops_the_whole_pipeline() {
        let session = ScriptedSession::new();
        session.add_anchor("Getreide mitnehmen");
        let factory = ScriptedFactory::new(session);
        let events = factory.events();
        let log = Arc::new(RecordingLog::new());

        let mut cfg = config(&[ResourceTask::BaruCorn]);
        cfg.protection_item = Some("protection scroll".to_string());
        routine(cfg, factory, &log).run();

        assert!(log.contains_error("Protection spell not found."));
        assert!(!log.messages().iter().any(|m| m.starts_with("Moving to")));
        // Teardown still ran: logout then shutdown.
        assert_eq!(
            events.lock().expect("events").as_slice(),
            &[
                FactoryEvent::Open,
                FactoryEvent::Close { forceful: false },
                FactoryEvent::Shutdown { forceful: false },
            ]
        );
    }

    #[test]
    fn unknown_open_error_is_reported_and_torn_down() {
        let factory = ScriptedFactory::failing_open("driver exploded");
        let events = factory.events();
        let log = Arc::new(RecordingLog::new());

        routine(config(&[ResourceTask::BaruCorn]), factory, &log).run();

        // The driver-start line is reported before `open`, so the operator
        // sees it even when opening fails or hangs.
        assert!(log.contains_info("Starting driver..."));
        assert!(log.has_unknown_error());
        assert_eq!(
            events.lock().expect("events").as_slice(),
            &[
                FactoryEvent::Open,
                FactoryEvent::Shutdown { forceful: false },
            ]
        );
    }

    #[test]
    fn stop_requested_between_resources_ends_the_run_quietly() {
        let session = ScriptedSession::new();
        session.add_anchor("Getreide mitnehmen");
        let factory = ScriptedFactory::new(session);
        let log = Arc::new(RecordingLog::new());

        let cfg = config(&[ResourceTask::BaruCorn, ResourceTask::GlodoFish]);
        let routine = routine(cfg, factory, &log);
        let control = routine.control();
        // Stop already requested when the first collection starts; the
        // pre-registered interrupt makes the poll loop abort, and the
        // post-resource check ends the run.
        control.request_stop();
        routine.run();

        assert!(log.contains_info("Routine stopped."));
        assert!(!log.has_unknown_error());
        assert!(!log.contains_info("Moving to fish storehouse..."));
    }
}
