//! Test-only scripted collaborators: run log, session and session factory.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};

use crate::config::MoveType;
use crate::report::{Indent, RunLog};
use crate::session::{Frame, OpenRequest, Session, SessionFactory};

/// Severity channel of a recorded report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Info,
    Error,
    UnknownError,
}

/// One recorded report line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub kind: LogKind,
    pub message: String,
    pub indent: Indent,
}

/// Run log capturing entries for order and content assertions.
#[derive(Debug, Default)]
pub struct RecordingLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("log entries").clone()
    }

    /// All info and error messages, in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.kind != LogKind::UnknownError)
            .map(|e| e.message)
            .collect()
    }

    pub fn contains_info(&self, message: &str) -> bool {
        self.entries()
            .iter()
            .any(|e| e.kind == LogKind::Info && e.message == message)
    }

    pub fn contains_error(&self, message: &str) -> bool {
        self.entries()
            .iter()
            .any(|e| e.kind == LogKind::Error && e.message == message)
    }

    pub fn has_unknown_error(&self) -> bool {
        self.entries()
            .iter()
            .any(|e| e.kind == LogKind::UnknownError)
    }

    fn push(&self, kind: LogKind, message: String, indent: Indent) {
        self.entries
            .lock()
            .expect("log entries")
            .push(LogEntry {
                kind,
                message,
                indent,
            });
    }
}

impl RunLog for RecordingLog {
    fn info(&self, message: &str, indent: Indent) {
        self.push(LogKind::Info, message.to_string(), indent);
    }

    fn error(&self, message: &str, indent: Indent) {
        self.push(LogKind::Error, message.to_string(), indent);
    }

    fn unknown_error(&self, err: &anyhow::Error) {
        self.push(LogKind::UnknownError, format!("{err:#}"), Indent::Top);
    }
}

#[derive(Debug)]
struct SessionState {
    status_text: String,
    items: Vec<String>,
    activated_items: Vec<String>,
    activate_item_ok: bool,
    special_ability_ok: bool,
    anchors: Vec<String>,
    clicked_anchors: Vec<String>,
    move_requests: Vec<(i32, i32)>,
    /// Remaining `has_active_movement() == true` polls for the current move.
    active_polls: usize,
    /// Polls budgeted for each new move request.
    polls_per_move: usize,
    endless_movement: bool,
    /// Per-move results consumed by `last_movement_succeeded`; falls back to
    /// `movement_succeeds` when empty.
    movement_results: VecDeque<bool>,
    movement_succeeds: bool,
    movement_canceled: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status_text: String::new(),
            items: Vec::new(),
            activated_items: Vec::new(),
            activate_item_ok: true,
            special_ability_ok: true,
            anchors: Vec::new(),
            clicked_anchors: Vec::new(),
            move_requests: Vec::new(),
            active_polls: 0,
            polls_per_move: 1,
            endless_movement: false,
            movement_results: VecDeque::new(),
            movement_succeeds: true,
            movement_canceled: false,
        }
    }
}

/// Scripted [`Session`]: behavior configured up front, calls recorded for
/// assertions. Clones share state, so tests keep a probe handle while the
/// session itself moves into the routine.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSession {
    state: Arc<Mutex<SessionState>>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status_text(&self, status: &str) {
        self.state.lock().expect("session state").status_text = status.to_string();
    }

    pub fn add_item(&self, name: &str) {
        self.state
            .lock()
            .expect("session state")
            .items
            .push(name.to_string());
    }

    pub fn set_activate_item_ok(&self, ok: bool) {
        self.state.lock().expect("session state").activate_item_ok = ok;
    }

    pub fn set_special_ability_ok(&self, ok: bool) {
        self.state.lock().expect("session state").special_ability_ok = ok;
    }

    pub fn add_anchor(&self, text: &str) {
        self.state
            .lock()
            .expect("session state")
            .anchors
            .push(text.to_string());
    }

    /// How many polls each movement stays active before completing.
    pub fn set_movement_polls(&self, polls: usize) {
        self.state.lock().expect("session state").polls_per_move = polls;
    }

    /// Movement never completes; only cancellation ends it.
    pub fn set_endless_movement(&self) {
        self.state.lock().expect("session state").endless_movement = true;
    }

    /// Default outcome of every movement.
    pub fn set_movement_succeeds(&self, ok: bool) {
        self.state.lock().expect("session state").movement_succeeds = ok;
    }

    /// Outcome for the next movement only; later moves use the default.
    pub fn queue_movement_result(&self, ok: bool) {
        self.state
            .lock()
            .expect("session state")
            .movement_results
            .push_back(ok);
    }

    pub fn activated_items(&self) -> Vec<String> {
        self.state.lock().expect("session state").activated_items.clone()
    }

    pub fn clicked_anchors(&self) -> Vec<String> {
        self.state.lock().expect("session state").clicked_anchors.clone()
    }

    pub fn move_requests(&self) -> Vec<(i32, i32)> {
        self.state.lock().expect("session state").move_requests.clone()
    }

    pub fn movement_canceled(&self) -> bool {
        self.state.lock().expect("session state").movement_canceled
    }

    /// Block until the session has seen a movement request. Panics on
    /// timeout so a hung test fails with a clear message.
    pub fn wait_for_move_request(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while self.move_requests().is_empty() {
            assert!(Instant::now() < deadline, "no movement request observed");
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Session for ScriptedSession {
    fn move_to(&self, x: i32, y: i32, _allowed: &[MoveType]) -> Result<()> {
        let mut state = self.state.lock().expect("session state");
        state.move_requests.push((x, y));
        state.active_polls = if state.endless_movement {
            usize::MAX
        } else {
            state.polls_per_move
        };
        Ok(())
    }

    fn has_active_movement(&self) -> Result<bool> {
        let mut state = self.state.lock().expect("session state");
        if state.active_polls == 0 {
            return Ok(false);
        }
        if !state.endless_movement {
            state.active_polls -= 1;
        }
        Ok(true)
    }

    fn cancel_movement(&self) -> Result<()> {
        let mut state = self.state.lock().expect("session state");
        state.movement_canceled = true;
        state.active_polls = 0;
        Ok(())
    }

    fn last_movement_succeeded(&self) -> Result<bool> {
        let mut state = self.state.lock().expect("session state");
        let result = state
            .movement_results
            .pop_front()
            .unwrap_or(state.movement_succeeds);
        Ok(result)
    }

    fn status_text(&self) -> Result<String> {
        Ok(self.state.lock().expect("session state").status_text.clone())
    }

    fn has_item(&self, name: &str) -> Result<bool> {
        let state = self.state.lock().expect("session state");
        Ok(state.items.iter().any(|item| item == name))
    }

    fn activate_item(&self, name: &str) -> Result<bool> {
        let mut state = self.state.lock().expect("session state");
        state.activated_items.push(name.to_string());
        Ok(state.activate_item_ok)
    }

    fn activate_special_ability(&self) -> Result<bool> {
        Ok(self.state.lock().expect("session state").special_ability_ok)
    }

    fn click_anchor_by_text(&self, _frame: Frame, text: &str) -> Result<bool> {
        let mut state = self.state.lock().expect("session state");
        state.clicked_anchors.push(text.to_string());
        Ok(state.anchors.iter().any(|anchor| anchor == text))
    }
}

/// Lifecycle calls observed by a [`ScriptedFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryEvent {
    Open,
    Close { forceful: bool },
    Shutdown { forceful: bool },
}

/// Scripted [`SessionFactory`] handing out one prepared session.
pub struct ScriptedFactory {
    session: Option<ScriptedSession>,
    open_error: Option<String>,
    events: Arc<Mutex<Vec<FactoryEvent>>>,
}

impl ScriptedFactory {
    pub fn new(session: ScriptedSession) -> Self {
        Self {
            session: Some(session),
            open_error: None,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Factory whose `open` fails with the given message.
    pub fn failing_open(message: &str) -> Self {
        Self {
            session: None,
            open_error: Some(message.to_string()),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared lifecycle event list; keep a clone to assert teardown order.
    pub fn events(&self) -> Arc<Mutex<Vec<FactoryEvent>>> {
        Arc::clone(&self.events)
    }

    fn record(&self, event: FactoryEvent) {
        self.events.lock().expect("factory events").push(event);
    }
}

impl SessionFactory for ScriptedFactory {
    type Session = ScriptedSession;

    fn open(&mut self, _request: &OpenRequest) -> Result<Self::Session> {
        self.record(FactoryEvent::Open);
        if let Some(message) = &self.open_error {
            return Err(anyhow!("{message}"));
        }
        self.session
            .take()
            .ok_or_else(|| anyhow!("scripted factory already opened its session"))
    }

    fn close(&mut self, _session: Self::Session, forceful: bool) {
        self.record(FactoryEvent::Close { forceful });
    }

    fn shutdown(&mut self, forceful: bool) {
        self.record(FactoryEvent::Shutdown { forceful });
    }
}
