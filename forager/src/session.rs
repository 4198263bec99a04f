//! Trait boundary to the remote game environment.
//!
//! The [`SessionFactory`] owns the driver handle and hands out at most one
//! [`Session`] per run. Sub-tasks borrow the session for the duration of
//! their `start` call and never close it; the orchestrator is the only owner
//! and tears it down on every exit path. The live implementation (browser
//! driver, HTTP, DOM) lives outside this crate; tests use the scripted
//! implementations in [`crate::test_support`].

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::{Credentials, MoveType, World};

/// Browser the remote driver should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Firefox,
    Chrome,
    Edge,
}

/// Driver selection and local paths for starting the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub browser: Browser,
    /// Path to the driver executable for the selected browser.
    pub driver_path: Option<PathBuf>,
    /// Path to the browser binary, when not on the search path.
    pub binary_path: Option<PathBuf>,
    /// Path to the user profile to load.
    pub profile_path: Option<PathBuf>,
}

/// Frame of the remote view an anchor lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Main,
    Menu,
    Item,
}

/// Everything the factory needs to start a driver and log in.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub credentials: Credentials,
    pub world: World,
    pub browser: BrowserSettings,
}

/// Live handle to the remote environment.
///
/// All calls are synchronous round-trips; any of them may fail with a
/// transport error, which the orchestrator treats as unknown.
pub trait Session: Send {
    /// Request movement to the given coordinate using the allowed modes.
    ///
    /// Returns once the movement task is queued; completion is observed via
    /// [`Session::has_active_movement`].
    fn move_to(&self, x: i32, y: i32, allowed: &[MoveType]) -> Result<()>;

    /// Whether a movement task is still in flight.
    fn has_active_movement(&self) -> Result<bool>;

    /// Cancel the in-flight movement task, if any.
    fn cancel_movement(&self) -> Result<()>;

    /// Whether the last finished movement task reached its destination.
    fn last_movement_succeeded(&self) -> Result<bool>;

    /// Current status text of the player.
    fn status_text(&self) -> Result<String>;

    /// Whether the inventory contains an item with the given name.
    fn has_item(&self, name: &str) -> Result<bool>;

    /// Activate the named inventory item. Returns whether activation took effect.
    fn activate_item(&self, name: &str) -> Result<bool>;

    /// Activate the player's special ability. Returns whether it took effect.
    fn activate_special_ability(&self) -> Result<bool>;

    /// Click the anchor with the given text in the given frame.
    /// Returns whether such an anchor was found and clicked.
    fn click_anchor_by_text(&self, frame: Frame, text: &str) -> Result<bool>;
}

/// Creates and destroys remote sessions.
///
/// `close` and `shutdown` are infallible by contract: teardown must always
/// run to completion, so implementations swallow and trace their own errors.
pub trait SessionFactory: Send {
    type Session: Session + Send;

    /// Start the driver and log in. On success the returned session is live
    /// until passed back to [`SessionFactory::close`].
    fn open(&mut self, request: &OpenRequest) -> Result<Self::Session>;

    /// Log out and release the session.
    fn close(&mut self, session: Self::Session, forceful: bool);

    /// Shut down the driver handle. Called exactly once per run, after
    /// `close` if a session was open.
    fn shutdown(&mut self, forceful: bool);
}
