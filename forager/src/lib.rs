//! Routine bot engine for a session-based browser game.
//!
//! The engine logs a user in, optionally ensures a protective status,
//! optionally activates the special skill, then visits a fixed series of
//! destinations and collects a resource at each. The architecture enforces a
//! strict separation:
//!
//! - **[`session`]**: Trait boundary to the remote environment (login,
//!   movement, inventory, anchor clicks). The live driver lives outside this
//!   crate; tests use scripted sessions.
//! - **[`tasks`]**: Interruptible units of work executed one at a time on the
//!   worker thread.
//! - **[`routine`]**: The orchestrator that runs the task pipeline, applies
//!   the recoverable/unknown failure policy and guarantees teardown.
//! - **[`worker`]**: The dedicated thread driving a [`routine::Routine`],
//!   with a stop handle safe to use from other threads.

pub mod config;
pub mod logging;
pub mod report;
pub mod routine;
pub mod session;
pub mod settings;
pub mod tasks;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod worker;
