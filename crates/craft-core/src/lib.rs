//! craft-core library.
//!
//! Tracks a single development workflow (thinking → shaping → building →
//! shipped) as a hand-written markdown document with a checksummed header.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums; see [`error::WorkflowError`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).
//! - **Paths**: nothing reads the process working directory; callers pass
//!   the workflow directory explicitly (see [`config::resolve_craft_dir`]).

pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod workflow;

pub use error::{ErrorCode, WorkflowError};
pub use state::{TransitionError, WorkflowState};
pub use store::WorkflowStore;
pub use workflow::{CURRENT_SCHEMA_VERSION, HistoryEntry, Workflow};
