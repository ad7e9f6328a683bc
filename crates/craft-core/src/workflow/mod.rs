//! The workflow aggregate and its on-disk document.
//!
//! A [`Workflow`] is created in memory, mutated only through
//! [`Workflow::transition_with_note`] and [`Workflow::add_note`], and
//! persisted by [`WorkflowStore`](crate::store::WorkflowStore) through the
//! hand-written codec in [`codec`].
//!
//! # Invariants
//!
//! - `history` is append-only; entries are never edited or reordered.
//! - Once `schema_version >= 2`, `history` is non-empty and its last entry's
//!   state equals `state`.
//! - Timestamps carry whole seconds only, matching the RFC-3339 rendering.

pub mod checksum;
pub mod codec;
pub mod migrate;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use tracing::debug;

use crate::state::{TransitionError, WorkflowState};

pub use checksum::{CHECKSUM_LEN, ChecksumMismatch, compute_checksum};
pub use codec::{decode, encode};
pub use migrate::migrate;

/// Schema version written by this build.
///
/// - v1: header without `started_at` or `history`.
/// - v2: `started_at` and `history` added.
/// - v3: `shaping` state introduced (no structural change).
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// One entry in the append-only transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// The state that was entered.
    pub state: WorkflowState,
    /// When it was entered (UTC, whole seconds).
    pub at: DateTime<Utc>,
    /// Free text; empty when no note was given.
    pub note: String,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(state: WorkflowState, at: DateTime<Utc>, note: impl Into<String>) -> Self {
        Self {
            state,
            at,
            note: note.into(),
        }
    }
}

/// A single tracked unit of intent-to-completion progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workflow {
    pub state: WorkflowState,
    pub schema_version: u32,
    /// Last computed or loaded checksum; empty until first encode.
    pub checksum: String,
    /// `None` only for legacy documents that predate `started_at`.
    pub started_at: Option<DateTime<Utc>>,
    pub history: Vec<HistoryEntry>,
    pub intent: String,
    pub notes: Vec<String>,
}

impl Workflow {
    /// Create a new workflow in `thinking`, stamped with the current time.
    #[must_use]
    pub fn new(intent: impl Into<String>) -> Self {
        Self::new_at(intent, now_utc())
    }

    /// Create a new workflow with an explicit creation time.
    ///
    /// Line breaks in `intent` become spaces and surrounding whitespace is
    /// trimmed, since the intent is stored as a single line.
    #[must_use]
    pub fn new_at(intent: impl Into<String>, now: DateTime<Utc>) -> Self {
        let now = now.trunc_subsecs(0);
        let intent = single_line(&intent.into()).trim().to_string();
        Self {
            state: WorkflowState::Thinking,
            schema_version: CURRENT_SCHEMA_VERSION,
            checksum: String::new(),
            started_at: Some(now),
            history: vec![HistoryEntry::new(WorkflowState::Thinking, now, "")],
            intent,
            notes: Vec::new(),
        }
    }

    /// Transition without a note.
    ///
    /// # Errors
    ///
    /// See [`transition_with_note`](Self::transition_with_note).
    pub fn transition(&mut self, to: WorkflowState) -> Result<(), TransitionError> {
        self.transition_with_note(to, "")
    }

    /// Validate and perform a transition, recording it in `history`.
    ///
    /// The note is stored verbatim. On error nothing is modified.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::IllegalTransition`] if `to` is not
    /// reachable from the current state.
    pub fn transition_with_note(
        &mut self,
        to: WorkflowState,
        note: impl Into<String>,
    ) -> Result<(), TransitionError> {
        self.transition_at(to, note, now_utc())
    }

    /// [`transition_with_note`](Self::transition_with_note) with an explicit
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Same as [`transition_with_note`](Self::transition_with_note).
    pub fn transition_at(
        &mut self,
        to: WorkflowState,
        note: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.state.can_transition_to(to)?;
        debug!(from = %self.state, to = %to, "workflow transition");
        self.state = to;
        self.history.push(HistoryEntry::new(to, at.trunc_subsecs(0), note));
        Ok(())
    }

    /// Append a freeform note.
    ///
    /// Line breaks become spaces, then surrounding whitespace and one layer
    /// of matching quote characters are stripped; a note that is empty
    /// afterwards is ignored.
    pub fn add_note(&mut self, note: &str) {
        let flattened = single_line(note);
        let normalized = normalize_note(&flattened);
        if !normalized.is_empty() {
            self.notes.push(normalized.to_string());
        }
    }

    /// The most recent history entry, if any.
    #[must_use]
    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// Display actions available from the current state.
    #[must_use]
    pub const fn next_valid_actions(&self) -> &'static [&'static str] {
        self.state.next_valid_actions()
    }
}

/// Current UTC time truncated to whole seconds.
#[must_use]
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Replace each line break (`\r\n`, `\n` or `\r`) with a single space.
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Trim, strip one layer of `"` or `'` (whichever is outermost), trim again.
fn normalize_note(raw: &str) -> &str {
    let trimmed = raw.trim();
    let quote = match (trimmed.chars().next(), trimmed.chars().next_back()) {
        (Some(c @ ('"' | '\'')), _) | (_, Some(c @ ('"' | '\''))) => c,
        _ => return trimmed,
    };
    let stripped = trimmed.strip_prefix(quote).unwrap_or(trimmed);
    let stripped = stripped.strip_suffix(quote).unwrap_or(stripped);
    stripped.trim()
}
