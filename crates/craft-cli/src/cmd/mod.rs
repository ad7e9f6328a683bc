//! Command handlers.
//!
//! Every mutating command follows load → check state → mutate → save, and
//! never writes when a check fails.

pub mod accept;
pub mod approve;
pub mod completions;
pub mod reject;
pub mod reset;
pub mod revise;
pub mod shape;
pub mod ship;
pub mod start;
pub mod status;
pub mod think;

use crate::output::{OutputMode, render};
use craft_core::{TransitionError, Workflow, WorkflowError, WorkflowState};
use serde::Serialize;

/// JSON output shared by the state-changing commands.
#[derive(Debug, Serialize)]
pub struct CommandOutput {
    pub command: &'static str,
    pub message: String,
    pub state: WorkflowState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<WorkflowState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub actions: &'static [&'static str],
}

impl CommandOutput {
    pub fn new(command: &'static str, message: impl Into<String>, workflow: &Workflow) -> Self {
        Self {
            command,
            message: message.into(),
            state: workflow.state,
            previous_state: None,
            note: None,
            actions: workflow.next_valid_actions(),
        }
    }

    #[must_use]
    pub fn with_previous_state(mut self, previous: WorkflowState) -> Self {
        self.previous_state = Some(previous);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: &str) -> Self {
        if !note.is_empty() {
            self.note = Some(note.to_string());
        }
        self
    }
}

/// Print the one-line message, or the whole result as JSON.
pub fn report(output: OutputMode, result: &CommandOutput) -> anyhow::Result<()> {
    render(output, result, |r, w| writeln!(w, "{}", r.message))
}

/// Join free-form words into one string without surrounding whitespace or
/// quote characters.
pub fn join_words(words: &[String]) -> String {
    words
        .join(" ")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// Fail unless a command that does not transition may run in `expected`.
///
/// # Errors
///
/// Returns an error naming the command and both states.
pub fn require_state(
    workflow: &Workflow,
    expected: WorkflowState,
    command: &str,
) -> anyhow::Result<()> {
    if workflow.state == expected {
        return Ok(());
    }
    anyhow::bail!(
        "cannot {command}: workflow is {}, expected {expected}",
        workflow.state
    );
}

/// Fail with a typed transition error unless the workflow is in `from`.
///
/// Edges the table forbids outright keep their own reason; an edge that is
/// legal but belongs to a different command is reported with `reason`.
///
/// # Errors
///
/// Returns [`WorkflowError::Transition`] when the workflow is not in `from`.
pub fn require_transition(
    workflow: &Workflow,
    from: WorkflowState,
    to: WorkflowState,
    reason: &'static str,
) -> Result<(), WorkflowError> {
    if workflow.state == from {
        return Ok(());
    }
    workflow.state.can_transition_to(to)?;
    Err(TransitionError::IllegalTransition {
        from: workflow.state,
        to,
        reason,
    }
    .into())
}

#[cfg(test)]
pub(crate) mod test_support {
    use craft_core::{Workflow, WorkflowState, WorkflowStore};
    use tempfile::TempDir;

    /// A store with a saved workflow walked to `state`.
    pub fn store_in(state: WorkflowState) -> (TempDir, WorkflowStore) {
        let tmp = TempDir::new().expect("tempdir");
        let store = WorkflowStore::new(tmp.path().join(".craft"));
        let mut w = Workflow::new("Add rate limiting");
        let path: &[WorkflowState] = match state {
            WorkflowState::Thinking => &[],
            WorkflowState::Shaping => &[WorkflowState::Shaping],
            WorkflowState::Building => &[WorkflowState::Shaping, WorkflowState::Building],
            WorkflowState::Shipped => &[
                WorkflowState::Shaping,
                WorkflowState::Building,
                WorkflowState::Shipped,
            ],
        };
        for &step in path {
            w.transition(step).expect("legal setup path");
        }
        store.save(&mut w).expect("save setup workflow");
        (tmp, store)
    }

    /// An empty craft directory with no workflow.
    pub fn empty_store() -> (TempDir, WorkflowStore) {
        let tmp = TempDir::new().expect("tempdir");
        let store = WorkflowStore::new(tmp.path().join(".craft"));
        (tmp, store)
    }
}
