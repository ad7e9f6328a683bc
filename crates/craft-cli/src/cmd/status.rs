//! `craft status`: summarize the workflow.
//!
//! A missing workflow is reported, not treated as an error. A checksum
//! mismatch is a warning only.

use crate::output::{OutputMode, render};
use chrono::Local;
use craft_core::{Workflow, WorkflowStore};
use serde::Serialize;
use tracing::warn;

const MODIFIED_WARNING: &str =
    "Warning: Workflow file modified externally. State may be inconsistent.";

#[derive(Debug, Serialize)]
struct StatusOutput {
    workflow: Option<Workflow>,
    checksum_valid: bool,
    actions: &'static [&'static str],
}

pub fn run_status(output: OutputMode, store: &WorkflowStore) -> anyhow::Result<()> {
    let workflow = match store.load() {
        Ok(workflow) => workflow,
        Err(err) if err.is_not_found() => {
            let payload = StatusOutput {
                workflow: None,
                checksum_valid: false,
                actions: &[],
            };
            return render(output, &payload, |_, w| {
                writeln!(w, "No workflow found. Run `craft start` to begin.")
            });
        }
        Err(err) => return Err(err.into()),
    };

    let checksum_valid = match workflow.validate_checksum() {
        Ok(()) => true,
        Err(mismatch) => {
            warn!(
                path = %store.path().display(),
                stored = %mismatch.stored,
                computed = %mismatch.computed,
                "workflow checksum mismatch"
            );
            false
        }
    };

    let payload = StatusOutput {
        actions: workflow.next_valid_actions(),
        workflow: Some(workflow),
        checksum_valid,
    };

    render(output, &payload, |p, w| {
        let Some(ref workflow) = p.workflow else {
            return Ok(());
        };
        if !p.checksum_valid {
            writeln!(w, "{MODIFIED_WARNING}")?;
            writeln!(w)?;
        }

        writeln!(w, "State: {}", workflow.state)?;
        writeln!(w, "Intent: {}", workflow.intent)?;
        if let Some(started_at) = workflow.started_at {
            writeln!(
                w,
                "Started: {}",
                started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            )?;
        }
        writeln!(w)?;

        if !workflow.history.is_empty() {
            writeln!(w, "History:")?;
            for entry in &workflow.history {
                let at = entry.at.with_timezone(&Local).format("%H:%M");
                if entry.note.is_empty() {
                    writeln!(w, "  {at} {}", entry.state)?;
                } else {
                    writeln!(w, "  {at} {} \"{}\"", entry.state, entry.note)?;
                }
            }
            writeln!(w)?;
        }

        writeln!(w, "Notes:")?;
        if workflow.notes.is_empty() {
            writeln!(w, "(none)")?;
        }
        for note in &workflow.notes {
            writeln!(w, "- {note}")?;
        }
        writeln!(w)?;

        writeln!(w, "Actions: {}", p.actions.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::test_support::{empty_store, store_in};
    use craft_core::WorkflowState;
    use std::fs;

    #[test]
    fn status_without_workflow_succeeds() {
        let (_tmp, store) = empty_store();
        run_status(OutputMode::Json, &store).expect("missing workflow is not an error");
    }

    #[test]
    fn status_tolerates_checksum_mismatch() {
        let (_tmp, store) = store_in(WorkflowState::Shaping);
        let text = fs::read_to_string(store.path()).expect("read");
        fs::write(store.path(), text.replace("Add rate limiting", "Edited by hand"))
            .expect("tamper");
        run_status(OutputMode::Json, &store).expect("mismatch only warns");
    }

    #[test]
    fn status_surfaces_corrupt_workflow() {
        let (_tmp, store) = store_in(WorkflowState::Thinking);
        fs::write(store.path(), "garbage").expect("corrupt");
        let err = run_status(OutputMode::Json, &store).expect_err("malformed");
        assert!(err.to_string().contains("invalid workflow file"));
    }
}
