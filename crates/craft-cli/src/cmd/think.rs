//! `craft think`: show the intent and notes for deliberation.

use crate::output::{OutputMode, render};
use craft_core::{WorkflowState, WorkflowStore};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ThinkOutput {
    intent: String,
    notes: Vec<String>,
    state: WorkflowState,
    actions: &'static [&'static str],
}

pub fn run_think(output: OutputMode, store: &WorkflowStore) -> anyhow::Result<()> {
    let workflow = store.load()?;
    let payload = ThinkOutput {
        actions: workflow.next_valid_actions(),
        state: workflow.state,
        intent: workflow.intent,
        notes: workflow.notes,
    };

    render(output, &payload, |p, w| {
        writeln!(w, "# Intent")?;
        writeln!(w, "{}", p.intent)?;
        writeln!(w)?;
        writeln!(w, "## Notes")?;
        if p.notes.is_empty() {
            writeln!(w, "(none)")?;
        }
        for note in &p.notes {
            writeln!(w, "- {note}")?;
        }
        writeln!(w)?;
        writeln!(w, "State: {}", p.state)?;
        writeln!(w, "Actions: {}", p.actions.join(", "))
    })
}
