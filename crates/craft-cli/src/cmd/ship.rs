//! `craft ship`: mark the work as delivered.

use super::CommandOutput;
use crate::output::{OutputMode, render};
use craft_core::{WorkflowError, WorkflowState, WorkflowStore};

pub fn run_ship(output: OutputMode, store: &WorkflowStore) -> anyhow::Result<()> {
    let mut workflow = store.load()?;
    let previous = workflow.state;
    workflow
        .transition(WorkflowState::Shipped)
        .map_err(WorkflowError::from)?;
    store.save(&mut workflow)?;

    let result = CommandOutput::new("ship", "Workflow complete. State: shipped", &workflow)
        .with_previous_state(previous);
    render(output, &result, |r, w| {
        writeln!(w, "{}", r.message)?;
        writeln!(w)?;
        writeln!(w, "Intent: {}", workflow.intent)
    })
}
