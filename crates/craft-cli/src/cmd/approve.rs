//! `craft approve`: accept the shaped structure and start building.
//!
//! Requires `pitch.md` in the craft directory.

use super::{CommandOutput, report, require_transition};
use crate::output::OutputMode;
use crate::structure;
use craft_core::{WorkflowError, WorkflowState, WorkflowStore};

pub fn run_approve(output: OutputMode, store: &WorkflowStore) -> anyhow::Result<()> {
    let mut workflow = store.load()?;
    require_transition(
        &workflow,
        WorkflowState::Shaping,
        WorkflowState::Building,
        "structure is approved while shaping; run `craft accept` first",
    )?;

    if !structure::has_pitch(store.craft_dir()) {
        anyhow::bail!(
            "no structure found: create {} before approving",
            structure::pitch_path(store.craft_dir()).display()
        );
    }

    let previous = workflow.state;
    workflow
        .transition(WorkflowState::Building)
        .map_err(WorkflowError::from)?;
    store.save(&mut workflow)?;

    report(
        output,
        &CommandOutput::new("approve", "Structure approved. State: building", &workflow)
            .with_previous_state(previous),
    )
}
