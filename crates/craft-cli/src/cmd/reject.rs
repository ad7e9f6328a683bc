//! `craft reject`: record a concern and stay in `thinking`.

use super::{CommandOutput, join_words, report, require_state};
use crate::output::OutputMode;
use clap::Args;
use craft_core::{WorkflowState, WorkflowStore};

#[derive(Args, Debug)]
pub struct RejectArgs {
    /// The concern to record.
    #[arg(value_name = "NOTE")]
    pub note: Vec<String>,
}

pub fn run_reject(
    args: &RejectArgs,
    output: OutputMode,
    store: &WorkflowStore,
) -> anyhow::Result<()> {
    let mut workflow = store.load()?;
    require_state(&workflow, WorkflowState::Thinking, "reject")?;

    let note = join_words(&args.note);
    workflow.add_note(&note);
    store.save(&mut workflow)?;

    report(
        output,
        &CommandOutput::new("reject", "Concern recorded. State: thinking", &workflow)
            .with_note(&note),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::test_support::store_in;

    #[test]
    fn reject_adds_note_and_keeps_state() {
        let (_tmp, store) = store_in(WorkflowState::Thinking);
        let args = RejectArgs {
            note: vec!["scope".into(), "too".into(), "big".into()],
        };
        run_reject(&args, OutputMode::Json, &store).expect("reject");
        let w = store.load().expect("load");
        assert_eq!(w.state, WorkflowState::Thinking);
        assert_eq!(w.notes, ["scope too big"]);
        assert_eq!(w.history.len(), 1);
    }

    #[test]
    fn reject_only_in_thinking() {
        let (_tmp, store) = store_in(WorkflowState::Building);
        let args = RejectArgs {
            note: vec!["nope".into()],
        };
        run_reject(&args, OutputMode::Json, &store).expect_err("wrong state");
        assert!(store.load().expect("load").notes.is_empty());
    }
}
