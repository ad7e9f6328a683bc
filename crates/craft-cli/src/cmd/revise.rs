//! `craft revise`: record a concern during shaping without advancing.

use super::{CommandOutput, join_words, report, require_state};
use crate::output::OutputMode;
use clap::Args;
use craft_core::{WorkflowState, WorkflowStore};

/// Prefix that marks notes added while shaping.
const REVISE_PREFIX: &str = "[revise]";

#[derive(Args, Debug)]
pub struct ReviseArgs {
    /// What needs to change in the structure.
    #[arg(value_name = "NOTE")]
    pub note: Vec<String>,
}

pub fn run_revise(
    args: &ReviseArgs,
    output: OutputMode,
    store: &WorkflowStore,
) -> anyhow::Result<()> {
    let mut workflow = store.load()?;
    require_state(&workflow, WorkflowState::Shaping, "revise")?;

    let note = join_words(&args.note);
    if note.is_empty() {
        anyhow::bail!("note required. Usage: craft revise \"<note>\"");
    }

    let note = format!("{REVISE_PREFIX} {note}");
    workflow.add_note(&note);
    store.save(&mut workflow)?;

    report(
        output,
        &CommandOutput::new("revise", "Concern recorded. State: shaping", &workflow)
            .with_note(&note),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::test_support::store_in;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ReviseArgs,
    }

    #[test]
    fn revise_args_collect_words() {
        let w = Wrapper::parse_from(["test", "cut", "scope"]);
        assert_eq!(w.args.note, ["cut", "scope"]);
    }

    #[test]
    fn revise_prefixes_note() {
        let (_tmp, store) = store_in(WorkflowState::Shaping);
        let args = ReviseArgs {
            note: vec!["'drop the admin UI'".into()],
        };
        run_revise(&args, OutputMode::Json, &store).expect("revise");
        let w = store.load().expect("load");
        assert_eq!(w.notes, ["[revise] drop the admin UI"]);
        assert_eq!(w.state, WorkflowState::Shaping);
    }

    #[test]
    fn revise_requires_note() {
        let (_tmp, store) = store_in(WorkflowState::Shaping);
        let args = ReviseArgs { note: vec![] };
        let err = run_revise(&args, OutputMode::Json, &store).expect_err("empty");
        assert!(err.to_string().contains("note required"));
    }

    #[test]
    fn revise_only_in_shaping() {
        let (_tmp, store) = store_in(WorkflowState::Thinking);
        let args = ReviseArgs {
            note: vec!["x".into()],
        };
        run_revise(&args, OutputMode::Json, &store).expect_err("wrong state");
    }
}
