//! `craft accept`: confirm the intent and leave `thinking`.
//!
//! Moves to `shaping` by default, or straight to `building` with
//! `--skip-shaping`. An optional note is recorded both in the notes list and
//! on the new history entry.

use super::{CommandOutput, join_words, report, require_transition};
use crate::output::OutputMode;
use clap::Args;
use craft_core::{WorkflowError, WorkflowState, WorkflowStore};

#[derive(Args, Debug)]
pub struct AcceptArgs {
    /// Go directly to building without a shaping phase.
    #[arg(long)]
    pub skip_shaping: bool,

    /// Optional note explaining the decision.
    #[arg(value_name = "NOTE")]
    pub note: Vec<String>,
}

pub fn run_accept(
    args: &AcceptArgs,
    output: OutputMode,
    store: &WorkflowStore,
) -> anyhow::Result<()> {
    let mut workflow = store.load()?;
    let target = if args.skip_shaping {
        WorkflowState::Building
    } else {
        WorkflowState::Shaping
    };
    require_transition(
        &workflow,
        WorkflowState::Thinking,
        target,
        "only a thinking workflow can be accepted",
    )?;

    let note = join_words(&args.note);

    let previous = workflow.state;
    workflow
        .transition_with_note(target, note.as_str())
        .map_err(WorkflowError::from)?;
    workflow.add_note(&note);
    store.save(&mut workflow)?;

    let message = match target {
        WorkflowState::Building => "Intent frozen. State: building",
        _ => "Intent accepted. State: shaping",
    };
    report(
        output,
        &CommandOutput::new("accept", message, &workflow)
            .with_previous_state(previous)
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
        args: AcceptArgs,
    }

    #[test]
    fn accept_args_parse_flag_and_note() {
        let w = Wrapper::parse_from(["test", "--skip-shaping", "small", "change"]);
        assert!(w.args.skip_shaping);
        assert_eq!(w.args.note, ["small", "change"]);
    }

    #[test]
    fn accept_moves_to_shaping() {
        let (_tmp, store) = store_in(WorkflowState::Thinking);
        let args = AcceptArgs {
            skip_shaping: false,
            note: vec![],
        };
        run_accept(&args, OutputMode::Json, &store).expect("accept");
        let w = store.load().expect("load");
        assert_eq!(w.state, WorkflowState::Shaping);
        assert!(w.notes.is_empty());
        assert_eq!(w.history.len(), 2);
    }

    #[test]
    fn accept_skip_shaping_records_note() {
        let (_tmp, store) = store_in(WorkflowState::Thinking);
        let args = AcceptArgs {
            skip_shaping: true,
            note: vec!["\"tiny".into(), "fix\"".into()],
        };
        run_accept(&args, OutputMode::Json, &store).expect("accept");
        let w = store.load().expect("load");
        assert_eq!(w.state, WorkflowState::Building);
        assert_eq!(w.notes, ["tiny fix"]);
        assert_eq!(w.last_entry().map(|e| e.note.as_str()), Some("tiny fix"));
    }

    #[test]
    fn accept_outside_thinking_fails_without_writing() {
        let (_tmp, store) = store_in(WorkflowState::Shaping);
        let before = std::fs::read_to_string(store.path()).expect("read");
        let args = AcceptArgs {
            skip_shaping: true,
            note: vec!["late".into()],
        };
        let err = run_accept(&args, OutputMode::Json, &store).expect_err("wrong state");
        let workflow_err = err.downcast_ref::<WorkflowError>().expect("typed error");
        assert_eq!(workflow_err.code(), craft_core::ErrorCode::IllegalTransition);
        assert!(err.to_string().contains("only a thinking workflow can be accepted"));
        assert_eq!(std::fs::read_to_string(store.path()).expect("read"), before);
    }
}
