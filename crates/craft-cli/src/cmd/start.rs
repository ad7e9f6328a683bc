//! `craft start`: begin a new workflow in `thinking`.

use super::{CommandOutput, join_words, report};
use crate::output::OutputMode;
use clap::Args;
use craft_core::{Workflow, WorkflowStore};
use tracing::info;

#[derive(Args, Debug)]
pub struct StartArgs {
    /// What you intend to build, as one quoted string or several words.
    #[arg(value_name = "INTENT")]
    pub intent: Vec<String>,
}

pub fn run_start(
    args: &StartArgs,
    output: OutputMode,
    store: &WorkflowStore,
) -> anyhow::Result<()> {
    let intent = join_words(&args.intent);
    if intent.is_empty() {
        anyhow::bail!("intent cannot be empty. Usage: craft start \"<intent>\"");
    }

    if store.exists() {
        anyhow::bail!(
            "workflow already exists at {}. Run `craft reset` to abandon it.",
            store.path().display()
        );
    }

    let mut workflow = Workflow::new(intent);
    store.save(&mut workflow)?;
    info!(intent = %workflow.intent, "workflow started");

    report(
        output,
        &CommandOutput::new("start", "Workflow started. State: thinking", &workflow),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::test_support::{empty_store, store_in};
    use clap::Parser;
    use craft_core::WorkflowState;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: StartArgs,
    }

    #[test]
    fn start_args_collect_words() {
        let w = Wrapper::parse_from(["test", "Add", "rate", "limiting"]);
        assert_eq!(w.args.intent, ["Add", "rate", "limiting"]);
    }

    #[test]
    fn start_creates_thinking_workflow() {
        let (_tmp, store) = empty_store();
        let args = StartArgs {
            intent: vec!["\"Add rate limiting\"".into()],
        };
        run_start(&args, OutputMode::Json, &store).expect("start");

        let w = store.load().expect("saved");
        assert_eq!(w.state, WorkflowState::Thinking);
        assert_eq!(w.intent, "Add rate limiting");
        assert_eq!(w.history.len(), 1);
    }

    #[test]
    fn start_rejects_empty_intent() {
        let (_tmp, store) = empty_store();
        let args = StartArgs {
            intent: vec!["  ".into()],
        };
        let err = run_start(&args, OutputMode::Json, &store).expect_err("empty");
        assert!(err.to_string().contains("intent cannot be empty"));
        assert!(!store.exists());
    }

    #[test]
    fn start_refuses_to_overwrite() {
        let (_tmp, store) = store_in(WorkflowState::Building);
        let args = StartArgs {
            intent: vec!["Something else".into()],
        };
        let err = run_start(&args, OutputMode::Json, &store).expect_err("exists");
        assert!(err.to_string().contains("already exists"));
        assert_eq!(store.load().expect("load").state, WorkflowState::Building);
    }
}
