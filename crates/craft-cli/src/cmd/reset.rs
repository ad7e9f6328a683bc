//! `craft reset`: abandon the current workflow.
//!
//! Asks for confirmation unless `--force` is given. A workflow that no longer
//! parses can still be reset.

use crate::output::{OutputMode, render};
use clap::Args;
use craft_core::WorkflowStore;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tracing::warn;

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct ResetOutput {
    deleted: bool,
    message: &'static str,
}

pub fn run_reset(
    args: &ResetArgs,
    output: OutputMode,
    store: &WorkflowStore,
    input: &mut dyn BufRead,
) -> anyhow::Result<()> {
    if !store.exists() {
        return finish(output, false, "No workflow to reset.");
    }

    if !args.force {
        let prompt = match store.load() {
            Ok(workflow) => format!("Abandon workflow \"{}\"? [y/N] ", workflow.intent),
            Err(err) => {
                warn!(error = %err, "workflow is unreadable");
                "Abandon corrupted workflow? [y/N] ".to_string()
            }
        };
        write_prompt(output, &prompt)?;
        if !confirm(input) {
            return finish(output, false, "Cancelled.");
        }
    }

    store.delete()?;
    finish(output, true, "Workflow abandoned.")
}

fn finish(output: OutputMode, deleted: bool, message: &'static str) -> anyhow::Result<()> {
    render(output, &ResetOutput { deleted, message }, |r, w| {
        writeln!(w, "{}", r.message)
    })
}

// The prompt goes to stderr in JSON mode so stdout stays parseable.
fn write_prompt(output: OutputMode, prompt: &str) -> io::Result<()> {
    if output.is_json() {
        let mut err = io::stderr().lock();
        write!(err, "{prompt}")?;
        err.flush()
    } else {
        let mut out = io::stdout().lock();
        write!(out, "{prompt}")?;
        out.flush()
    }
}

/// `y` or `yes` in any case confirms; anything else, including EOF, declines.
fn confirm(input: &mut dyn BufRead) -> bool {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
    }
}
