//! `craft shape`: show the shaping documents and what to do next.

use super::require_state;
use crate::output::{OutputMode, render};
use crate::structure::{self, Structure};
use craft_core::{WorkflowState, WorkflowStore};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct ShapeOutput {
    intent: String,
    #[serde(flatten)]
    structure: Structure,
    next: String,
}

pub fn run_shape(output: OutputMode, store: &WorkflowStore) -> anyhow::Result<()> {
    let workflow = store.load()?;
    require_state(&workflow, WorkflowState::Shaping, "shape")?;

    let structure = structure::list_structure(store.craft_dir())?;
    let next = if structure.is_empty() {
        format!("create {}", structure::pitch_path(store.craft_dir()).display())
    } else {
        "craft approve".to_string()
    };
    let payload = ShapeOutput {
        intent: workflow.intent,
        structure,
        next,
    };

    render(output, &payload, |p, w| {
        writeln!(w, "Shaping: {}", p.intent)?;
        if p.structure.is_empty() {
            writeln!(w, "Structure: (none)")?;
        } else {
            writeln!(w, "Structure:")?;
            let docs: Vec<&PathBuf> = p.structure.pitch.iter().chain(&p.structure.cards).collect();
            for doc in docs {
                writeln!(w, "  {}", doc.display())?;
            }
        }
        writeln!(w, "Next: {}", p.next)
    })
}
