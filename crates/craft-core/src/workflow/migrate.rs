//! Schema migration for persisted workflows.
//!
//! Each step upgrades a workflow *to* the version it is registered under and
//! is idempotent, so re-running the chain on an already-migrated workflow is
//! a no-op. Migrations never lower `schema_version`.

use chrono::{DateTime, SubsecRound, Utc};
use tracing::info;

use super::{CURRENT_SCHEMA_VERSION, HistoryEntry, Workflow, now_utc};

/// Version assumed for documents without a `schema_version` line.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// First version that records `started_at` and `history`.
pub const HISTORY_SCHEMA_VERSION: u32 = 2;

type MigrationStep = fn(&mut Workflow, DateTime<Utc>);

/// Ordered `(target_version, step)` pairs.
const MIGRATIONS: &[(u32, MigrationStep)] = &[
    (HISTORY_SCHEMA_VERSION, add_history),
    (3, add_shaping_state),
];

/// Upgrade `workflow` to [`CURRENT_SCHEMA_VERSION`] using the current time.
///
/// Returns `true` if anything was migrated.
pub fn migrate(workflow: &mut Workflow) -> bool {
    migrate_at(workflow, now_utc())
}

/// [`migrate`] with an explicit clock for the timestamps it fills in.
pub fn migrate_at(workflow: &mut Workflow, now: DateTime<Utc>) -> bool {
    let from = workflow.schema_version;
    if from >= CURRENT_SCHEMA_VERSION {
        return false;
    }

    let now = now.trunc_subsecs(0);
    for &(target, step) in MIGRATIONS {
        if workflow.schema_version < target {
            step(workflow, now);
            workflow.schema_version = target;
        }
    }
    workflow.schema_version = CURRENT_SCHEMA_VERSION;

    info!(from, to = CURRENT_SCHEMA_VERSION, "migrated workflow schema");
    true
}

/// Give a pre-v2 workflow a starting history so it satisfies the history
/// invariant in memory, without touching `schema_version`.
///
/// `fallback` is typically the file's modification time. Returns `true` if
/// history was synthesized.
pub fn synthesize_legacy_history(workflow: &mut Workflow, fallback: DateTime<Utc>) -> bool {
    if workflow.schema_version >= HISTORY_SCHEMA_VERSION || !workflow.history.is_empty() {
        return false;
    }
    add_history(workflow, fallback.trunc_subsecs(0));
    true
}

// v2: `started_at` and `history` introduced.
fn add_history(workflow: &mut Workflow, now: DateTime<Utc>) {
    let started_at = *workflow.started_at.get_or_insert(now);
    if workflow.history.is_empty() {
        workflow
            .history
            .push(HistoryEntry::new(workflow.state, started_at, ""));
    }
}

// v3: `shaping` state introduced; existing documents need no rewrite.
const fn add_shaping_state(_workflow: &mut Workflow, _now: DateTime<Utc>) {}
