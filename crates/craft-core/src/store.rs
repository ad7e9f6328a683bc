//! Durable storage for the workflow document.
//!
//! # Layout
//!
//! ```text
//! <craft_dir>/
//!   workflow.md       # the single workflow document
//!   workflow.md.tmp   # exists only mid-save
//!   pitch.md          # optional, written by the user
//!   cards/*.md        # optional, written by the user
//! ```
//!
//! Saves go through a sibling temp file and a rename, so readers observe
//! either the previous document or the new one, never a partial write.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::WorkflowError;
use crate::workflow::{CURRENT_SCHEMA_VERSION, Workflow, codec, migrate, now_utc};

/// Name of the workflow document inside the craft directory.
pub const WORKFLOW_FILE: &str = "workflow.md";

const TEMP_SUFFIX: &str = ".tmp";

// ---------------------------------------------------------------------------
// WorkflowStore
// ---------------------------------------------------------------------------

/// Loads, saves, and deletes the workflow document in one craft directory.
///
/// Exactly one workflow exists per directory. The store holds no open
/// handles and no locks; concurrent writers are last-writer-wins.
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    craft_dir: PathBuf,
}

impl WorkflowStore {
    /// Create a store rooted at `craft_dir`.
    ///
    /// Nothing is created on construction; [`save`](Self::save) creates the
    /// directory on demand.
    #[must_use]
    pub fn new(craft_dir: impl Into<PathBuf>) -> Self {
        Self {
            craft_dir: craft_dir.into(),
        }
    }

    /// The craft directory this store manages.
    #[must_use]
    pub fn craft_dir(&self) -> &Path {
        &self.craft_dir
    }

    /// Path to `workflow.md`.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.craft_dir.join(WORKFLOW_FILE)
    }

    /// Path to the temp file used during [`save`](Self::save).
    #[must_use]
    pub fn temp_path(&self) -> PathBuf {
        self.craft_dir.join(format!("{WORKFLOW_FILE}{TEMP_SUFFIX}"))
    }

    /// Returns `true` if a workflow document is present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    // -----------------------------------------------------------------------
    // Load / save / delete
    // -----------------------------------------------------------------------

    /// Read and decode the workflow document.
    ///
    /// Legacy (pre-v2) documents without history get one synthesized entry
    /// stamped with the file's modification time; the schema version is left
    /// alone until the next [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::NotFound`] if the document does not exist.
    /// - [`WorkflowError::ReadFailure`] for any other I/O error.
    /// - Decode errors from [`codec::decode`].
    pub fn load(&self) -> Result<Workflow, WorkflowError> {
        let path = self.path();
        let text = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                WorkflowError::NotFound { path: path.clone() }
            } else {
                WorkflowError::ReadFailure {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let mut workflow = codec::decode(&text)?;

        if workflow.schema_version > CURRENT_SCHEMA_VERSION {
            warn!(
                path = %path.display(),
                schema_version = workflow.schema_version,
                supported = CURRENT_SCHEMA_VERSION,
                "workflow was written by a newer craft"
            );
        }

        let fallback = modified_time(&path).unwrap_or_else(now_utc);
        if migrate::synthesize_legacy_history(&mut workflow, fallback) {
            info!(
                path = %path.display(),
                schema_version = workflow.schema_version,
                "synthesized history for legacy workflow"
            );
        }

        debug!(path = %path.display(), state = %workflow.state, "loaded workflow");
        Ok(workflow)
    }

    /// Migrate, encode, and atomically replace the workflow document.
    ///
    /// On success `workflow.checksum` holds the checksum that was written.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::WriteFailure`] if the directory cannot be
    /// created, the temp file cannot be written, or the rename fails. The
    /// temp file is removed on failure and the previous document is left
    /// untouched.
    pub fn save(&self, workflow: &mut Workflow) -> Result<(), WorkflowError> {
        fs::create_dir_all(&self.craft_dir).map_err(|source| WorkflowError::WriteFailure {
            path: self.craft_dir.clone(),
            source,
        })?;

        migrate::migrate(workflow);
        let text = codec::encode(workflow);

        let tmp = self.temp_path();
        let path = self.path();

        if let Err(source) = fs::write(&tmp, text) {
            remove_quietly(&tmp);
            return Err(WorkflowError::WriteFailure { path: tmp, source });
        }
        if let Err(source) = fs::rename(&tmp, &path) {
            remove_quietly(&tmp);
            return Err(WorkflowError::WriteFailure { path, source });
        }

        debug!(
            path = %path.display(),
            state = %workflow.state,
            checksum = %workflow.checksum,
            "saved workflow"
        );
        Ok(())
    }

    /// Remove the workflow document, then the craft directory if it is empty.
    ///
    /// Deleting a workflow that does not exist succeeds. A craft directory
    /// that still holds other files (pitch, cards) is kept.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::WriteFailure`] if the document exists but
    /// cannot be removed.
    pub fn delete(&self) -> Result<(), WorkflowError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => info!(path = %path.display(), "deleted workflow"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(WorkflowError::WriteFailure { path, source }),
        }

        if let Err(err) = fs::remove_dir(&self.craft_dir) {
            debug!(
                dir = %self.craft_dir.display(),
                error = %err,
                "craft directory kept"
            );
        }
        Ok(())
    }
}

fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

fn remove_quietly(path: &Path) {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => {
            warn!(path = %path.display(), error = %err, "failed to remove temp file");
        }
        _ => {}
    }
}
