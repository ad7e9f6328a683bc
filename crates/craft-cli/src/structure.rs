//! Read-only view of the shaping documents next to the workflow.
//!
//! `pitch.md` and `cards/*.md` are written by people or external tools;
//! craft only checks that they exist and lists them.

use serde::Serialize;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const PITCH_FILE: &str = "pitch.md";
pub const CARDS_DIR: &str = "cards";

/// Shaping documents found in a craft directory.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Structure {
    pub pitch: Option<PathBuf>,
    pub cards: Vec<PathBuf>,
}

impl Structure {
    pub fn is_empty(&self) -> bool {
        self.pitch.is_none() && self.cards.is_empty()
    }
}

pub fn pitch_path(craft_dir: &Path) -> PathBuf {
    craft_dir.join(PITCH_FILE)
}

pub fn cards_dir(craft_dir: &Path) -> PathBuf {
    craft_dir.join(CARDS_DIR)
}

/// `true` if `pitch.md` exists and is a regular file.
pub fn has_pitch(craft_dir: &Path) -> bool {
    pitch_path(craft_dir).is_file()
}

/// Markdown files directly under `cards/`, sorted by path.
///
/// A missing `cards/` directory yields an empty list.
///
/// # Errors
///
/// Returns the underlying I/O error if the directory exists but cannot be
/// read.
pub fn list_cards(craft_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(cards_dir(craft_dir)) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut cards = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_dir() && path.extension() == Some(OsStr::new("md")) {
            cards.push(path);
        }
    }
    cards.sort();
    Ok(cards)
}

/// Pitch (if present) and cards.
///
/// # Errors
///
/// See [`list_cards`].
pub fn list_structure(craft_dir: &Path) -> io::Result<Structure> {
    Ok(Structure {
        pitch: has_pitch(craft_dir).then(|| pitch_path(craft_dir)),
        cards: list_cards(craft_dir)?,
    })
}
