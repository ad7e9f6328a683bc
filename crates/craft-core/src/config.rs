//! Locating the craft directory.
//!
//! There is no configuration file. The directory is resolved from, in order:
//! an explicit override, the `CRAFT_DIR` environment variable, and finally
//! `<project_root>/.craft`. Relative overrides are taken relative to the
//! project root.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Default directory name under the project root.
pub const CRAFT_DIR_NAME: &str = ".craft";

/// Environment variable that overrides the craft directory.
pub const CRAFT_DIR_ENV: &str = "CRAFT_DIR";

/// Resolve the craft directory from explicit inputs.
///
/// An empty environment value counts as unset.
#[must_use]
pub fn resolve_craft_dir(
    project_root: &Path,
    explicit: Option<&Path>,
    env_value: Option<&OsStr>,
) -> PathBuf {
    if let Some(dir) = explicit {
        return project_root.join(dir);
    }
    if let Some(dir) = env_value.filter(|value| !value.is_empty()) {
        return project_root.join(dir);
    }
    project_root.join(CRAFT_DIR_NAME)
}

/// [`resolve_craft_dir`] reading `CRAFT_DIR` from the process environment.
#[must_use]
pub fn craft_dir_from_env(project_root: &Path, explicit: Option<&Path>) -> PathBuf {
    let env_value = env::var_os(CRAFT_DIR_ENV);
    resolve_craft_dir(project_root, explicit, env_value.as_deref())
}
