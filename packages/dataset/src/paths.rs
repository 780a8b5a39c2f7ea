//! Default file locations for the crash dataset.
//!
//! Paths are relative to the process working directory, so the server and
//! CLI pick up the same CSV when launched from the project root.

use std::path::{Path, PathBuf};

/// File name of the prepared crash dataset.
pub const DEFAULT_CSV_FILE: &str = "Newnew_dataset.csv";

/// Returns the default dataset path.
#[must_use]
pub fn default_csv_path() -> PathBuf {
    PathBuf::from(DEFAULT_CSV_FILE)
}

/// Resolves `path` against the current working directory for log output.
#[must_use]
pub fn display_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}
