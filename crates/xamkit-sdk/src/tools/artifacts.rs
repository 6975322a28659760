//! Build output discovery.
//!
//! Finds the most recently modified file matching a glob pattern below a
//! root directory. Finding nothing is a normal outcome, reported as `None`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::host::FileSystem;
use crate::types::{Artifact, ToolError};

/// Pattern for any APK below the search root.
pub const APK_PATTERN: &str = "**/*.apk";

/// Pattern for signed APKs, which carry a `-Signed` suffix.
pub const SIGNED_APK_PATTERN: &str = "**/*-Signed.apk";

/// Returns the APK pattern for the requested signing mode.
pub fn apk_pattern(signed: bool) -> &'static str {
    if signed { SIGNED_APK_PATTERN } else { APK_PATTERN }
}

/// Joins `root` and a relative glob `pattern` into one absolute pattern.
///
/// Glob metacharacters in `root` itself are escaped so a directory named
/// `[build]` is matched literally.
pub fn search_pattern(root: &Path, pattern: &str) -> String {
    let root = glob::Pattern::escape(&root.display().to_string());
    let root = root.trim_end_matches(['/', '\\']);
    format!("{}/{}", root, pattern.trim_start_matches(['/', '\\']))
}

/// Every match of `pattern` under `root` with its modification time.
///
/// Entries whose timestamp cannot be read (for example because they were
/// deleted after being listed) are skipped.
pub fn find_all(
    fs: &dyn FileSystem,
    root: &Path,
    pattern: &str,
) -> Result<Vec<Artifact>, ToolError> {
    let full = search_pattern(root, pattern);
    let matches: Vec<PathBuf> = fs.glob(&full)?;
    debug!(pattern = %full, matches = matches.len(), "searched for artifacts");

    Ok(matches
        .into_iter()
        .filter_map(|path| match fs.modified(&path) {
            Ok(modified) => Some(Artifact { path, modified }),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable artifact");
                None
            }
        })
        .collect())
}

/// The most recently modified match, or `None` if nothing matched.
///
/// Ties on modification time go to the lexicographically smallest path, so
/// the result is stable for an unchanged filesystem.
pub fn find_latest(
    fs: &dyn FileSystem,
    root: &Path,
    pattern: &str,
) -> Result<Option<Artifact>, ToolError> {
    Ok(select_latest(find_all(fs, root, pattern)?))
}

pub fn select_latest(artifacts: Vec<Artifact>) -> Option<Artifact> {
    artifacts.into_iter().max_by(|a, b| {
        a.modified
            .cmp(&b.modified)
            .then_with(|| b.path.cmp(&a.path))
    })
}
