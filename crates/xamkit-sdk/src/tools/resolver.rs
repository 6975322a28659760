//! Executable resolution for logical tool names.
//!
//! Resolution order, first existing candidate wins:
//!
//! 1. Explicit override (settings `tool_path`, else the registry entry)
//! 2. The configured tool-search directory, for each executable name
//! 3. Well-known install locations
//! 4. The executable search path (`PATH`), for each executable name
//!
//! A missing override is logged and resolution continues with the next tier.
//! Only when every tier comes up empty does resolution fail, with a
//! [`ToolError::ToolNotFound`] listing every candidate that was tried.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::host::Host;
use crate::types::ToolError;

/// Static description of an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Logical name, also the key into the [`ToolRegistry`](crate::host::ToolRegistry).
    pub name: &'static str,
    /// Executable names tried on Unix-like hosts.
    pub unix_executables: &'static [&'static str],
    /// Executable names tried on Windows hosts.
    pub windows_executables: &'static [&'static str],
    /// Well-known install paths, checked as-is.
    pub fallback_paths: &'static [&'static str],
}

impl ToolSpec {
    pub fn executables(&self, windows: bool) -> &'static [&'static str] {
        if windows {
            self.windows_executables
        } else {
            self.unix_executables
        }
    }
}

/// Resolves `spec` to an existing executable.
///
/// `override_path` is the per-invocation override from settings; when it is
/// `None` the registry's entry for `spec.name` is used instead.
pub fn resolve(
    spec: &ToolSpec,
    override_path: Option<&Path>,
    host: &Host<'_>,
) -> Result<PathBuf, ToolError> {
    let mut searched = Vec::new();
    let names = spec.executables(host.env.is_windows());

    let explicit = override_path.or_else(|| host.registry.path_for(spec.name));
    if let Some(path) = explicit {
        if host.fs.exists(path) {
            debug!(tool = spec.name, path = %path.display(), "resolved from explicit path");
            return Ok(path.to_path_buf());
        }
        debug!(
            tool = spec.name,
            path = %path.display(),
            "explicit tool path does not exist, trying other locations"
        );
        searched.push(path.display().to_string());
    }

    if let Some(dir) = host.registry.directory.as_deref() {
        for name in names {
            let candidate = dir.join(name);
            if host.fs.exists(&candidate) {
                debug!(tool = spec.name, path = %candidate.display(), "resolved from tool directory");
                return Ok(candidate);
            }
            searched.push(candidate.display().to_string());
        }
    }

    for fallback in spec.fallback_paths {
        let candidate = PathBuf::from(fallback);
        if host.fs.exists(&candidate) {
            debug!(tool = spec.name, path = %candidate.display(), "resolved from install location");
            return Ok(candidate);
        }
        searched.push(candidate.display().to_string());
    }

    for name in names {
        if let Some(found) = host.env.find_on_path(name) {
            debug!(tool = spec.name, path = %found.display(), "resolved from PATH");
            return Ok(found);
        }
        searched.push(format!("PATH: {}", name));
    }

    Err(ToolError::ToolNotFound {
        tool: spec.name.to_string(),
        searched,
    })
}
