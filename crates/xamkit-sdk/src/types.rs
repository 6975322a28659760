//! Core types for xamkit-sdk.
//!
//! This module defines the fundamental types used throughout the SDK:
//!
//! - [`ToolError`] - Error types for resolution, invocation and retry
//! - [`InvocationResult`] - Exit status of a finished external process
//! - [`Artifact`] - A build output located on disk
//! - [`Configure`] - Applies a caller transformation on top of default settings

use std::path::PathBuf;
use std::time::SystemTime;

/// Error types for xamkit-sdk operations.
///
/// Lower-level components raise narrow errors ([`ToolError::ToolNotFound`],
/// [`ToolError::Execution`]); tool runners and the retry wrapper decide
/// whether to propagate them immediately or retry.
///
/// # Example
///
/// ```ignore
/// use xamkit_sdk::ToolError;
///
/// match vstool.build(&solution, &settings) {
///     Ok(()) => println!("Build finished"),
///     Err(ToolError::ToolNotFound { tool, searched }) => {
///         eprintln!("{} not installed, looked in {:?}", tool, searched);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid or missing configuration, detected before any process starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required input file (project, solution, package) does not exist.
    ///
    /// Raised before any external process is spawned.
    #[error("file not found: {}. Check the path passed to the operation", .0.display())]
    FileNotFound(PathBuf),

    /// No executable could be resolved for a logical tool name.
    #[error(
        "{tool} could not be found.\n\nSearched:\n{}\n\nInstall the tool, put it on PATH, or set an explicit tool path.",
        format_searched(.searched)
    )]
    ToolNotFound {
        /// Logical tool name (e.g. `vstool`).
        tool: String,
        /// Every candidate that was checked, in resolution order.
        searched: Vec<String>,
    },

    /// The external process could not be started at all.
    #[error("failed to start {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The external process finished with a failing exit status.
    #[error(
        "{tool} failed.\n\nArguments: {arguments}\nExit status: {}",
        format_exit_code(.exit_code)
    )]
    Execution {
        tool: String,
        /// Rendered command line with secrets redacted.
        arguments: String,
        /// `None` when the process was terminated by a signal.
        exit_code: Option<i32>,
    },

    /// A retried operation failed on every attempt.
    #[error("{operation} could not complete after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: Box<ToolError>,
    },

    /// One or more items of a batch operation failed.
    #[error("{operation} failed for {} file(s):\n{}", .failed.len(), format_failed(.failed))]
    BatchFailed {
        operation: String,
        failed: Vec<(PathBuf, String)>,
    },

    /// A glob search pattern could not be parsed.
    #[error("invalid search pattern: {0}")]
    Pattern(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}. Check file paths and permissions")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Returns `true` for failures worth another attempt.
    ///
    /// Only process-level failures qualify; configuration and resolution
    /// errors would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ToolError::Execution { .. } | ToolError::Launch { .. })
    }
}

fn format_searched(searched: &[String]) -> String {
    searched
        .iter()
        .map(|s| format!("  - {}", s))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}

fn format_failed(failed: &[(PathBuf, String)]) -> String {
    failed
        .iter()
        .map(|(path, reason)| format!("  - {}: {}", path.display(), reason))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Outcome of one external process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationResult {
    /// Exit code, or `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl InvocationResult {
    pub fn from_code(code: i32) -> Self {
        Self {
            exit_code: Some(code),
        }
    }

    /// Zero exit code means success.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A build output file found by the artifact locator.
///
/// # Example
///
/// ```ignore
/// match msbuild.package_android(&project, true, &settings)? {
///     Some(apk) => println!("Signed APK at {}", apk.path.display()),
///     None => println!("Build succeeded but produced no APK"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Builds settings by transforming defaults.
///
/// Implemented for every settings type that has a `Default`.
///
/// ```
/// use xamkit_sdk::{Configure, VsToolSettings};
///
/// let settings = VsToolSettings::configured(|s| s.verbose(true).target("Rebuild"));
/// assert!(settings.verbose);
/// assert_eq!(settings.target, "Rebuild");
/// ```
pub trait Configure: Default + Sized {
    fn configured(f: impl FnOnce(Self) -> Self) -> Self {
        f(Self::default())
    }
}

impl<T: Default> Configure for T {}
