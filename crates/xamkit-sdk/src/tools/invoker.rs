//! External process invocation with consistent error handling.

use std::path::Path;

use tracing::debug;

use crate::host::ProcessLauncher;
use crate::tools::args::ArgumentSequence;
use crate::types::{InvocationResult, ToolError};

/// Whether a failing exit status is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Non-zero exit raises [`ToolError::Execution`].
    #[default]
    Fatal,
    /// Non-zero exit is returned to the caller as-is.
    Tolerated,
}

/// Runs `program` with `args` and waits for it to exit.
///
/// # Arguments
/// * `tool` - Logical tool name, used in errors and logs
/// * `program` - Resolved executable
/// * `args` - Arguments; the redacted rendering is what gets logged
/// * `working_directory` - Optional directory to run in
/// * `mode` - Whether a failing exit status is fatal
///
/// # Returns
/// The [`InvocationResult`], or [`ToolError::Launch`] if the process could
/// not start, or [`ToolError::Execution`] on a failing exit in
/// [`FailureMode::Fatal`].
pub fn run(
    launcher: &dyn ProcessLauncher,
    tool: &str,
    program: &Path,
    args: &ArgumentSequence,
    working_directory: Option<&Path>,
    mode: FailureMode,
) -> Result<InvocationResult, ToolError> {
    debug!(tool, program = %program.display(), args = %args, "running");

    let result = launcher
        .launch(program, &args.to_argv(), working_directory)
        .map_err(|source| ToolError::Launch {
            tool: tool.to_string(),
            source,
        })?;

    debug!(tool, exit_code = ?result.exit_code, "finished");

    if !result.success() && mode == FailureMode::Fatal {
        return Err(ToolError::Execution {
            tool: tool.to_string(),
            arguments: args.render(),
            exit_code: result.exit_code,
        });
    }
    Ok(result)
}
