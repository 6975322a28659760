//! IDE command-line build tool (`vstool`, formerly `mdtool`).
//!
//! Builds and archives solutions the way the IDE does:
//!
//! ```text
//! vstool [-v] build -t:<target> -c:"<configuration>" "<solution>"
//! vstool [-v] archive [-p:<project>] -c:"<configuration>" "<solution>"
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use crate::host::Host;
use crate::tools::args::ArgumentSequence;
use crate::tools::resolver::ToolSpec;
use crate::tools::runner::{ToolRunner, ToolSettings};
use crate::types::ToolError;

pub static VSTOOL: ToolSpec = ToolSpec {
    name: "vstool",
    unix_executables: &["vstool", "mdtool"],
    windows_executables: &["vstool.exe", "mdtool.exe"],
    fallback_paths: &[
        "/Applications/Visual Studio.app/Contents/MacOS/vstool",
        "/Applications/Xamarin Studio.app/Contents/MacOS/mdtool",
    ],
};

pub const DEFAULT_CONFIGURATION: &str = "Debug|iPhoneSimulator";
pub const DEFAULT_TARGET: &str = "Build";

/// Settings for `build` and `archive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VsToolSettings {
    pub tool: ToolSettings,
    /// `<configuration>|<platform>` label.
    pub configuration: String,
    /// Build target, `build` only.
    pub target: String,
    /// Prepends `-v`.
    pub verbose: bool,
}

impl Default for VsToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolSettings::default(),
            configuration: DEFAULT_CONFIGURATION.to_string(),
            target: DEFAULT_TARGET.to_string(),
            verbose: false,
        }
    }
}

impl VsToolSettings {
    pub fn configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = configuration.into();
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn tool_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tool.tool_path = Some(path.into());
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tool.working_directory = Some(dir.into());
        self
    }
}

pub fn build_arguments(solution: &Path, settings: &VsToolSettings) -> ArgumentSequence {
    let mut args = ArgumentSequence::new();
    args.append_if(settings.verbose, "-v")
        .append("build")
        .append_switch("-t", ":", &settings.target)
        .append_switch_quoted("-c", ":", &settings.configuration)
        .append_path(solution);
    args
}

pub fn archive_arguments(
    solution: &Path,
    project_name: Option<&str>,
    settings: &VsToolSettings,
) -> ArgumentSequence {
    let mut args = ArgumentSequence::new();
    args.append_if(settings.verbose, "-v").append("archive");
    if let Some(project) = project_name.filter(|p| !p.is_empty()) {
        args.append_switch("-p", ":", project);
    }
    args.append_switch_quoted("-c", ":", &settings.configuration)
        .append_path(solution);
    args
}

/// Runner for the IDE build tool.
pub struct VsTool<'a> {
    runner: ToolRunner<'a>,
}

impl<'a> VsTool<'a> {
    pub fn new(host: Host<'a>) -> Self {
        Self {
            runner: ToolRunner::new(&VSTOOL, host),
        }
    }

    /// Builds a solution or project.
    ///
    /// # Errors
    /// [`ToolError::FileNotFound`] before anything runs if `solution` is
    /// missing, otherwise any resolution or execution error.
    pub fn build(&self, solution: &Path, settings: &VsToolSettings) -> Result<(), ToolError> {
        let solution = self.runner.require_input(solution, &settings.tool)?;
        info!(solution = %solution.display(), configuration = %settings.configuration, "vstool build");
        self.runner
            .run(&settings.tool, &build_arguments(&solution, settings))
    }

    /// Archives a solution, optionally limited to one project.
    pub fn archive(
        &self,
        solution: &Path,
        project_name: Option<&str>,
        settings: &VsToolSettings,
    ) -> Result<(), ToolError> {
        let solution = self.runner.require_input(solution, &settings.tool)?;
        info!(solution = %solution.display(), project = ?project_name, "vstool archive");
        self.runner.run(
            &settings.tool,
            &archive_arguments(&solution, project_name, settings),
        )
    }
}
