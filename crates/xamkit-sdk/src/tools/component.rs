//! Component store tool (`xamarin-component`).
//!
//! `restore` and `package` fail fast. `upload` and `submit` talk to the
//! component store and are wrapped in [`with_retry`], so a flaky network
//! costs an attempt instead of the whole run.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::host::Host;
use crate::tools::args::ArgumentSequence;
use crate::tools::artifacts;
use crate::tools::resolver::ToolSpec;
use crate::tools::retry::{RetryPolicy, with_retry};
use crate::tools::runner::{ToolRunner, ToolSettings};
use crate::types::ToolError;

pub static COMPONENT_TOOL: ToolSpec = ToolSpec {
    name: "xamarin-component",
    unix_executables: &["xamarin-component", "xamarin-component.sh"],
    windows_executables: &["xamarin-component.exe"],
    fallback_paths: &[],
};

/// Pattern for component packages produced by `package`.
pub const PACKAGE_PATTERN: &str = "**/*.xam";

/// What a batch does when one file exhausts its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Stop at the first failure.
    #[default]
    Abort,
    /// Attempt every file, then report all failures together.
    Continue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentSettings {
    pub tool: ToolSettings,
    /// Store account, `-u:<email>`.
    pub email: Option<String>,
    /// Store password, `-p:<password>`, never logged.
    pub password: Option<String>,
    pub retry: RetryPolicy,
    pub batch: BatchPolicy,
}

impl ComponentSettings {
    pub fn credentials(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self.password = Some(password.into());
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn batch(mut self, batch: BatchPolicy) -> Self {
        self.batch = batch;
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

/// `<command> [-u:<email>] [-p:<password>] "<target>"`
pub fn arguments(command: &str, target: &Path, settings: &ComponentSettings) -> ArgumentSequence {
    let mut args = ArgumentSequence::new();
    args.append(command);
    if let Some(email) = &settings.email {
        args.append_switch("-u", ":", email);
    }
    if let Some(password) = &settings.password {
        args.append_switch_secret("-p", ":", password);
    }
    args.append_path(target);
    args
}

pub struct ComponentTool<'a> {
    runner: ToolRunner<'a>,
}

impl<'a> ComponentTool<'a> {
    pub fn new(host: Host<'a>) -> Self {
        Self {
            runner: ToolRunner::new(&COMPONENT_TOOL, host),
        }
    }

    /// Restores the components referenced by a solution.
    pub fn restore(&self, solution: &Path, settings: &ComponentSettings) -> Result<(), ToolError> {
        let solution = self.runner.require_input(solution, &settings.tool)?;
        info!(solution = %solution.display(), "restoring components");
        self.runner
            .run(&settings.tool, &arguments("restore", &solution, settings))
    }

    /// Packages the component described in `manifest_dir`.
    pub fn package(&self, manifest_dir: &Path, settings: &ComponentSettings) -> Result<(), ToolError> {
        let manifest_dir = self.runner.require_input(manifest_dir, &settings.tool)?;
        info!(dir = %manifest_dir.display(), "packaging component");
        let mut args = ArgumentSequence::new();
        args.append("package").append_path(&manifest_dir);
        self.runner.run(&settings.tool, &args)
    }

    /// Uploads one package, retrying up to `settings.retry.max_attempts`.
    pub fn upload(&self, package: &Path, settings: &ComponentSettings) -> Result<(), ToolError> {
        self.retried("upload", package, settings)
    }

    /// Submits one package for review, retrying like [`upload`](Self::upload).
    pub fn submit(&self, package: &Path, settings: &ComponentSettings) -> Result<(), ToolError> {
        self.retried("submit", package, settings)
    }

    /// Uploads every file matching `pattern` under `root`, one at a time.
    ///
    /// Returns the files that were uploaded.
    pub fn upload_all(
        &self,
        root: &Path,
        pattern: &str,
        settings: &ComponentSettings,
    ) -> Result<Vec<PathBuf>, ToolError> {
        self.batch("upload", root, pattern, settings)
    }

    pub fn submit_all(
        &self,
        root: &Path,
        pattern: &str,
        settings: &ComponentSettings,
    ) -> Result<Vec<PathBuf>, ToolError> {
        self.batch("submit", root, pattern, settings)
    }

    fn retried(&self, command: &str, package: &Path, settings: &ComponentSettings) -> Result<(), ToolError> {
        settings.retry.validate()?;
        let package = self.runner.require_input(package, &settings.tool)?;
        let args = arguments(command, &package, settings);
        let operation = format!("{} {}", command, package.display());
        info!(package = %package.display(), max_attempts = settings.retry.max_attempts, "{} component", command);

        with_retry(&operation, &settings.retry, |_| self.runner.run(&settings.tool, &args))
    }

    fn batch(
        &self,
        command: &str,
        root: &Path,
        pattern: &str,
        settings: &ComponentSettings,
    ) -> Result<Vec<PathBuf>, ToolError> {
        settings.retry.validate()?;
        let root = self.runner.require_input(root, &settings.tool)?;
        let files = artifacts::find_all(self.runner.host().fs, &root, pattern)?;
        if files.is_empty() {
            warn!(root = %root.display(), pattern, "no component packages matched");
        }

        let mut done = Vec::new();
        let mut failed = Vec::new();
        for file in files {
            match self.retried(command, &file.path, settings) {
                Ok(()) => done.push(file.path),
                Err(err) if settings.batch == BatchPolicy::Continue => {
                    failed.push((file.path, err.to_string()));
                }
                Err(err) => return Err(err),
            }
        }

        if !failed.is_empty() {
            return Err(ToolError::BatchFailed {
                operation: command.to_string(),
                failed,
            });
        }
        Ok(done)
    }
}
