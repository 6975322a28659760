//! Generic tool runner shared by every wrapped tool.
//!
//! A [`ToolRunner`] pairs a [`ToolSpec`] with a [`Host`]. Per-tool wrappers
//! build their [`ArgumentSequence`] and hand it to [`ToolRunner::run`], which
//! resolves the executable and invokes it.

use std::path::{Path, PathBuf};

use crate::host::Host;
use crate::tools::args::{ArgumentSequence, make_absolute};
use crate::tools::invoker::{self, FailureMode};
use crate::tools::resolver::{self, ToolSpec};
use crate::types::{InvocationResult, ToolError};

/// Settings every tool invocation carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSettings {
    /// Explicit executable, tried before any other location.
    pub tool_path: Option<PathBuf>,
    /// Base for relative inputs and the child's working directory.
    /// Defaults to the host's working directory.
    pub working_directory: Option<PathBuf>,
}

/// Resolve, build, invoke for one tool.
#[derive(Clone, Copy)]
pub struct ToolRunner<'a> {
    spec: &'static ToolSpec,
    host: Host<'a>,
}

impl<'a> ToolRunner<'a> {
    pub fn new(spec: &'static ToolSpec, host: Host<'a>) -> Self {
        Self { spec, host }
    }

    pub fn host(&self) -> &Host<'a> {
        &self.host
    }

    /// Directory relative inputs are resolved against.
    ///
    /// # Errors
    /// [`ToolError::Io`] if the host's working directory is needed but
    /// cannot be read.
    pub fn base_directory(&self, settings: &ToolSettings) -> Result<PathBuf, ToolError> {
        match &settings.working_directory {
            Some(dir) if dir.is_absolute() => Ok(make_absolute(dir, dir)),
            Some(dir) => Ok(make_absolute(dir, &self.host.env.working_directory()?)),
            None => Ok(self.host.env.working_directory()?),
        }
    }

    /// Makes `path` absolute and checks that it exists.
    ///
    /// # Errors
    /// [`ToolError::FileNotFound`] if nothing exists at the resolved path.
    pub fn require_input(&self, path: &Path, settings: &ToolSettings) -> Result<PathBuf, ToolError> {
        let absolute = make_absolute(path, &self.base_directory(settings)?);
        if !self.host.fs.exists(&absolute) {
            return Err(ToolError::FileNotFound(absolute));
        }
        Ok(absolute)
    }

    pub fn resolve(&self, settings: &ToolSettings) -> Result<PathBuf, ToolError> {
        resolver::resolve(self.spec, settings.tool_path.as_deref(), &self.host)
    }

    /// Resolves the executable and runs it; a failing exit is an error.
    pub fn run(&self, settings: &ToolSettings, args: &ArgumentSequence) -> Result<(), ToolError> {
        self.run_with(settings, args, FailureMode::Fatal).map(|_| ())
    }

    pub fn run_with(
        &self,
        settings: &ToolSettings,
        args: &ArgumentSequence,
        mode: FailureMode,
    ) -> Result<InvocationResult, ToolError> {
        let program = self.resolve(settings)?;
        let working_directory = self.base_directory(settings)?;
        invoker::run(
            self.host.launcher,
            self.spec.name,
            &program,
            args,
            Some(&working_directory),
            mode,
        )
    }
}
