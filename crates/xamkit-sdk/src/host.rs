//! Host collaborators injected into every tool runner.
//!
//! Tool runners never reach for ambient process state. The filesystem,
//! environment and process launcher are passed in through [`Host`], which
//! makes every operation testable without touching the real machine.
//!
//! | Trait | Host implementation | Purpose |
//! |-------|---------------------|---------|
//! | [`FileSystem`] | [`LocalFileSystem`] | Existence checks, globbing, timestamps |
//! | [`Environment`] | [`HostEnvironment`] | Env vars, platform, `PATH` lookup |
//! | [`ProcessLauncher`] | [`SystemProcessLauncher`] | Starts external processes |

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use crate::types::{InvocationResult, ToolError};

/// Environment variable naming the global tool-search directory.
pub const TOOLS_DIR_ENV: &str = "XAMKIT_TOOLS_DIR";

/// Read-only view of the filesystem.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;

    /// Returns the regular files matching an absolute glob pattern, in
    /// sorted order.
    ///
    /// Directories that match are left out. Entries that cannot be read
    /// while iterating are skipped.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ToolError>;

    fn modified(&self, path: &Path) -> io::Result<SystemTime>;
}

/// Process environment and platform facts.
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;

    fn is_windows(&self) -> bool;

    /// Searches the executable search path for `name`.
    fn find_on_path(&self, name: &str) -> Option<PathBuf>;

    /// The absolute directory relative inputs are resolved against.
    fn working_directory(&self) -> io::Result<PathBuf>;
}

/// Starts an external process and blocks until it exits.
pub trait ProcessLauncher {
    fn launch(
        &self,
        program: &Path,
        args: &[String],
        working_directory: Option<&Path>,
    ) -> io::Result<InvocationResult>;
}

/// [`FileSystem`] backed by `std::fs` and the `glob` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ToolError> {
        let entries = glob::glob(pattern)
            .map_err(|e| ToolError::Pattern(format!("{}: {}", pattern, e)))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|path| path.is_file())
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }
}

/// [`Environment`] of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostEnvironment;

impl Environment for HostEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn is_windows(&self) -> bool {
        cfg!(target_os = "windows")
    }

    fn find_on_path(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn working_directory(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }
}

/// [`ProcessLauncher`] using `std::process::Command`.
///
/// Output is inherited so the wrapped tool's progress stays visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessLauncher;

impl ProcessLauncher for SystemProcessLauncher {
    fn launch(
        &self,
        program: &Path,
        args: &[String],
        working_directory: Option<&Path>,
    ) -> io::Result<InvocationResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = working_directory {
            cmd.current_dir(dir);
        }
        let status = cmd.status()?;
        Ok(InvocationResult {
            exit_code: status.code(),
        })
    }
}

/// Configured tool locations shared by all runners.
///
/// `directory` is the global tool-search directory (resolution tier b);
/// `paths` maps a logical tool name to an explicit executable, used when the
/// per-invocation settings carry no override of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolRegistry {
    pub directory: Option<PathBuf>,
    pub paths: HashMap<String, PathBuf>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_path(mut self, tool: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(tool.into(), path.into());
        self
    }

    /// Fills `directory` from [`TOOLS_DIR_ENV`] when nothing was configured.
    pub fn with_env_fallback(mut self, env: &dyn Environment) -> Self {
        if self.directory.is_none() {
            self.directory = env.var(TOOLS_DIR_ENV).map(PathBuf::from);
        }
        self
    }

    pub fn path_for(&self, tool: &str) -> Option<&Path> {
        self.paths.get(tool).map(PathBuf::as_path)
    }
}

/// Bundle of collaborators a tool runner operates against.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    pub fs: &'a dyn FileSystem,
    pub env: &'a dyn Environment,
    pub launcher: &'a dyn ProcessLauncher,
    pub registry: &'a ToolRegistry,
}

impl<'a> Host<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        env: &'a dyn Environment,
        launcher: &'a dyn ProcessLauncher,
        registry: &'a ToolRegistry,
    ) -> Self {
        Self {
            fs,
            env,
            launcher,
            registry,
        }
    }
}

/// Real host collaborators, owned in one place for convenience.
///
/// ```ignore
/// let system = SystemHost::new(ToolRegistry::new());
/// let vstool = VsTool::new(system.host());
/// ```
#[derive(Debug, Default)]
pub struct SystemHost {
    fs: LocalFileSystem,
    env: HostEnvironment,
    launcher: SystemProcessLauncher,
    registry: ToolRegistry,
}

impl SystemHost {
    pub fn new(registry: ToolRegistry) -> Self {
        let env = HostEnvironment;
        Self {
            registry: registry.with_env_fallback(&env),
            fs: LocalFileSystem,
            env,
            launcher: SystemProcessLauncher,
        }
    }

    pub fn host(&self) -> Host<'_> {
        Host::new(&self.fs, &self.env, &self.launcher, &self.registry)
    }
}
