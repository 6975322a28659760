//! In-memory host collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::host::{Environment, FileSystem, ProcessLauncher};
use crate::types::{InvocationResult, ToolError};

/// Files that "exist", each with a modification time in seconds.
#[derive(Debug, Default)]
pub struct FakeFileSystem {
    files: BTreeMap<PathBuf, Option<u64>>,
}

impl FakeFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into(), Some(0));
        self
    }

    pub fn with_file_at(mut self, path: impl Into<PathBuf>, secs: u64) -> Self {
        self.files.insert(path.into(), Some(secs));
        self
    }

    /// A file that is listed by `glob` but vanishes before its timestamp is read.
    pub fn with_vanishing_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into(), None);
        self
    }
}

impl FileSystem for FakeFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
            || self.files.keys().any(|file| file.starts_with(path))
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ToolError> {
        let pattern =
            glob::Pattern::new(pattern).map_err(|e| ToolError::Pattern(e.to_string()))?;
        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..Default::default()
        };
        Ok(self
            .files
            .keys()
            .filter(|path| pattern.matches_path_with(path, options))
            .cloned()
            .collect())
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        match self.files.get(path) {
            Some(Some(secs)) => Ok(UNIX_EPOCH + Duration::from_secs(*secs)),
            _ => Err(io::Error::new(io::ErrorKind::NotFound, "vanished")),
        }
    }
}

#[derive(Debug)]
pub struct FakeEnvironment {
    vars: HashMap<String, String>,
    windows: bool,
    on_path: HashMap<String, PathBuf>,
    cwd: Option<PathBuf>,
}

impl FakeEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
            windows: false,
            on_path: HashMap::new(),
            cwd: Some(PathBuf::from("/work")),
        }
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn windows(mut self) -> Self {
        self.windows = true;
        self
    }

    /// The working directory lookup fails, as when the directory was removed.
    pub fn without_working_directory(mut self) -> Self {
        self.cwd = None;
        self
    }

    pub fn with_on_path(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.on_path.insert(name.to_string(), path.into());
        self
    }
}

impl Environment for FakeEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn is_windows(&self) -> bool {
        self.windows
    }

    fn find_on_path(&self, name: &str) -> Option<PathBuf> {
        self.on_path.get(name).cloned()
    }

    fn working_directory(&self) -> io::Result<PathBuf> {
        self.cwd.clone().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "working directory was removed")
        })
    }
}

/// Records every launch and answers with scripted exit codes.
///
/// Once the script runs out every further launch exits with 0.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    pub calls: RefCell<Vec<(PathBuf, Vec<String>)>>,
    exit_codes: RefCell<VecDeque<i32>>,
    fail_to_start: Cell<bool>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exit_codes(codes: &[i32]) -> Self {
        let launcher = Self::default();
        launcher.exit_codes.borrow_mut().extend(codes);
        launcher
    }

    pub fn failing_to_start() -> Self {
        let launcher = Self::default();
        launcher.fail_to_start.set(true);
        launcher
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn last_args(&self) -> Vec<String> {
        self.calls
            .borrow()
            .last()
            .map(|(_, args)| args.clone())
            .unwrap_or_default()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(
        &self,
        program: &Path,
        args: &[String],
        _working_directory: Option<&Path>,
    ) -> io::Result<InvocationResult> {
        self.calls
            .borrow_mut()
            .push((program.to_path_buf(), args.to_vec()));
        if self.fail_to_start.get() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
        }
        let code = self.exit_codes.borrow_mut().pop_front().unwrap_or(0);
        Ok(InvocationResult::from_code(code))
    }
}

/// Collects formatted `tracing` output so tests can check what was logged.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + use<> {
        let capture = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || capture.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish()
    }

    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
