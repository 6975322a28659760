//! Cloud device-testing uploader (`test-cloud`).

use std::path::{Path, PathBuf};

use tracing::info;

use crate::host::Host;
use crate::tools::args::{ArgumentSequence, make_absolute};
use crate::tools::resolver::ToolSpec;
use crate::tools::runner::{ToolRunner, ToolSettings};
use crate::types::ToolError;

pub static TEST_CLOUD: ToolSpec = ToolSpec {
    name: "test-cloud",
    unix_executables: &["test-cloud"],
    windows_executables: &["test-cloud.exe"],
    fallback_paths: &[],
};

/// One cloud test run. Everything but the app itself lives here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCloudSettings {
    pub tool: ToolSettings,
    /// Account API key, never logged.
    pub api_key: String,
    /// Device selection hash.
    pub devices: String,
    pub user: String,
    /// Directory containing the compiled UI test assemblies.
    pub assembly_dir: PathBuf,
    pub series: String,
    pub locale: String,
    /// Writes NUnit results to this file.
    pub nunit_xml: Option<PathBuf>,
    /// Restricts the run to one fixture.
    pub fixture: Option<String>,
    /// iOS debug symbols.
    pub dsym: Option<PathBuf>,
}

impl Default for TestCloudSettings {
    fn default() -> Self {
        Self {
            tool: ToolSettings::default(),
            api_key: String::new(),
            devices: String::new(),
            user: String::new(),
            assembly_dir: PathBuf::new(),
            series: "master".to_string(),
            locale: "en_US".to_string(),
            nunit_xml: None,
            fixture: None,
            dsym: None,
        }
    }
}

impl TestCloudSettings {
    pub fn new(
        api_key: impl Into<String>,
        devices: impl Into<String>,
        user: impl Into<String>,
        assembly_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            devices: devices.into(),
            user: user.into(),
            assembly_dir: assembly_dir.into(),
            ..Self::default()
        }
    }

    pub fn series(mut self, series: impl Into<String>) -> Self {
        self.series = series.into();
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn nunit_xml(mut self, path: impl Into<PathBuf>) -> Self {
        self.nunit_xml = Some(path.into());
        self
    }

    pub fn fixture(mut self, fixture: impl Into<String>) -> Self {
        self.fixture = Some(fixture.into());
        self
    }

    pub fn dsym(mut self, path: impl Into<PathBuf>) -> Self {
        self.dsym = Some(path.into());
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

    fn validate(&self) -> Result<(), ToolError> {
        let missing: Vec<&str> = [
            ("api_key", self.api_key.is_empty()),
            ("devices", self.devices.is_empty()),
            ("user", self.user.is_empty()),
            ("assembly_dir", self.assembly_dir.as_os_str().is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, empty)| empty.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(ToolError::Config(format!(
                "test cloud settings missing: {}. Set them under [test_cloud] in xamkit.toml or pass them as flags",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

/// `submit "<app>" <api-key> --devices <hash> --series <s> --locale <l>
/// --user <email> --assembly-dir "<dir>" [--nunit-xml "<f>"] [--fixture <n>] [--dsym "<f>"]`
///
/// Relative optional paths are resolved against `base`.
pub fn arguments(app: &Path, settings: &TestCloudSettings, base: &Path) -> ArgumentSequence {
    let absolute = |p: &PathBuf| make_absolute(p, base).display().to_string();
    let nunit_xml = settings.nunit_xml.as_ref().map(absolute);
    let dsym = settings.dsym.as_ref().map(absolute);

    let mut args = ArgumentSequence::new();
    args.append("submit")
        .append_path(app)
        .append_secret(&settings.api_key)
        .append("--devices")
        .append(&settings.devices)
        .append("--series")
        .append(&settings.series)
        .append("--locale")
        .append(&settings.locale)
        .append("--user")
        .append(&settings.user)
        .append("--assembly-dir")
        .append_path(&make_absolute(&settings.assembly_dir, base))
        .append_option_quoted("--nunit-xml", nunit_xml.as_deref())
        .append_option("--fixture", settings.fixture.as_deref())
        .append_option_quoted("--dsym", dsym.as_deref());
    args
}

pub struct TestCloud<'a> {
    runner: ToolRunner<'a>,
}

impl<'a> TestCloud<'a> {
    pub fn new(host: Host<'a>) -> Self {
        Self {
            runner: ToolRunner::new(&TEST_CLOUD, host),
        }
    }

    /// Uploads an app package and its UI tests and starts a device run.
    ///
    /// # Errors
    /// [`ToolError::Config`] when required settings are empty,
    /// [`ToolError::FileNotFound`] when the app or assembly directory is
    /// missing; neither spawns a process.
    pub fn submit(&self, app: &Path, settings: &TestCloudSettings) -> Result<(), ToolError> {
        settings.validate()?;
        let app = self.runner.require_input(app, &settings.tool)?;
        self.runner
            .require_input(&settings.assembly_dir, &settings.tool)?;
        info!(app = %app.display(), devices = %settings.devices, series = %settings.series, "submitting cloud test run");

        let base = self.runner.base_directory(&settings.tool)?;
        self.runner
            .run(&settings.tool, &arguments(&app, settings, &base))
    }
}
