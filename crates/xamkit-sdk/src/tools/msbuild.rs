//! MSBuild runner for Android packaging and iOS builds.
//!
//! Android packaging runs one of two targets, then looks for the produced
//! APK under the project directory:
//!
//! | `signed` | Target | Search pattern |
//! |----------|--------|----------------|
//! | `false` | `PackageForAndroid` | `**/*.apk` |
//! | `true` | `SignAndroidPackage` | `**/*-Signed.apk` |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::host::Host;
use crate::tools::args::ArgumentSequence;
use crate::tools::artifacts;
use crate::tools::resolver::ToolSpec;
use crate::tools::runner::{ToolRunner, ToolSettings};
use crate::types::{Artifact, ToolError};

pub static MSBUILD: ToolSpec = ToolSpec {
    name: "msbuild",
    unix_executables: &["msbuild", "xbuild"],
    windows_executables: &["MSBuild.exe", "msbuild.exe"],
    fallback_paths: &[
        "/Library/Frameworks/Mono.framework/Versions/Current/Commands/msbuild",
        "/Library/Frameworks/Mono.framework/Versions/Current/Commands/xbuild",
        r"C:\Program Files\Microsoft Visual Studio\2022\Enterprise\MSBuild\Current\Bin\MSBuild.exe",
        r"C:\Program Files\Microsoft Visual Studio\2022\Professional\MSBuild\Current\Bin\MSBuild.exe",
        r"C:\Program Files\Microsoft Visual Studio\2022\Community\MSBuild\Current\Bin\MSBuild.exe",
    ],
};

pub const PACKAGE_TARGET: &str = "PackageForAndroid";
pub const SIGN_TARGET: &str = "SignAndroidPackage";

/// iOS build destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IosPlatform {
    #[default]
    Simulator,
    Device,
}

impl IosPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            IosPlatform::Simulator => "iPhoneSimulator",
            IosPlatform::Device => "iPhone",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsBuildSettings {
    pub tool: ToolSettings,
    pub configuration: String,
    /// Extra `/p:Key=Value` properties, emitted in key order.
    pub properties: BTreeMap<String, String>,
    /// `/v:<level>` when set.
    pub verbosity: Option<String>,
}

impl Default for MsBuildSettings {
    fn default() -> Self {
        Self {
            tool: ToolSettings::default(),
            configuration: "Release".to_string(),
            properties: BTreeMap::new(),
            verbosity: None,
        }
    }
}

impl MsBuildSettings {
    pub fn configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = configuration.into();
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn verbosity(mut self, level: impl Into<String>) -> Self {
        self.verbosity = Some(level.into());
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

pub fn android_target(signed: bool) -> &'static str {
    if signed { SIGN_TARGET } else { PACKAGE_TARGET }
}

/// `/t:<target> /p:Configuration=<cfg> [/p:K=V ...] [/v:<level>] "<project>"`
pub fn arguments(project: &Path, target: &str, settings: &MsBuildSettings) -> ArgumentSequence {
    let mut args = ArgumentSequence::new();
    args.append_switch("/t", ":", target)
        .append_switch("/p:Configuration", "=", &settings.configuration);
    for (key, value) in &settings.properties {
        args.append_switch(format!("/p:{}", key), "=", value);
    }
    if let Some(level) = &settings.verbosity {
        args.append_switch("/v", ":", level);
    }
    args.append_path(project);
    args
}

pub struct MsBuild<'a> {
    runner: ToolRunner<'a>,
}

impl<'a> MsBuild<'a> {
    pub fn new(host: Host<'a>) -> Self {
        Self {
            runner: ToolRunner::new(&MSBUILD, host),
        }
    }

    /// Builds an Android package and returns the newest matching APK.
    ///
    /// `Ok(None)` means the build succeeded but nothing matched the search
    /// pattern; callers decide whether that is a problem.
    pub fn package_android(
        &self,
        project: &Path,
        signed: bool,
        settings: &MsBuildSettings,
    ) -> Result<Option<Artifact>, ToolError> {
        let project = self.runner.require_input(project, &settings.tool)?;
        let target = android_target(signed);
        info!(project = %project.display(), target, "packaging for Android");

        self.runner
            .run(&settings.tool, &arguments(&project, target, settings))?;

        let root = project.parent().unwrap_or(Path::new("/"));
        artifacts::find_latest(self.runner.host().fs, root, artifacts::apk_pattern(signed))
    }

    /// Builds an iOS project for the simulator or a device.
    pub fn build_ios(
        &self,
        project: &Path,
        platform: IosPlatform,
        settings: &MsBuildSettings,
    ) -> Result<(), ToolError> {
        let project = self.runner.require_input(project, &settings.tool)?;
        info!(project = %project.display(), platform = platform.as_str(), "building for iOS");

        let settings = settings.clone().property("Platform", platform.as_str());
        self.runner
            .run(&settings.tool, &arguments(&project, "Build", &settings))
    }
}
