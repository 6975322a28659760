//! # xamkit
//!
//! Command-line tool for building, packaging and shipping Xamarin mobile apps.
//!
//! ## Overview
//!
//! `xamkit` is the CLI front end for [`xamkit_sdk`]. It handles:
//!
//! - **Building** - Solutions via the IDE build tool, projects via MSBuild
//! - **Packaging** - Android APKs (optionally signed) and store components
//! - **Shipping** - Component store uploads with retries, cloud test runs
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a starter config
//! xamkit init
//!
//! # Build a solution for the simulator
//! xamkit build App.sln
//!
//! # Package a signed APK and print where it landed
//! xamkit android-package Droid/App.Droid.csproj --signed
//!
//! # Upload every component package under out/, retrying each up to 5 times
//! xamkit upload-component out --pattern "**/*.xam" --max-attempts 5
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `init` | Write a starter `xamkit.toml` |
//! | `build` | Build a solution with vstool |
//! | `archive` | Archive a solution with vstool |
//! | `android-package` | Package an Android project and locate the APK |
//! | `ios-build` | Build an iOS project with MSBuild |
//! | `restore-components` | Restore store components for a solution |
//! | `package-component` | Package a component |
//! | `upload-component` | Upload component packages |
//! | `submit-component` | Submit component packages for review |
//! | `test-cloud` | Start a cloud device test run |
//! | `find-artifact` | Print the newest file matching a pattern |
//!
//! ## CLI Flags
//!
//! Global flags available on all commands:
//!
//! - **`--verbose` / `-v`** - Debug logging, including each rendered command line
//! - **`--config <path>`** - Use this config file instead of discovering one
//! - **`--tools-dir <dir>`** - Global tool-search directory
//! - **`--json`** - Print a machine-readable report instead of plain text
//!
//! Logging is filtered by the `XAMKIT_LOG` environment variable when set.
//!
//! ## Modules
//!
//! - [`config`] - Configuration file support for `xamkit.toml`

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use xamkit_sdk::tools::args::make_absolute;
use xamkit_sdk::tools::artifacts::{self, APK_PATTERN};
use xamkit_sdk::tools::retry::DEFAULT_MAX_ATTEMPTS;
use xamkit_sdk::{
    Artifact, BatchPolicy, ComponentSettings, ComponentTool, HostEnvironment, IosPlatform,
    LocalFileSystem, MsBuild, SystemHost, TestCloud, TestCloudSettings, ToolSettings, VsTool,
};

use config::{CONFIG_FILE_NAME, ConfigResolver, XamkitConfig};

pub mod config;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "XAMKIT_LOG";

/// Build, package and ship Xamarin mobile apps.
#[derive(Parser, Debug)]
#[command(name = "xamkit", author, version, about = "Xamarin build tool driver", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Config file to use instead of discovering xamkit.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Global tool-search directory (overrides config and XAMKIT_TOOLS_DIR)
    #[arg(long, global = true)]
    tools_dir: Option<PathBuf>,

    /// Print a JSON report to stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Per-invocation tool overrides shared by every tool command.
#[derive(Args, Debug, Clone, Default)]
struct ToolArgs {
    /// Explicit tool executable
    #[arg(long)]
    tool_path: Option<PathBuf>,

    /// Working directory for the tool and relative inputs
    #[arg(long)]
    working_dir: Option<PathBuf>,
}

impl From<ToolArgs> for ToolSettings {
    fn from(args: ToolArgs) -> Self {
        ToolSettings {
            tool_path: args.tool_path,
            working_directory: args.working_dir,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
struct CredentialArgs {
    /// Component store account
    #[arg(long, env = "XAMKIT_COMPONENT_EMAIL")]
    email: Option<String>,

    /// Component store password
    #[arg(long, env = "XAMKIT_COMPONENT_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
struct ShipArgs {
    /// Package file, or the search root when --pattern is given
    path: PathBuf,

    /// Glob under PATH selecting several packages, handled one at a time
    #[arg(long)]
    pattern: Option<String>,

    /// Attempts per package (default: config or 3)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Keep going after a package fails and report all failures at the end
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    credentials: CredentialArgs,

    #[command(flatten)]
    tool: ToolArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a starter xamkit.toml.
    Init {
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        output: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Build a solution or project with vstool.
    Build {
        solution: PathBuf,
        /// Configuration and platform, e.g. "Release|iPhone"
        #[arg(long, short = 'c')]
        configuration: Option<String>,
        /// Build target
        #[arg(long, short = 't')]
        target: Option<String>,
        /// Pass -v to vstool
        #[arg(long)]
        tool_verbose: bool,
        #[command(flatten)]
        tool: ToolArgs,
    },
    /// Archive a solution with vstool.
    Archive {
        solution: PathBuf,
        /// Limit the archive to one project
        #[arg(long, short = 'p')]
        project: Option<String>,
        #[arg(long, short = 'c')]
        configuration: Option<String>,
        #[arg(long)]
        tool_verbose: bool,
        #[command(flatten)]
        tool: ToolArgs,
    },
    /// Package an Android project with MSBuild and print the newest APK.
    AndroidPackage {
        project: PathBuf,
        /// Sign the package and look for *-Signed.apk
        #[arg(long, overrides_with = "no_signed")]
        signed: bool,
        /// Build an unsigned package even if the config asks for signing
        #[arg(long, overrides_with = "signed")]
        no_signed: bool,
        #[arg(long, short = 'c')]
        configuration: Option<String>,
        /// Extra MSBuild property, repeatable
        #[arg(long = "property", short = 'p', value_parser = parse_property)]
        properties: Vec<(String, String)>,
        #[command(flatten)]
        tool: ToolArgs,
    },
    /// Build an iOS project with MSBuild.
    IosBuild {
        project: PathBuf,
        #[arg(long, value_enum, default_value_t = PlatformArg::Simulator)]
        platform: PlatformArg,
        #[arg(long, short = 'c')]
        configuration: Option<String>,
        #[arg(long = "property", short = 'p', value_parser = parse_property)]
        properties: Vec<(String, String)>,
        #[command(flatten)]
        tool: ToolArgs,
    },
    /// Restore store components referenced by a solution.
    RestoreComponents {
        solution: PathBuf,
        #[command(flatten)]
        credentials: CredentialArgs,
        #[command(flatten)]
        tool: ToolArgs,
    },
    /// Package the component described in a directory.
    PackageComponent {
        dir: PathBuf,
        #[command(flatten)]
        tool: ToolArgs,
    },
    /// Upload component packages to the store.
    UploadComponent(ShipArgs),
    /// Submit component packages for review.
    SubmitComponent(ShipArgs),
    /// Upload an app and its UI tests and start a cloud device run.
    TestCloud {
        app: PathBuf,
        #[arg(long, env = "XAMKIT_TEST_CLOUD_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Device selection hash
        #[arg(long)]
        devices: Option<String>,
        #[arg(long)]
        user: Option<String>,
        /// Directory of compiled UI test assemblies
        #[arg(long)]
        assembly_dir: Option<PathBuf>,
        #[arg(long)]
        series: Option<String>,
        #[arg(long)]
        locale: Option<String>,
        #[arg(long)]
        nunit_xml: Option<PathBuf>,
        #[arg(long)]
        fixture: Option<String>,
        #[arg(long)]
        dsym: Option<PathBuf>,
        #[command(flatten)]
        tool: ToolArgs,
    },
    /// Print the most recently modified file matching a pattern.
    FindArtifact {
        root: PathBuf,
        #[arg(long, default_value = APK_PATTERN)]
        pattern: String,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum PlatformArg {
    Simulator,
    Device,
}

impl From<PlatformArg> for IosPlatform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Simulator => IosPlatform::Simulator,
            PlatformArg::Device => IosPlatform::Device,
        }
    }
}

fn parse_property(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {:?}", raw)),
    }
}

/// What a command did, printed as text or JSON.
#[derive(Debug, Serialize, PartialEq)]
struct Report {
    command: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact: Option<ArtifactReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<PathBuf>,
}

impl Report {
    fn new(command: &'static str, message: impl Into<String>) -> Self {
        Self {
            command,
            message: message.into(),
            artifact: None,
            files: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct ArtifactReport {
    path: PathBuf,
    /// Seconds since the Unix epoch.
    modified: Option<u64>,
}

impl From<Artifact> for ArtifactReport {
    fn from(artifact: Artifact) -> Self {
        Self {
            modified: artifact
                .modified
                .duration_since(UNIX_EPOCH)
                .ok()
                .map(|d| d.as_secs()),
            path: artifact.path,
        }
    }
}

/// Loaded configuration plus the real host every command runs against.
struct App {
    resolver: ConfigResolver,
    config: XamkitConfig,
    base_dir: PathBuf,
    system: SystemHost,
}

impl App {
    fn load(config_path: Option<&Path>, tools_dir: Option<&Path>) -> Result<Self> {
        let resolver = match config_path {
            Some(path) => ConfigResolver::from_path(path)?,
            None => ConfigResolver::new()?,
        };
        let cwd = env::current_dir().context("Failed to get current directory")?;
        Ok(Self::from_resolver(resolver, &cwd, tools_dir))
    }

    fn from_resolver(resolver: ConfigResolver, cwd: &Path, tools_dir: Option<&Path>) -> Self {
        if let Some(path) = &resolver.config_path {
            debug!(path = %path.display(), "using config file");
        }
        let base_dir = resolver.base_dir(cwd);
        let config = resolver.config();
        let mut registry = config.tool_registry(&base_dir, &HostEnvironment);
        if let Some(dir) = tools_dir {
            registry.directory = Some(make_absolute(dir, cwd));
        }
        Self {
            resolver,
            config,
            base_dir,
            system: SystemHost::new(registry),
        }
    }

    fn component_settings(
        &self,
        credentials: CredentialArgs,
        max_attempts: Option<u32>,
        continue_on_error: bool,
        tool: ToolArgs,
    ) -> Result<ComponentSettings> {
        let mut settings = self.config.component_settings(env_lookup)?;
        settings.retry.max_attempts = self.resolver.resolve(
            max_attempts,
            |c| Some(c.component.max_attempts),
            DEFAULT_MAX_ATTEMPTS,
        );
        if continue_on_error {
            settings.batch = BatchPolicy::Continue;
        }
        if let Some(email) = credentials.email {
            settings.email = Some(email);
        }
        if let Some(password) = credentials.password {
            settings.password = Some(password);
        }
        settings.tool = tool.into();
        Ok(settings)
    }

    /// `--signed`/`--no-signed` win over `[android] signed`.
    fn signed(&self, signed: bool, no_signed: bool) -> bool {
        let cli = match (signed, no_signed) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        self.resolver.resolve(cli, |c| Some(c.android.signed), false)
    }
}

fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok()
}

pub fn run() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let report = match cli.command {
        Command::Init { output, force } => cmd_init(&output, force)?,
        command => {
            let app = App::load(cli.config.as_deref(), cli.tools_dir.as_deref())?;
            execute(&app, command)?
        }
    };
    emit(&report, cli.json)
}

fn execute(app: &App, command: Command) -> Result<Report> {
    let host = app.system.host();
    match command {
        Command::Init { output, force } => cmd_init(&output, force),
        Command::Build {
            solution,
            configuration,
            target,
            tool_verbose,
            tool,
        } => {
            let mut settings = app.config.vstool_settings();
            if let Some(configuration) = configuration {
                settings.configuration = configuration;
            }
            if let Some(target) = target {
                settings.target = target;
            }
            settings.verbose |= tool_verbose;
            settings.tool = tool.into();

            VsTool::new(host)
                .build(&solution, &settings)
                .with_context(|| format!("building {:?}", solution))?;
            Ok(Report::new(
                "build",
                format!("Built {:?} ({})", solution, settings.configuration),
            ))
        }
        Command::Archive {
            solution,
            project,
            configuration,
            tool_verbose,
            tool,
        } => {
            let mut settings = app.config.vstool_settings();
            if let Some(configuration) = configuration {
                settings.configuration = configuration;
            }
            settings.verbose |= tool_verbose;
            settings.tool = tool.into();

            VsTool::new(host)
                .archive(&solution, project.as_deref(), &settings)
                .with_context(|| format!("archiving {:?}", solution))?;
            Ok(Report::new("archive", format!("Archived {:?}", solution)))
        }
        Command::AndroidPackage {
            project,
            signed,
            no_signed,
            configuration,
            properties,
            tool,
        } => {
            let signed = app.signed(signed, no_signed);
            let mut settings = app.config.msbuild_settings();
            if let Some(configuration) = configuration {
                settings.configuration = configuration;
            }
            settings.properties.extend(properties);
            settings.tool = tool.into();

            let apk = MsBuild::new(host)
                .package_android(&project, signed, &settings)
                .with_context(|| format!("packaging {:?}", project))?;
            match apk {
                Some(apk) => {
                    let mut report =
                        Report::new("android-package", format!("Built Android APK at {:?}", apk.path));
                    report.artifact = Some(apk.into());
                    Ok(report)
                }
                None => bail!(
                    "build succeeded but no {} was found under {:?}",
                    artifacts::apk_pattern(signed),
                    project.parent().unwrap_or(Path::new("."))
                ),
            }
        }
        Command::IosBuild {
            project,
            platform,
            configuration,
            properties,
            tool,
        } => {
            let mut settings = app.config.msbuild_settings();
            if let Some(configuration) = configuration {
                settings.configuration = configuration;
            }
            settings.properties.extend(properties);
            settings.tool = tool.into();

            let platform = IosPlatform::from(platform);
            MsBuild::new(host)
                .build_ios(&project, platform, &settings)
                .with_context(|| format!("building {:?}", project))?;
            Ok(Report::new(
                "ios-build",
                format!("Built {:?} for {}", project, platform.as_str()),
            ))
        }
        Command::RestoreComponents {
            solution,
            credentials,
            tool,
        } => {
            let settings = app.component_settings(credentials, None, false, tool)?;
            ComponentTool::new(host)
                .restore(&solution, &settings)
                .with_context(|| format!("restoring components for {:?}", solution))?;
            Ok(Report::new(
                "restore-components",
                format!("Restored components for {:?}", solution),
            ))
        }
        Command::PackageComponent { dir, tool } => {
            let settings = ComponentSettings {
                tool: tool.into(),
                ..ComponentSettings::default()
            };
            ComponentTool::new(host)
                .package(&dir, &settings)
                .with_context(|| format!("packaging component in {:?}", dir))?;
            Ok(Report::new(
                "package-component",
                format!("Packaged component in {:?}", dir),
            ))
        }
        Command::UploadComponent(args) => ship(app, ShipCommand::Upload, args),
        Command::SubmitComponent(args) => ship(app, ShipCommand::Submit, args),
        Command::TestCloud {
            app: app_path,
            api_key,
            devices,
            user,
            assembly_dir,
            series,
            locale,
            nunit_xml,
            fixture,
            dsym,
            tool,
        } => {
            let mut settings: TestCloudSettings =
                app.config.test_cloud_settings(&app.base_dir, env_lookup)?;
            if let Some(api_key) = api_key {
                settings.api_key = api_key;
            }
            if let Some(devices) = devices {
                settings.devices = devices;
            }
            if let Some(user) = user {
                settings.user = user;
            }
            if let Some(dir) = assembly_dir {
                settings.assembly_dir = dir;
            }
            if let Some(series) = series {
                settings.series = series;
            }
            if let Some(locale) = locale {
                settings.locale = locale;
            }
            settings.nunit_xml = nunit_xml;
            settings.fixture = fixture;
            settings.dsym = dsym;
            settings.tool = tool.into();

            TestCloud::new(host)
                .submit(&app_path, &settings)
                .with_context(|| format!("submitting {:?} to test cloud", app_path))?;
            Ok(Report::new(
                "test-cloud",
                format!(
                    "Submitted {:?} to test cloud (devices {}, series {})",
                    app_path, settings.devices, settings.series
                ),
            ))
        }
        Command::FindArtifact { root, pattern } => {
            let cwd = env::current_dir().context("Failed to get current directory")?;
            let root = make_absolute(&root, &cwd);
            if !root.is_dir() {
                bail!("search root {:?} is not a directory", root);
            }
            match artifacts::find_latest(&LocalFileSystem, &root, &pattern)? {
                Some(found) => {
                    let mut report =
                        Report::new("find-artifact", found.path.display().to_string());
                    report.artifact = Some(found.into());
                    Ok(report)
                }
                None => bail!("no file matching {:?} under {:?}", pattern, root),
            }
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum ShipCommand {
    Upload,
    Submit,
}

impl ShipCommand {
    fn name(self) -> &'static str {
        match self {
            ShipCommand::Upload => "upload-component",
            ShipCommand::Submit => "submit-component",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            ShipCommand::Upload => "Uploaded",
            ShipCommand::Submit => "Submitted",
        }
    }
}

fn ship(app: &App, command: ShipCommand, args: ShipArgs) -> Result<Report> {
    let settings = app.component_settings(
        args.credentials,
        args.max_attempts,
        args.continue_on_error,
        args.tool,
    )?;
    let tool = ComponentTool::new(app.system.host());

    let files = match (&args.pattern, command) {
        (Some(pattern), ShipCommand::Upload) => tool.upload_all(&args.path, pattern, &settings)?,
        (Some(pattern), ShipCommand::Submit) => tool.submit_all(&args.path, pattern, &settings)?,
        (None, ShipCommand::Upload) => {
            tool.upload(&args.path, &settings)?;
            vec![args.path.clone()]
        }
        (None, ShipCommand::Submit) => {
            tool.submit(&args.path, &settings)?;
            vec![args.path.clone()]
        }
    };

    let mut report = Report::new(
        command.name(),
        format!("{} {} component package(s)", command.past_tense(), files.len()),
    );
    report.files = files;
    Ok(report)
}

fn cmd_init(output: &Path, force: bool) -> Result<Report> {
    if output.exists() && !force {
        bail!(
            "refusing to overwrite existing file: {:?} (pass --force to replace it)",
            output
        );
    }
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory {:?}", parent))?;
    }
    fs::write(output, XamkitConfig::generate_starter_toml())
        .with_context(|| format!("writing file {:?}", output))?;
    Ok(Report::new(
        "init",
        format!("Wrote starter config to {:?}", output),
    ))
}

fn emit(report: &Report, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(report).context("serializing report")?;
        println!("{}", out);
        return Ok(());
    }
    println!("{}", report.message);
    if report.files.len() > 1 {
        for file in &report.files {
            println!("  {}", file.display());
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when run() is embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn app_with(config: XamkitConfig) -> App {
        let resolver = ConfigResolver {
            config: Some(config),
            config_path: Some(PathBuf::from("/repo/xamkit.toml")),
        };
        App::from_resolver(resolver, Path::new("/repo/src"), None)
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_build_with_overrides() {
        let cli = Cli::try_parse_from([
            "xamkit",
            "-v",
            "build",
            "App.sln",
            "-c",
            "Release|iPhone",
            "--tool-path",
            "/opt/vstool",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Build {
                solution,
                configuration,
                tool,
                ..
            } => {
                assert_eq!(solution, PathBuf::from("App.sln"));
                assert_eq!(configuration.as_deref(), Some("Release|iPhone"));
                assert_eq!(tool.tool_path, Some(PathBuf::from("/opt/vstool")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_upload_batch() {
        let cli = Cli::try_parse_from([
            "xamkit",
            "upload-component",
            "out",
            "--pattern",
            "**/*.xam",
            "--max-attempts",
            "5",
            "--continue-on-error",
        ])
        .unwrap();
        match cli.command {
            Command::UploadComponent(args) => {
                assert_eq!(args.path, PathBuf::from("out"));
                assert_eq!(args.pattern.as_deref(), Some("**/*.xam"));
                assert_eq!(args.max_attempts, Some(5));
                assert!(args.continue_on_error);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_android_properties() {
        let cli = Cli::try_parse_from([
            "xamkit",
            "android-package",
            "Droid/App.csproj",
            "--signed",
            "-p",
            "AndroidKeyStore=true",
            "-p",
            "AndroidSigningKeyAlias=release",
        ])
        .unwrap();
        match cli.command {
            Command::AndroidPackage {
                signed, properties, ..
            } => {
                assert!(signed);
                assert_eq!(
                    properties,
                    vec![
                        ("AndroidKeyStore".to_string(), "true".to_string()),
                        ("AndroidSigningKeyAlias".to_string(), "release".to_string()),
                    ]
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn property_requires_key_and_equals() {
        assert_eq!(
            parse_property("A=b=c").unwrap(),
            ("A".to_string(), "b=c".to_string())
        );
        assert!(parse_property("novalue").is_err());
        assert!(parse_property("=x").is_err());
    }

    #[test]
    fn no_signed_flag_overrides_signed_config() {
        let mut config = XamkitConfig::new();
        config.android.signed = true;
        let app = app_with(config);

        let cli = Cli::try_parse_from(["xamkit", "android-package", "App.csproj", "--no-signed"])
            .unwrap();
        let Command::AndroidPackage {
            signed, no_signed, ..
        } = cli.command
        else {
            panic!("expected android-package");
        };
        assert!(!app.signed(signed, no_signed));
        assert!(app.signed(false, false));

        let cli = Cli::try_parse_from([
            "xamkit",
            "android-package",
            "App.csproj",
            "--no-signed",
            "--signed",
        ])
        .unwrap();
        let Command::AndroidPackage {
            signed, no_signed, ..
        } = cli.command
        else {
            panic!("expected android-package");
        };
        assert!(app.signed(signed, no_signed));

        let unsigned_by_default = app_with(XamkitConfig::new());
        assert!(!unsigned_by_default.signed(false, false));
        assert!(unsigned_by_default.signed(true, false));
    }

    #[test]
    fn component_settings_prefer_cli_over_config() {
        let mut config = XamkitConfig::new();
        config.component.max_attempts = 5;
        config.component.email = Some("config@example.com".into());
        let app = app_with(config);

        let settings = app
            .component_settings(CredentialArgs::default(), None, false, ToolArgs::default())
            .unwrap();
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.email.as_deref(), Some("config@example.com"));
        assert_eq!(settings.batch, BatchPolicy::Abort);

        let credentials = CredentialArgs {
            email: Some("cli@example.com".into()),
            password: Some("pw".into()),
        };
        let settings = app
            .component_settings(credentials, Some(2), true, ToolArgs::default())
            .unwrap();
        assert_eq!(settings.retry.max_attempts, 2);
        assert_eq!(settings.email.as_deref(), Some("cli@example.com"));
        assert_eq!(settings.password.as_deref(), Some("pw"));
        assert_eq!(settings.batch, BatchPolicy::Continue);
    }

    #[test]
    fn zero_attempts_fails_before_any_launch() {
        let app = app_with(XamkitConfig::new());
        let args = ShipArgs {
            path: PathBuf::from("/nonexistent/Pkg.xam"),
            max_attempts: Some(0),
            ..ShipArgs::default()
        };
        let err = ship(&app, ShipCommand::Upload, args).unwrap_err();
        assert!(err.to_string().contains("max_attempts must be at least 1"));
    }

    #[test]
    fn tools_dir_flag_overrides_config() {
        let mut config = XamkitConfig::new();
        config.tools.directory = Some(PathBuf::from("tools"));
        let resolver = ConfigResolver {
            config: Some(config.clone()),
            config_path: Some(PathBuf::from("/repo/xamkit.toml")),
        };
        let app = App::from_resolver(resolver, Path::new("/repo"), None);
        assert_eq!(
            app.system.host().registry.directory,
            Some(PathBuf::from("/repo/tools"))
        );

        let resolver = ConfigResolver {
            config: Some(config),
            config_path: Some(PathBuf::from("/repo/xamkit.toml")),
        };
        let app = App::from_resolver(resolver, Path::new("/repo"), Some(Path::new("/override")));
        assert_eq!(
            app.system.host().registry.directory,
            Some(PathBuf::from("/override"))
        );
    }

    #[test]
    fn init_writes_config_and_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        cmd_init(&output, false).unwrap();
        let written = XamkitConfig::load_from_file(&output).unwrap();
        assert_eq!(written, XamkitConfig::default());

        let err = cmd_init(&output, false).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
        cmd_init(&output, true).unwrap();
    }

    #[test]
    fn report_json_shape() {
        let mut report = Report::new("android-package", "Built Android APK");
        report.artifact = Some(ArtifactReport::from(Artifact {
            path: PathBuf::from("/src/app-Signed.apk"),
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(42),
        }));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["command"], "android-package");
        assert_eq!(value["artifact"]["path"], "/src/app-Signed.apk");
        assert_eq!(value["artifact"]["modified"], 42);
        assert!(value.get("files").is_none());
    }
}
