//! Configuration file support for xamkit.
//!
//! This module provides support for `xamkit.toml` configuration files that
//! keep tool locations, build defaults and store credentials out of every
//! command line.
//!
//! ## Configuration File Location
//!
//! The configuration file is searched for in the following order:
//! 1. Current working directory (`./xamkit.toml`)
//! 2. Parent directories (up to the repository root or filesystem root)
//!
//! `--config <path>` skips discovery.
//!
//! ## Example Configuration
//!
//! ```toml
//! [tools]
//! directory = "/opt/xamarin/tools"
//!
//! [tools.paths]
//! msbuild = "/Library/Frameworks/Mono.framework/Commands/msbuild"
//!
//! [vstool]
//! configuration = "Release|iPhone"
//!
//! [android]
//! configuration = "Release"
//! signed = true
//!
//! [component]
//! max_attempts = 3
//! email = "${COMPONENT_EMAIL}"
//! password = "${COMPONENT_PASSWORD}"
//! ```
//!
//! String values holding credentials may reference environment variables as
//! `${NAME}`. Relative paths are resolved against the directory holding the
//! config file.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use xamkit_sdk::tools::args::make_absolute;
use xamkit_sdk::{
    BatchPolicy, ComponentSettings, Environment, MsBuildSettings, RetryPolicy, TestCloudSettings,
    ToolRegistry, VsToolSettings,
};

/// The default configuration file name.
pub const CONFIG_FILE_NAME: &str = "xamkit.toml";

/// Root configuration structure for `xamkit.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct XamkitConfig {
    /// Where to look for tool executables.
    pub tools: ToolsConfig,

    /// Defaults for `build` and `archive`.
    pub vstool: VsToolConfig,

    /// Defaults for Android packaging.
    pub android: AndroidConfig,

    /// Component store account and retry behaviour.
    pub component: ComponentConfig,

    /// Cloud test run defaults.
    pub test_cloud: TestCloudConfig,
}

/// Tool location configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Global tool-search directory.
    ///
    /// Falls back to `XAMKIT_TOOLS_DIR` when unset.
    pub directory: Option<PathBuf>,

    /// Explicit executable per tool, keyed by tool name
    /// (`vstool`, `msbuild`, `xamarin-component`, `test-cloud`).
    pub paths: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VsToolConfig {
    /// Defaults to "Debug|iPhoneSimulator".
    pub configuration: String,

    /// Defaults to "Build".
    pub target: String,

    pub verbose: bool,
}

impl Default for VsToolConfig {
    fn default() -> Self {
        let settings = VsToolSettings::default();
        Self {
            configuration: settings.configuration,
            target: settings.target,
            verbose: settings.verbose,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    /// Defaults to "Release".
    pub configuration: String,

    /// Run the signing target and look for `*-Signed.apk`.
    pub signed: bool,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            configuration: MsBuildSettings::default().configuration,
            signed: false,
        }
    }
}

/// Batch failure handling as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPolicyConfig {
    #[default]
    Abort,
    Continue,
}

impl From<BatchPolicyConfig> for BatchPolicy {
    fn from(value: BatchPolicyConfig) -> Self {
        match value {
            BatchPolicyConfig::Abort => BatchPolicy::Abort,
            BatchPolicyConfig::Continue => BatchPolicy::Continue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// Attempts per upload or submit. Defaults to 3; 0 is rejected.
    pub max_attempts: u32,

    /// Pause between attempts, in milliseconds.
    pub retry_delay_ms: u64,

    pub batch_policy: BatchPolicyConfig,

    /// Store account; supports `${ENV}`.
    pub email: Option<String>,

    /// Store password; supports `${ENV}`.
    pub password: Option<String>,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            max_attempts: RetryPolicy::default().max_attempts,
            retry_delay_ms: 0,
            batch_policy: BatchPolicyConfig::default(),
            email: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TestCloudConfig {
    /// Supports `${ENV}`.
    pub api_key: Option<String>,

    /// Supports `${ENV}`.
    pub user: Option<String>,

    /// Device selection hash.
    pub devices: Option<String>,

    /// Directory of compiled UI test assemblies.
    pub assembly_dir: Option<PathBuf>,

    /// Defaults to "master".
    pub series: String,

    /// Defaults to "en_US".
    pub locale: String,
}

impl Default for TestCloudConfig {
    fn default() -> Self {
        let settings = TestCloudSettings::default();
        Self {
            api_key: None,
            user: None,
            devices: None,
            assembly_dir: None,
            series: settings.series,
            locale: settings.locale,
        }
    }
}

/// Replaces every `${NAME}` in `value` using `lookup`.
///
/// An unset variable is an error naming it; text without `${` is returned
/// unchanged.
pub fn expand_env(value: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            bail!("Unterminated variable reference in config value: {:?}", value);
        };
        let name = &after[..end];
        match lookup(name) {
            Some(v) => out.push_str(&v),
            None => bail!(
                "Environment variable {} is referenced in {} but not set",
                name,
                CONFIG_FILE_NAME
            ),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn expand_opt(
    value: &Option<String>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<String>> {
    value.as_deref().map(|v| expand_env(v, lookup)).transpose()
}

impl XamkitConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from the specified file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: XamkitConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Searches for `xamkit.toml` from the current directory upward.
    pub fn discover() -> Result<Option<(Self, PathBuf)>> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&cwd)
    }

    /// Searches for `xamkit.toml` starting at `start_dir`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some((config, path)))` - Found and loaded configuration with its path
    /// * `Ok(None)` - No configuration file found
    /// * `Err` - If a config file was found but couldn't be parsed
    pub fn discover_from(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.is_file() {
                let config = Self::load_from_file(&config_path)?;
                return Ok(Some((config, config_path)));
            }

            // Stop at repository root or filesystem root
            if current.join(".git").exists() || !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Tool locations with relative paths anchored at `base`, falling back
    /// to `XAMKIT_TOOLS_DIR` for the search directory.
    pub fn tool_registry(&self, base: &Path, env: &dyn Environment) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        if let Some(dir) = &self.tools.directory {
            registry = registry.with_directory(make_absolute(dir, base));
        }
        for (tool, path) in &self.tools.paths {
            registry = registry.with_path(tool.clone(), make_absolute(path, base));
        }
        registry.with_env_fallback(env)
    }

    pub fn vstool_settings(&self) -> VsToolSettings {
        VsToolSettings::default()
            .configuration(self.vstool.configuration.clone())
            .target(self.vstool.target.clone())
            .verbose(self.vstool.verbose)
    }

    pub fn msbuild_settings(&self) -> MsBuildSettings {
        MsBuildSettings::default().configuration(self.android.configuration.clone())
    }

    /// Component settings with `${ENV}` references expanded.
    pub fn component_settings(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ComponentSettings> {
        let c = &self.component;
        let retry =
            RetryPolicy::new(c.max_attempts).delay(Duration::from_millis(c.retry_delay_ms));
        Ok(ComponentSettings {
            email: expand_opt(&c.email, &lookup)?,
            password: expand_opt(&c.password, &lookup)?,
            retry,
            batch: c.batch_policy.into(),
            ..ComponentSettings::default()
        })
    }

    /// Cloud test settings with `${ENV}` references expanded. Required
    /// values left unset here are validated when the run is submitted.
    pub fn test_cloud_settings(
        &self,
        base: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<TestCloudSettings> {
        let t = &self.test_cloud;
        Ok(TestCloudSettings {
            api_key: expand_opt(&t.api_key, &lookup)?.unwrap_or_default(),
            user: expand_opt(&t.user, &lookup)?.unwrap_or_default(),
            devices: t.devices.clone().unwrap_or_default(),
            assembly_dir: t
                .assembly_dir
                .as_deref()
                .map(|p| make_absolute(p, base))
                .unwrap_or_default(),
            series: t.series.clone(),
            locale: t.locale.clone(),
            ..TestCloudSettings::default()
        })
    }

    /// Generates a starter configuration file as a formatted TOML string.
    ///
    /// This includes comments explaining each configuration option.
    pub fn generate_starter_toml() -> String {
        let vstool = VsToolConfig::default();
        let android = AndroidConfig::default();
        let component = ComponentConfig::default();
        let cloud = TestCloudConfig::default();

        format!(
            r#"# xamkit configuration file
# CLI flags override these settings when provided.

[tools]
# Directory searched for tool executables before well-known install
# locations and PATH (default: $XAMKIT_TOOLS_DIR)
# directory = "tools"

[tools.paths]
# Explicit executable per tool
# msbuild = "/Library/Frameworks/Mono.framework/Versions/Current/Commands/msbuild"
# vstool = "/Applications/Visual Studio.app/Contents/MacOS/vstool"

[vstool]
# Solution configuration and platform
configuration = "{vs_configuration}"

# Build target passed as -t:<target>
target = "{vs_target}"

# Pass -v to the tool
verbose = false

[android]
# MSBuild configuration used for packaging
configuration = "{android_configuration}"

# Sign the package and pick up *-Signed.apk
signed = {signed}

[component]
# Attempts per upload or submit (must be at least 1)
max_attempts = {max_attempts}

# Pause between attempts in milliseconds
retry_delay_ms = {retry_delay_ms}

# What a batch upload does when one package fails: "abort" or "continue"
batch_policy = "abort"

# Store credentials, read from the environment
# email = "${{COMPONENT_EMAIL}}"
# password = "${{COMPONENT_PASSWORD}}"

[test_cloud]
# api_key = "${{TEST_CLOUD_API_KEY}}"
# user = "qa@example.com"
# devices = "<device set hash>"
# assembly_dir = "UITests/bin/Release"
series = "{series}"
locale = "{locale}"
"#,
            vs_configuration = vstool.configuration,
            vs_target = vstool.target,
            android_configuration = android.configuration,
            signed = android.signed,
            max_attempts = component.max_attempts,
            retry_delay_ms = component.retry_delay_ms,
            series = cloud.series,
            locale = cloud.locale,
        )
    }
}

/// Configuration resolver that merges config file values with CLI arguments.
///
/// CLI arguments always take precedence over config file values.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    /// Loaded configuration, if any.
    pub config: Option<XamkitConfig>,

    /// Path to the loaded config file, if any.
    pub config_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Discovers configuration from the current directory.
    pub fn new() -> Result<Self> {
        match XamkitConfig::discover()? {
            Some((config, path)) => Ok(Self {
                config: Some(config),
                config_path: Some(path),
            }),
            None => Ok(Self::default()),
        }
    }

    /// Loads an explicitly named config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let config = XamkitConfig::load_from_file(path)?;
        Ok(Self {
            config: Some(config),
            config_path: Some(path.to_path_buf()),
        })
    }

    /// The loaded configuration, or defaults when none was found.
    pub fn config(&self) -> XamkitConfig {
        self.config.clone().unwrap_or_default()
    }

    /// Directory relative config paths are anchored at.
    pub fn base_dir(&self, cwd: &Path) -> PathBuf {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .map(|dir| make_absolute(dir, cwd))
            .unwrap_or_else(|| cwd.to_path_buf())
    }

    /// Resolves a CLI value, using config as fallback.
    ///
    /// The resolved value prefers CLI over config over default.
    pub fn resolve<T, F>(&self, cli_value: Option<T>, config_getter: F, default: T) -> T
    where
        F: FnOnce(&XamkitConfig) -> Option<T>,
    {
        cli_value
            .or_else(|| self.config.as_ref().and_then(config_getter))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use xamkit_sdk::TOOLS_DIR_ENV;

    struct VarsOnly(HashMap<String, String>);

    impl Environment for VarsOnly {
        fn var(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }

        fn is_windows(&self) -> bool {
            false
        }

        fn find_on_path(&self, _name: &str) -> Option<PathBuf> {
            None
        }

        fn working_directory(&self) -> std::io::Result<PathBuf> {
            Ok(PathBuf::from("/work"))
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = XamkitConfig::default();
        assert_eq!(config.vstool.configuration, "Debug|iPhoneSimulator");
        assert_eq!(config.vstool.target, "Build");
        assert_eq!(config.android.configuration, "Release");
        assert!(!config.android.signed);
        assert_eq!(config.component.max_attempts, 3);
        assert_eq!(config.component.batch_policy, BatchPolicyConfig::Abort);
        assert_eq!(config.test_cloud.series, "master");
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        let toml_content = r#"
[tools]
directory = "tools"

[tools.paths]
msbuild = "/opt/mono/bin/msbuild"

[vstool]
configuration = "Release|iPhone"
verbose = true

[android]
signed = true

[component]
max_attempts = 5
retry_delay_ms = 250
batch_policy = "continue"
email = "dev@example.com"

[test_cloud]
devices = "abc123"
locale = "de_DE"
"#;
        std::fs::write(&config_path, toml_content).unwrap();

        let config = XamkitConfig::load_from_file(&config_path).unwrap();
        assert_eq!(config.tools.directory, Some(PathBuf::from("tools")));
        assert_eq!(
            config.tools.paths.get("msbuild"),
            Some(&PathBuf::from("/opt/mono/bin/msbuild"))
        );
        assert_eq!(config.vstool.configuration, "Release|iPhone");
        assert_eq!(config.vstool.target, "Build");
        assert!(config.vstool.verbose);
        assert!(config.android.signed);
        assert_eq!(config.android.configuration, "Release");
        assert_eq!(config.component.max_attempts, 5);
        assert_eq!(config.component.retry_delay_ms, 250);
        assert_eq!(config.component.batch_policy, BatchPolicyConfig::Continue);
        assert_eq!(config.test_cloud.devices.as_deref(), Some("abc123"));
        assert_eq!(config.test_cloud.locale, "de_DE");
        assert_eq!(config.test_cloud.series, "master");
    }

    #[test]
    fn test_invalid_batch_policy_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[component]\nbatch_policy = \"sometimes\"\n").unwrap();

        let err = XamkitConfig::load_from_file(&config_path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_discover_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[android]\nsigned = true\n").unwrap();
        let nested = temp_dir.path().join("src").join("Droid");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, path) = XamkitConfig::discover_from(&nested).unwrap().unwrap();
        assert!(config.android.signed);
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_stops_at_git_root() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "").unwrap();
        let repo = temp_dir.path().join("repo");
        std::fs::create_dir_all(repo.join(".git")).unwrap();

        let result = XamkitConfig::discover_from(&repo).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_expand_env() {
        let lookup = vars(&[("USER_EMAIL", "dev@example.com"), ("PW", "s3cret")]);
        assert_eq!(expand_env("${USER_EMAIL}", &lookup).unwrap(), "dev@example.com");
        assert_eq!(expand_env("pre-${PW}-post", &lookup).unwrap(), "pre-s3cret-post");
        assert_eq!(expand_env("plain", &lookup).unwrap(), "plain");

        let err = expand_env("${MISSING}", &lookup).unwrap_err();
        assert!(err.to_string().contains("MISSING"));
        assert!(expand_env("${OPEN", &lookup).is_err());
    }

    #[test]
    fn test_component_settings_expand_credentials() {
        let mut config = XamkitConfig::new();
        config.component.email = Some("${EMAIL}".into());
        config.component.password = Some("${PASSWORD}".into());
        config.component.max_attempts = 4;
        config.component.retry_delay_ms = 100;
        config.component.batch_policy = BatchPolicyConfig::Continue;

        let settings = config
            .component_settings(vars(&[("EMAIL", "a@b.c"), ("PASSWORD", "pw")]))
            .unwrap();
        assert_eq!(settings.email.as_deref(), Some("a@b.c"));
        assert_eq!(settings.password.as_deref(), Some("pw"));
        assert_eq!(settings.retry.max_attempts, 4);
        assert_eq!(settings.retry.delay, Duration::from_millis(100));
        assert_eq!(settings.batch, BatchPolicy::Continue);
    }

    #[test]
    fn test_tool_registry_anchors_relative_paths() {
        let mut config = XamkitConfig::new();
        config.tools.directory = Some(PathBuf::from("tools"));
        config
            .tools
            .paths
            .insert("vstool".into(), PathBuf::from("bin/vstool"));
        let env = VarsOnly(HashMap::from([(TOOLS_DIR_ENV.to_string(), "/env".to_string())]));

        let registry = config.tool_registry(Path::new("/repo"), &env);
        assert_eq!(registry.directory, Some(PathBuf::from("/repo/tools")));
        assert_eq!(registry.path_for("vstool"), Some(Path::new("/repo/bin/vstool")));
    }

    #[test]
    fn test_tool_registry_env_fallback() {
        let env = VarsOnly(HashMap::from([(TOOLS_DIR_ENV.to_string(), "/env".to_string())]));
        let registry = XamkitConfig::new().tool_registry(Path::new("/repo"), &env);
        assert_eq!(registry.directory, Some(PathBuf::from("/env")));
    }

    #[test]
    fn test_config_resolver() {
        let mut config = XamkitConfig::new();
        config.component.max_attempts = 5;
        let resolver = ConfigResolver {
            config: Some(config),
            config_path: Some(PathBuf::from("/repo/xamkit.toml")),
        };

        // CLI value takes precedence
        let result = resolver.resolve(Some(2), |c| Some(c.component.max_attempts), 3);
        assert_eq!(result, 2);

        // Config value used when CLI is None
        let result: u32 = resolver.resolve(None, |c| Some(c.component.max_attempts), 3);
        assert_eq!(result, 5);

        assert_eq!(resolver.base_dir(Path::new("/elsewhere")), PathBuf::from("/repo"));
        assert_eq!(
            ConfigResolver::default().base_dir(Path::new("/cwd")),
            PathBuf::from("/cwd")
        );
    }

    #[test]
    fn test_generate_starter_toml_parses() {
        let toml = XamkitConfig::generate_starter_toml();
        assert!(toml.contains("configuration = \"Debug|iPhoneSimulator\""));
        assert!(toml.contains("max_attempts = 3"));
        assert!(toml.contains("# password = \"${COMPONENT_PASSWORD}\""));

        let parsed: XamkitConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, XamkitConfig::default());
    }
}
