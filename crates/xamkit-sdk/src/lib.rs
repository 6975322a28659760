//! Xamarin build tooling for Rust
//!
//! `xamkit-sdk` drives the command-line tools of a Xamarin mobile build:
//! the IDE build tool, MSBuild, the component store client and the cloud
//! test uploader. Each wrapper locates its executable, assembles a
//! deterministic argument list and runs the tool, reporting failures as a
//! typed [`ToolError`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use xamkit_sdk::{MsBuild, MsBuildSettings, SystemHost, ToolRegistry};
//!
//! let registry = ToolRegistry::new().with_directory("/opt/xamarin/tools");
//! let system = SystemHost::new(registry);
//!
//! let apk = MsBuild::new(system.host()).package_android(
//!     Path::new("Droid/App.Droid.csproj"),
//!     true,
//!     &MsBuildSettings::default(),
//! )?;
//! if let Some(apk) = apk {
//!     println!("built {}", apk.path.display());
//! }
//! # Ok::<(), xamkit_sdk::ToolError>(())
//! ```
//!
//! # Architecture
//!
//! - **Host**: filesystem, environment and process launcher behind traits
//! - **Resolver**: finds an executable from overrides, a tools directory,
//!   well-known install paths and `PATH`
//! - **Arguments**: typed tokens with a redacted display form
//! - **Retry**: bounded retries for network-bound operations
//! - **Artifacts**: newest-file search for build outputs

pub mod host;
pub mod tools;
pub mod types;

#[cfg(test)]
mod testing;

pub use host::{
    Environment, FileSystem, Host, HostEnvironment, LocalFileSystem, ProcessLauncher,
    SystemHost, SystemProcessLauncher, TOOLS_DIR_ENV, ToolRegistry,
};
pub use tools::{
    ArgumentSequence, BatchPolicy, ComponentSettings, ComponentTool, FailureMode, IosPlatform,
    MsBuild, MsBuildSettings, RetryPolicy, TestCloud, TestCloudSettings, ToolSettings, VsTool,
    VsToolSettings,
};
pub use types::{Artifact, Configure, InvocationResult, ToolError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
