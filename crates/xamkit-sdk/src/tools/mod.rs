//! Wrappers around the external build tools.
//!
//! Every wrapper follows the same pipeline:
//!
//! 1. **Input check** - relative inputs are made absolute and must exist
//! 2. **Resolution** - the executable is located via [`resolver::resolve`]
//! 3. **Arguments** - an [`ArgumentSequence`] is built from typed settings
//! 4. **Invocation** - the process runs and its exit code is checked
//!
//! ## Tools
//!
//! | Wrapper | Executable | Operations |
//! |---------|------------|------------|
//! | [`VsTool`] | `vstool` / `mdtool` | build, archive |
//! | [`MsBuild`] | `msbuild` / `xbuild` | Android packaging, iOS builds |
//! | [`ComponentTool`] | `xamarin-component` | restore, package, upload, submit |
//! | [`TestCloud`] | `test-cloud` | submit a device test run |
//!
//! Component uploads and submissions go over the network and are retried
//! according to a [`RetryPolicy`].
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use xamkit_sdk::{SystemHost, ToolRegistry, VsTool, VsToolSettings};
//!
//! let system = SystemHost::new(ToolRegistry::new());
//! let vstool = VsTool::new(system.host());
//! vstool.build(
//!     Path::new("App.sln"),
//!     &VsToolSettings::default().configuration("Release|iPhone"),
//! )?;
//! # Ok::<(), xamkit_sdk::ToolError>(())
//! ```

pub mod args;
pub mod artifacts;
pub mod component;
pub mod invoker;
pub mod msbuild;
pub mod resolver;
pub mod retry;
pub mod runner;
pub mod test_cloud;
pub mod vstool;

pub use args::{ArgumentSequence, make_absolute};
pub use component::{BatchPolicy, ComponentSettings, ComponentTool};
pub use invoker::FailureMode;
pub use msbuild::{IosPlatform, MsBuild, MsBuildSettings};
pub use resolver::ToolSpec;
pub use retry::{RetryPolicy, RetryState, with_retry};
pub use runner::{ToolRunner, ToolSettings};
pub use test_cloud::{TestCloud, TestCloudSettings};
pub use vstool::{VsTool, VsToolSettings};
