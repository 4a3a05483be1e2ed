//! Container management subsystem.
//!
//! This module wraps the LXC userspace toolkit (`lxc-create`, `lxc-start`,
//! `lxc-attach`, `lxc-ls`, `lxc-stop`, `lxc-destroy`) behind a small API. The
//! toolkit is an external contract: commands are built as argument vectors
//! and executed through a [`CommandRunner`], never through a shell.
//!
//! Re-exports:
//! - [`ContainerHandle`]: create/start/exec/list/stop/destroy.
//! - [`CommandRunner`], [`SystemRunner`]: process execution seam.
//! - [`ContainerSpec`], [`ContainerState`], [`Architecture`]: core types.
//!
//! Example (non-running):
//! ```ignore
//! use lxc_helpers::configuration::ToolkitConfig;
//! use lxc_helpers::container_management::ContainerHandle;
//!
//! let handle = ContainerHandle::new(ToolkitConfig::default());
//! let listing = handle.list(false).await?;
//! println!("{}", listing);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod command;
pub mod container_handle;
pub mod runner;
pub mod types;

pub use command::{LxcCommands, ToolCommand};
pub use container_handle::ContainerHandle;
pub use runner::{CommandRunner, SystemRunner};
pub use types::{Architecture, CommandOutput, ContainerSpec, ContainerState, Echo};
