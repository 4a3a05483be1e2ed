//! Core types used by the container management subsystem.

use std::fmt;
use std::str::FromStr;

/// Container architecture as understood by the LXC download template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Architecture {
    Amd64,
    I386,
    Armhf,
    Arm64,
    /// Anything the mapping table does not know, passed through verbatim.
    Other(String),
}

impl Architecture {
    /// Maps a kernel machine string (`uname -m`) to the LXC architecture name.
    ///
    /// Unknown machines are passed through unchanged rather than rejected, so
    /// `riscv64` stays `riscv64`.
    pub fn from_host_machine(machine: &str) -> Self {
        let machine = machine.trim();
        match machine {
            "x86_64" => Architecture::Amd64,
            "x86" | "i686" => Architecture::I386,
            "armv7l" => Architecture::Armhf,
            "armv8l" | "aarch64" => Architecture::Arm64,
            other => Architecture::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Architecture::Amd64 => "amd64",
            Architecture::I386 => "i386",
            Architecture::Armhf => "armhf",
            Architecture::Arm64 => "arm64",
            Architecture::Other(s) => s.as_str(),
        }
    }
}

impl FromStr for Architecture {
    type Err = std::convert::Infallible;

    /// Parses an explicit `--arch` value. LXC names map to their variant,
    /// anything else is kept as given.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.to_lowercase().as_str() {
            "amd64" => Architecture::Amd64,
            "i386" => Architecture::I386,
            "armhf" => Architecture::Armhf,
            "arm64" => Architecture::Arm64,
            _ => Architecture::Other(s.to_string()),
        })
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of the container to create or adopt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Unique container name passed to every toolkit command.
    pub name: String,
    pub architecture: Architecture,
    /// Lowercase distribution id, e.g. `ubuntu`.
    pub distribution: String,
    /// Lowercase release codename, e.g. `focal`.
    pub release: String,
}

/// Lifecycle state of a container as reported by `lxc-ls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Absent,
    Stopped,
    Running,
}

/// Marker used by `lxc-ls --fancy` in the STATE column of a running container.
pub const RUNNING_MARKER: &str = "RUNNING";

impl ContainerState {
    /// Exact-name membership test against a plain `lxc-ls` listing.
    pub fn is_listed(listing: &str, name: &str) -> bool {
        listing.split_whitespace().any(|entry| entry == name)
    }

    /// Looks for the `RUNNING` marker on the rows of `lxc-ls --fancy` that
    /// belong to `name`. The container is assumed to exist.
    pub fn from_fancy_listing(fancy: &str, name: &str) -> Self {
        let running = fancy
            .lines()
            .filter(|line| line.split_whitespace().next() == Some(name))
            .any(|line| line.split_whitespace().any(|col| col == RUNNING_MARKER));
        if running {
            ContainerState::Running
        } else {
            ContainerState::Stopped
        }
    }
}

/// Whether a command's output is mirrored to the operator's terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    /// Stream stdout/stderr to the terminal while capturing them.
    Terminal,
    /// Capture only; used for listings that are parsed, not shown.
    Silent,
}

/// Result of a finished external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}
