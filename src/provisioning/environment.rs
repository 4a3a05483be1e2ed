//! Host checks and auto-detection of the container's architecture,
//! distribution and release.

use log::{debug, info};

use crate::configuration::types::ToolkitConfig;
use crate::container_management::command::ToolCommand;
use crate::container_management::runner::CommandRunner;
use crate::container_management::types::{Architecture, ContainerSpec, Echo};
use crate::error_handling::types::EnvironmentError;

/// Refuses to run anywhere but Linux; LXC does not exist elsewhere.
pub fn ensure_linux() -> Result<(), EnvironmentError> {
    ensure_supported_os(std::env::consts::OS)
}

fn ensure_supported_os(os: &str) -> Result<(), EnvironmentError> {
    if os == "linux" {
        Ok(())
    } else {
        Err(EnvironmentError::UnsupportedPlatform(os.to_string()))
    }
}

/// Values given on the command line; `None` means auto-detect.
#[derive(Debug, Clone, Default)]
pub struct SpecOverrides {
    pub architecture: Option<String>,
    pub distribution: Option<String>,
    pub release: Option<String>,
}

/// Stands in for fields that are neither given nor detected.
pub const UNSPECIFIED: &str = "unspecified";

/// Queries the host with `uname` and `lsb_release`.
pub struct HostProbe<'a, R> {
    runner: &'a R,
    toolkit: &'a ToolkitConfig,
}

impl<'a, R: CommandRunner> HostProbe<'a, R> {
    pub fn new(runner: &'a R, toolkit: &'a ToolkitConfig) -> Self {
        Self { runner, toolkit }
    }

    /// Kernel machine string, e.g. `x86_64`.
    pub async fn machine(&self) -> Result<String, EnvironmentError> {
        self.query(ToolCommand::new(&self.toolkit.uname).arg("-m"))
            .await
    }

    /// Distributor id, lowercased, e.g. `ubuntu`.
    pub async fn distribution(&self) -> Result<String, EnvironmentError> {
        let id = self
            .query(ToolCommand::new(&self.toolkit.lsb_release).args(["-s", "-i"]))
            .await?;
        Ok(id.to_lowercase())
    }

    /// Release codename, lowercased, e.g. `focal`.
    pub async fn release(&self) -> Result<String, EnvironmentError> {
        let codename = self
            .query(ToolCommand::new(&self.toolkit.lsb_release).args(["-s", "-c"]))
            .await?;
        Ok(codename.to_lowercase())
    }

    async fn query(&self, cmd: ToolCommand) -> Result<String, EnvironmentError> {
        let failed = |detail: String| EnvironmentError::HostQueryFailed {
            command: cmd.to_string(),
            detail,
        };

        let output = self
            .runner
            .run(&cmd, Echo::Silent)
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !output.stderr.trim().is_empty() {
            return Err(failed(output.stderr.trim().to_string()));
        }
        if !output.success() {
            return Err(failed(format!("exit status {:?}", output.code)));
        }

        let value = output.stdout.trim().to_string();
        if value.is_empty() {
            return Err(failed("empty output".to_string()));
        }
        debug!("`{}` -> {}", cmd, value);
        Ok(value)
    }

    /// Spec for a run. An adopted container is never re-created, so its spec
    /// is only logged and the host is not queried.
    pub async fn spec_for(
        &self,
        name: &str,
        overrides: SpecOverrides,
        use_existing: bool,
    ) -> Result<ContainerSpec, EnvironmentError> {
        if use_existing {
            existing_spec(name, overrides)
        } else {
            self.resolve_spec(name, overrides).await
        }
    }

    /// Builds the [`ContainerSpec`], querying the host only for fields the
    /// operator left out.
    pub async fn resolve_spec(
        &self,
        name: &str,
        overrides: SpecOverrides,
    ) -> Result<ContainerSpec, EnvironmentError> {
        let name = normalize_name(name)?;

        let architecture = match overrides.architecture {
            Some(arch) => arch.parse::<Architecture>().unwrap_or_else(|e| match e {}),
            None => Architecture::from_host_machine(&self.machine().await?),
        };
        let distribution = match overrides.distribution {
            Some(dist) => dist.trim().to_lowercase(),
            None => self.distribution().await?,
        };
        let release = match overrides.release {
            Some(release) => release.trim().to_lowercase(),
            None => self.release().await?,
        };

        let spec = ContainerSpec {
            name,
            architecture,
            distribution,
            release,
        };
        info!(
            "Container spec: name={} arch={} dist={} release={}",
            spec.name, spec.architecture, spec.distribution, spec.release
        );
        Ok(spec)
    }
}

/// Spec for adopting an existing container from the operator's values alone.
/// Omitted fields are recorded as [`UNSPECIFIED`].
pub fn existing_spec(name: &str, overrides: SpecOverrides) -> Result<ContainerSpec, EnvironmentError> {
    let given = |value: Option<String>| {
        value
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
    };
    let architecture = match given(overrides.architecture) {
        Some(arch) => arch.parse::<Architecture>().unwrap_or_else(|e| match e {}),
        None => Architecture::Other(UNSPECIFIED.to_string()),
    };

    let spec = ContainerSpec {
        name: normalize_name(name)?,
        architecture,
        distribution: given(overrides.distribution).unwrap_or_else(|| UNSPECIFIED.to_string()),
        release: given(overrides.release).unwrap_or_else(|| UNSPECIFIED.to_string()),
    };
    info!(
        "Adopting existing container {} (arch={} dist={} release={})",
        spec.name, spec.architecture, spec.distribution, spec.release
    );
    Ok(spec)
}

/// Strips the single quotes operators tend to paste around names and rejects
/// an empty result.
pub fn normalize_name(raw: &str) -> Result<String, EnvironmentError> {
    let name = raw.trim().trim_matches('\'');
    if name.is_empty() {
        return Err(EnvironmentError::InvalidArgument(
            "container name must not be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}
