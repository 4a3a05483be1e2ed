use log::{debug, info};

use crate::configuration::types::ToolkitConfig;
use crate::container_management::command::{LxcCommands, ToolCommand};
use crate::container_management::runner::{CommandRunner, SystemRunner};
use crate::container_management::types::{CommandOutput, ContainerSpec, Echo};
use crate::error_handling::types::ContainerError;

/// Wraps the LXC toolkit command-line surface.
///
/// Every call blocks until the external command exits and none of them
/// retries. Output of create/start/attach/stop/destroy is streamed to the
/// terminal as it is produced; listings are captured silently because they
/// are parsed.
pub struct ContainerHandle<R = SystemRunner> {
    runner: R,
    lxc: LxcCommands,
}

impl ContainerHandle<SystemRunner> {
    pub fn new(toolkit: ToolkitConfig) -> Self {
        Self::with_runner(toolkit, SystemRunner)
    }
}

impl<R: CommandRunner> ContainerHandle<R> {
    pub fn with_runner(toolkit: ToolkitConfig, runner: R) -> Self {
        Self {
            runner,
            lxc: LxcCommands::new(toolkit),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Creates the container from the download template.
    pub async fn create(&self, spec: &ContainerSpec) -> Result<(), ContainerError> {
        info!(
            "Creating container {} ({} {} {})",
            spec.name, spec.distribution, spec.release, spec.architecture
        );
        self.run_checked(&self.lxc.create(spec)).await?;
        Ok(())
    }

    pub async fn start(&self, name: &str) -> Result<(), ContainerError> {
        info!("Starting container {}", name);
        self.run_checked(&self.lxc.start(name)).await?;
        Ok(())
    }

    /// Runs `argv` inside the running container `name`.
    ///
    /// A non-zero exit becomes [`ContainerError::CommandFailed`] carrying the
    /// command line, exit code and captured stderr.
    pub async fn exec_in<I, S>(&self, name: &str, argv: I) -> Result<CommandOutput, ContainerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cmd = self.lxc.attach(name, argv);
        self.run_checked(&cmd).await
    }

    /// Returns the raw `lxc-ls` output, or `lxc-ls --fancy` when `fancy` is set.
    ///
    /// Anything written to stderr is treated as a failed query.
    pub async fn list(&self, fancy: bool) -> Result<String, ContainerError> {
        let cmd = self.lxc.list(fancy);
        let output = self.runner.run(&cmd, Echo::Silent).await?;
        Self::reject_stderr(&cmd, &output)?;
        Self::reject_failure(&cmd, &output)?;
        debug!("`{}` returned {} byte(s)", cmd, output.stdout.len());
        Ok(output.stdout)
    }

    /// Stops the container. Any stderr output is fatal.
    pub async fn stop(&self, name: &str) -> Result<(), ContainerError> {
        let cmd = self.lxc.stop(name);
        let output = self.runner.run(&cmd, Echo::Terminal).await?;
        Self::reject_failure(&cmd, &output)?;
        Self::reject_stderr(&cmd, &output)?;
        Ok(())
    }

    /// Destroys the container. Any stderr output is fatal.
    pub async fn destroy(&self, name: &str) -> Result<(), ContainerError> {
        let cmd = self.lxc.destroy(name);
        let output = self.runner.run(&cmd, Echo::Terminal).await?;
        Self::reject_failure(&cmd, &output)?;
        Self::reject_stderr(&cmd, &output)?;
        Ok(())
    }

    async fn run_checked(&self, cmd: &ToolCommand) -> Result<CommandOutput, ContainerError> {
        let output = self.runner.run(cmd, Echo::Terminal).await?;
        Self::reject_failure(cmd, &output)?;
        Ok(output)
    }

    fn reject_failure(cmd: &ToolCommand, output: &CommandOutput) -> Result<(), ContainerError> {
        if output.success() {
            return Ok(());
        }
        Err(ContainerError::CommandFailed {
            command: cmd.to_string(),
            code: output.code,
            stderr: output.stderr.clone(),
        })
    }

    fn reject_stderr(cmd: &ToolCommand, output: &CommandOutput) -> Result<(), ContainerError> {
        if output.stderr.trim().is_empty() {
            return Ok(());
        }
        Err(ContainerError::UnexpectedStderr {
            command: cmd.to_string(),
            stderr: output.stderr.clone(),
        })
    }
}
