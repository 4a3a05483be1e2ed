use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid configuration value: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Problems with the host that stop the tools before any container is touched.
#[derive(Debug)]
pub enum EnvironmentError {
    UnsupportedPlatform(String),
    HostQueryFailed { command: String, detail: String },
    InvalidArgument(String),
}

impl fmt::Display for EnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentError::UnsupportedPlatform(os) => write!(
                f,
                "LXC only works on Linux hosts, refusing to run on '{}'",
                os
            ),
            EnvironmentError::HostQueryFailed { command, detail } => {
                write!(f, "Host query `{}` failed: {}", command, detail)
            }
            EnvironmentError::InvalidArgument(e) => write!(f, "Invalid argument: {}", e),
        }
    }
}

impl std::error::Error for EnvironmentError {}

#[derive(Debug)]
pub enum UserDataError {
    IoError(std::io::Error),
    InvalidFieldCount { line: usize, found: usize },
    InvalidAdminField { line: usize, value: String },
    InvalidLoginName { line: usize, name: String },
}

impl fmt::Display for UserDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserDataError::IoError(e) => write!(f, "Unable to read user data file: {}", e),
            UserDataError::InvalidFieldCount { line, found } => write!(
                f,
                "Invalid data provided from datafile at line {}: expected 4 fields, found {}",
                line, found
            ),
            UserDataError::InvalidAdminField { line, value } => write!(
                f,
                "Invalid admin field '{}' at line {}: expected 0, 1, True or False",
                value, line
            ),
            UserDataError::InvalidLoginName { line, name } => {
                write!(f, "Invalid login name '{}' at line {}", name, line)
            }
        }
    }
}

impl std::error::Error for UserDataError {}

impl From<std::io::Error> for UserDataError {
    fn from(err: std::io::Error) -> Self {
        UserDataError::IoError(err)
    }
}

#[derive(Debug)]
pub enum ContainerError {
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    UnexpectedStderr {
        command: String,
        stderr: String,
    },
}

impl ContainerError {
    /// Exit code of the failed command, `None` when it never ran or was killed by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ContainerError::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::SpawnFailed { command, source } => {
                write!(f, "Unable to run `{}`: {}", command, source)
            }
            ContainerError::CommandFailed {
                command,
                code,
                stderr,
            } => {
                match code {
                    Some(c) => write!(f, "Command `{}` exited with status {}", command, c)?,
                    None => write!(f, "Command `{}` was terminated by a signal", command)?,
                }
                if !stderr.trim().is_empty() {
                    write!(f, ": {}", stderr.trim())?;
                }
                Ok(())
            }
            ContainerError::UnexpectedStderr { command, stderr } => write!(
                f,
                "Command `{}` reported an error: {}",
                command,
                stderr.trim()
            ),
        }
    }
}

impl std::error::Error for ContainerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContainerError::SpawnFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure provisioning a single account. Logged and skipped, never fatal.
#[derive(Debug)]
pub enum UserProvisionError {
    HashFailed(String),
    Command(ContainerError),
}

impl fmt::Display for UserProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserProvisionError::HashFailed(e) => write!(f, "Password hashing failed: {}", e),
            UserProvisionError::Command(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for UserProvisionError {}

impl From<ContainerError> for UserProvisionError {
    fn from(err: ContainerError) -> Self {
        UserProvisionError::Command(err)
    }
}

#[derive(Debug)]
pub enum ProvisionError {
    CreateFailed(ContainerError),
    StartFailed(ContainerError),
    InstallFailed(ContainerError),
    RemoveFailed(ContainerError),
    AutoremoveFailed(ContainerError),
    DefaultUserCleanupFailed(ContainerError),
    IdRangeExhausted { first_id: u32, users: usize },
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionError::CreateFailed(e) => {
                write!(f, "Something went wrong when creating the container: {}", e)
            }
            ProvisionError::StartFailed(e) => write!(
                f,
                "Could not start the container, cannot continue with bootstrap: {}",
                e
            ),
            ProvisionError::InstallFailed(e) => write!(
                f,
                "Something went wrong installing additional packages: {}",
                e
            ),
            ProvisionError::RemoveFailed(e) => write!(
                f,
                "Something went wrong removing specified packages: {}",
                e
            ),
            ProvisionError::AutoremoveFailed(e) => write!(
                f,
                "Something went wrong cleaning up after removal with 'autoremove': {}",
                e
            ),
            ProvisionError::DefaultUserCleanupFailed(e) => write!(
                f,
                "Could not delete default user and/or group: {}",
                e
            ),
            ProvisionError::IdRangeExhausted { first_id, users } => write!(
                f,
                "Cannot assign uid/gid to {} user(s) starting at {} without exceeding {}",
                users,
                first_id,
                u32::MAX
            ),
        }
    }
}

impl std::error::Error for ProvisionError {}

#[derive(Debug)]
pub enum DestroyError {
    ListFailed(ContainerError),
    StateQueryFailed {
        name: String,
        source: ContainerError,
    },
    StopFailed {
        name: String,
        source: ContainerError,
    },
    DestroyFailed {
        name: String,
        source: ContainerError,
    },
}

impl fmt::Display for DestroyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestroyError::ListFailed(e) => write!(
                f,
                "Unable to get container list from LXC, cannot continue: {}",
                e
            ),
            DestroyError::StateQueryFailed { name, source } => write!(
                f,
                "An error occurred checking if container [{}] is running, stopping nuke process: {}",
                name, source
            ),
            DestroyError::StopFailed { name, source } => write!(
                f,
                "An error occurred trying to stop container [{}]: {}",
                name, source
            ),
            DestroyError::DestroyFailed { name, source } => write!(
                f,
                "An error occurred trying to destroy container [{}]: {}",
                name, source
            ),
        }
    }
}

impl std::error::Error for DestroyError {}
