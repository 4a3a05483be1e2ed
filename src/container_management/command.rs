//! Typed argument vectors for the LXC toolkit and the in-container package manager.

use std::fmt;

use crate::configuration::types::ToolkitConfig;
use crate::container_management::types::ContainerSpec;

/// A program plus its arguments, executed without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn to_tokio(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Builds the LXC toolkit command lines from the configured binary paths.
#[derive(Debug, Clone)]
pub struct LxcCommands {
    toolkit: ToolkitConfig,
}

impl LxcCommands {
    pub fn new(toolkit: ToolkitConfig) -> Self {
        Self { toolkit }
    }

    /// `lxc-create -t download -n NAME -- -d DIST -r RELEASE -a ARCH`
    pub fn create(&self, spec: &ContainerSpec) -> ToolCommand {
        ToolCommand::new(&self.toolkit.lxc_create)
            .args(["-t", self.toolkit.template.as_str(), "-n", spec.name.as_str()])
            .args(["--", "-d", spec.distribution.as_str(), "-r", spec.release.as_str()])
            .args(["-a", spec.architecture.as_str()])
    }

    pub fn start(&self, name: &str) -> ToolCommand {
        ToolCommand::new(&self.toolkit.lxc_start).args(["-n", name])
    }

    /// `lxc-attach -n NAME -- ARGV...`
    pub fn attach<I, S>(&self, name: &str, argv: I) -> ToolCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ToolCommand::new(&self.toolkit.lxc_attach)
            .args(["-n", name, "--"])
            .args(argv)
    }

    pub fn list(&self, fancy: bool) -> ToolCommand {
        let cmd = ToolCommand::new(&self.toolkit.lxc_ls);
        if fancy {
            cmd.arg("--fancy")
        } else {
            cmd
        }
    }

    pub fn stop(&self, name: &str) -> ToolCommand {
        ToolCommand::new(&self.toolkit.lxc_stop).args(["-n", name])
    }

    pub fn destroy(&self, name: &str) -> ToolCommand {
        ToolCommand::new(&self.toolkit.lxc_destroy).args(["-n", name])
    }
}

/// `apt-get` argument vectors run inside the container.
pub mod apt {
    pub fn install<'a>(packages: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        let mut argv = vec!["apt-get".to_string(), "install".to_string(), "-y".to_string()];
        argv.extend(packages.into_iter().cloned());
        argv
    }

    pub fn remove<'a>(packages: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        let mut argv = vec![
            "apt-get".to_string(),
            "remove".to_string(),
            "-y".to_string(),
            "--purge".to_string(),
        ];
        argv.extend(packages.into_iter().cloned());
        argv
    }

    pub fn autoremove() -> Vec<String> {
        ["apt-get", "autoremove", "-y", "--purge"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Account management argument vectors run inside the container.
pub mod accounts {
    pub fn deluser(name: &str) -> Vec<String> {
        vec![
            "deluser".to_string(),
            "--remove-all-files".to_string(),
            name.to_string(),
        ]
    }

    pub fn delgroup_if_empty(name: &str) -> Vec<String> {
        vec![
            "delgroup".to_string(),
            "--only-if-empty".to_string(),
            name.to_string(),
        ]
    }

    pub fn groupadd(gid: u32, name: &str) -> Vec<String> {
        vec![
            "groupadd".to_string(),
            "-g".to_string(),
            gid.to_string(),
            name.to_string(),
        ]
    }

    pub fn useradd(uid: u32, gid: u32, shadow: &str, shell: &str, name: &str) -> Vec<String> {
        vec![
            "useradd".to_string(),
            "--create-home".to_string(),
            "-u".to_string(),
            uid.to_string(),
            "-g".to_string(),
            gid.to_string(),
            "-p".to_string(),
            shadow.to_string(),
            format!("--shell={}", shell),
            name.to_string(),
        ]
    }

    pub fn add_to_group(group: &str, name: &str) -> Vec<String> {
        vec![
            "usermod".to_string(),
            "-a".to_string(),
            "-G".to_string(),
            group.to_string(),
            name.to_string(),
        ]
    }
}
