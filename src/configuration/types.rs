use serde::Deserialize;

/// Locations of the LXC binaries and the host metadata tools.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    pub lxc_create: String,
    pub lxc_start: String,
    pub lxc_attach: String,
    pub lxc_ls: String,
    pub lxc_stop: String,
    pub lxc_destroy: String,
    /// Template passed to `lxc-create -t`.
    pub template: String,
    pub lsb_release: String,
    pub uname: String,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            lxc_create: "/usr/bin/lxc-create".to_string(),
            lxc_start: "lxc-start".to_string(),
            lxc_attach: "/usr/bin/lxc-attach".to_string(),
            lxc_ls: "/usr/bin/lxc-ls".to_string(),
            lxc_stop: "/usr/bin/lxc-stop".to_string(),
            lxc_destroy: "/usr/bin/lxc-destroy".to_string(),
            template: "download".to_string(),
            lsb_release: "/usr/bin/lsb_release".to_string(),
            uname: "uname".to_string(),
        }
    }
}

/// Baseline package lists merged with the operator's `--add-packages` and
/// `--exclude-packages`.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct PackageDefaults {
    pub install: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for PackageDefaults {
    fn default() -> Self {
        Self {
            install: [
                "openssh-server",
                "software-properties-common",
                "haveged",
                "python",
                "python-dev",
                "python3",
                "python3-dev",
                "perl-modules",
                "ubuntu-server",
                "iptables",
                "libnetfilter-conntrack3",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            exclude: ["lxd", "lxd-client", "lxd-tools", "lxc"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// The admin account that is always provisioned first.
#[derive(PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultAdmin {
    pub name: String,
    pub password: String,
    pub salt: Option<String>,
}

impl Default for DefaultAdmin {
    fn default() -> Self {
        Self {
            name: "admin".to_string(),
            password: "changeme".to_string(),
            salt: None,
        }
    }
}

impl std::fmt::Debug for DefaultAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultAdmin")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("salt", &self.salt)
            .finish()
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct UserDefaults {
    /// Account shipped by the download template, removed before provisioning.
    pub image_default_user: String,
    pub admin_group: String,
    pub shell: String,
    pub first_uid: u32,
    pub default_admin: DefaultAdmin,
}

impl Default for UserDefaults {
    fn default() -> Self {
        Self {
            image_default_user: "ubuntu".to_string(),
            admin_group: "sudo".to_string(),
            shell: "/bin/bash".to_string(),
            first_uid: 1000,
            default_admin: DefaultAdmin::default(),
        }
    }
}
