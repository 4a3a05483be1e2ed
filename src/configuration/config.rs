use super::types::*;
use crate::error_handling::types::ConfigError;
use crate::provisioning::users::is_valid_login_name;
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no `--config` flag is given.
pub const CONFIG_ENV_VAR: &str = "LXC_HELPERS_CONFIG";

/// Highest accepted `users.first_uid`; keeps a 16-bit block of ids free above it.
pub const MAX_FIRST_UID: u32 = u32::MAX - 65535;

/// Tool configuration shared by `lxc-bootstrap` and `lxc-nuke`.
///
/// Every section falls back to built-in defaults, so an empty file (or no
/// file at all) reproduces the stock behaviour:
///
/// ```toml
/// [toolkit]
/// lxc_create = "/usr/bin/lxc-create"
/// template = "download"
///
/// [packages]
/// install = ["openssh-server", "iptables"]
/// exclude = ["lxd", "lxc"]
///
/// [users]
/// image_default_user = "ubuntu"
/// admin_group = "sudo"
/// first_uid = 1000
///
/// [users.default_admin]
/// name = "admin"
/// password = "changeme"
/// ```
#[derive(Debug, PartialEq, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub toolkit: ToolkitConfig,
    pub packages: PackageDefaults,
    pub users: UserDefaults,
}

impl Config {
    /// Reads and validates a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves the configuration source: explicit path first, then the
    /// `LXC_HELPERS_CONFIG` environment variable, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                info!("Using configuration from {}: {}", CONFIG_ENV_VAR, path);
                Self::from_file(&PathBuf::from(path))
            }
            _ => {
                debug!("No configuration file given, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let binaries = [
            ("toolkit.lxc_create", &self.toolkit.lxc_create),
            ("toolkit.lxc_start", &self.toolkit.lxc_start),
            ("toolkit.lxc_attach", &self.toolkit.lxc_attach),
            ("toolkit.lxc_ls", &self.toolkit.lxc_ls),
            ("toolkit.lxc_stop", &self.toolkit.lxc_stop),
            ("toolkit.lxc_destroy", &self.toolkit.lxc_destroy),
            ("toolkit.template", &self.toolkit.template),
            ("toolkit.lsb_release", &self.toolkit.lsb_release),
            ("toolkit.uname", &self.toolkit.uname),
            ("users.image_default_user", &self.users.image_default_user),
            ("users.admin_group", &self.users.admin_group),
            ("users.shell", &self.users.shell),
        ];
        for (key, value) in binaries {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!("{} must not be empty", key)));
            }
        }

        if self.users.first_uid == 0 || self.users.first_uid > MAX_FIRST_UID {
            return Err(ConfigError::InvalidValue(format!(
                "users.first_uid must be between 1 and {}",
                MAX_FIRST_UID
            )));
        }

        if !is_valid_login_name(&self.users.default_admin.name) {
            return Err(ConfigError::InvalidValue(format!(
                "users.default_admin.name '{}' is not a valid login name",
                self.users.default_admin.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.toolkit.template, "download");
        assert_eq!(config.users.first_uid, 1000);
        assert!(config.packages.exclude.contains(&"lxc".to_string()));
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [toolkit]
            lxc_ls = "/opt/lxc/bin/lxc-ls"

            [users]
            admin_group = "wheel"

            [users.default_admin]
            name = "ops"
            password = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.toolkit.lxc_ls, "/opt/lxc/bin/lxc-ls");
        assert_eq!(config.toolkit.lxc_destroy, "/usr/bin/lxc-destroy");
        assert_eq!(config.users.admin_group, "wheel");
        assert_eq!(config.users.shell, "/bin/bash");
        assert_eq!(config.users.default_admin.name, "ops");
        assert_eq!(config.users.default_admin.salt, None);
    }

    #[test]
    fn test_rejects_empty_binary_path() {
        match Config::from_toml_str("[toolkit]\nlxc_stop = \"\"\n") {
            Err(ConfigError::InvalidValue(msg)) => assert!(msg.contains("toolkit.lxc_stop")),
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_zero_first_uid() {
        assert!(matches!(
            Config::from_toml_str("[users]\nfirst_uid = 0\n"),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_first_uid_upper_bound() {
        assert!(matches!(
            Config::from_toml_str("[users]\nfirst_uid = 4294967295\n"),
            Err(ConfigError::InvalidValue(_))
        ));
        let config = Config::from_toml_str(&format!("[users]\nfirst_uid = {}\n", MAX_FIRST_UID)).unwrap();
        assert_eq!(config.users.first_uid, MAX_FIRST_UID);
    }

    #[test]
    fn test_rejects_bad_default_admin_name() {
        assert!(matches!(
            Config::from_toml_str("[users.default_admin]\nname = \"Bad Name\"\n"),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            Config::from_toml_str("[toolkit\n"),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_debug_redacts_admin_password() {
        let config = Config::default();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("changeme"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    #[serial]
    fn test_load_prefers_explicit_path_over_env() {
        let mut explicit = NamedTempFile::new().unwrap();
        writeln!(explicit, "[users]\nshell = \"/bin/zsh\"").unwrap();
        let mut from_env = NamedTempFile::new().unwrap();
        writeln!(from_env, "[users]\nshell = \"/bin/sh\"").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, from_env.path());
        let config = Config::load(Some(explicit.path())).unwrap();
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(config.users.shell, "/bin/zsh");
    }

    #[test]
    #[serial]
    fn test_load_from_env_var() {
        let mut from_env = NamedTempFile::new().unwrap();
        writeln!(from_env, "[toolkit]\ntemplate = \"ubuntu\"").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, from_env.path());
        let config = Config::load(None).unwrap();
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(config.toolkit.template, "ubuntu");
    }

    #[test]
    #[serial]
    fn test_load_without_sources_uses_defaults() {
        std::env::remove_var(CONFIG_ENV_VAR);
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    #[serial]
    fn test_load_missing_file_is_io_error() {
        std::env::remove_var(CONFIG_ENV_VAR);
        let missing = Path::new("/nonexistent/lxc-helpers.toml");
        assert!(matches!(
            Config::load(Some(missing)),
            Err(ConfigError::IoError(_))
        ));
    }
}
