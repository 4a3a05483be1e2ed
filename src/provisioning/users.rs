//! User records and the colon-delimited user-data file.

use log::{debug, info};
use pwhash::{sha512_crypt, HashSetup};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use crate::configuration::types::DefaultAdmin;
use crate::error_handling::types::{UserDataError, UserProvisionError};

pub const SALT_LENGTH: usize = 8;

/// Portable login name: lowercase letter or underscore first, at most 32
/// characters, optionally ending in `$` (machine accounts).
pub fn is_valid_login_name(name: &str) -> bool {
    static LOGIN_NAME: OnceLock<Regex> = OnceLock::new();
    let re = LOGIN_NAME.get_or_init(|| {
        Regex::new(r"^[a-z_][a-z0-9_-]{0,30}[a-z0-9_$-]?$").expect("login name pattern is valid")
    });
    re.is_match(name)
}

/// An account to create inside the container.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    name: String,
    password: String,
    salt: String,
    is_admin: bool,
}

impl UserRecord {
    /// Builds a record, drawing a fresh salt when `salt` is absent or not a
    /// usable crypt salt (see [`is_valid_salt`]). The salt is fixed from then on.
    pub fn new(name: &str, password: &str, salt: Option<&str>, is_admin: bool) -> Self {
        let salt = match salt {
            Some(s) if is_valid_salt(s) => s.to_string(),
            Some(s) => {
                debug!("Ignoring unusable salt for '{}' ({} chars), generating one", name, s.len());
                generate_salt()
            }
            None => generate_salt(),
        };
        Self {
            name: name.to_string(),
            password: password.to_string(),
            salt,
            is_admin,
        }
    }

    pub fn default_admin(admin: &DefaultAdmin) -> Self {
        Self::new(&admin.name, &admin.password, admin.salt.as_deref(), true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// SHA-512 crypt hash of the password (`$6$<salt>$<hash>`).
    pub fn shadow_password(&self) -> Result<String, UserProvisionError> {
        let setup = HashSetup {
            salt: Some(&self.salt),
            rounds: None,
        };
        sha512_crypt::hash_with(setup, &self.password)
            .map_err(|e| UserProvisionError::HashFailed(e.to_string()))
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("salt", &self.salt)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

/// Exactly [`SALT_LENGTH`] characters of the crypt alphabet `[A-Za-z0-9./]`.
pub fn is_valid_salt(salt: &str) -> bool {
    salt.len() == SALT_LENGTH
        && salt
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'/')
}

/// Eight characters from `[A-Za-z0-9]`, drawn from the OS CSPRNG.
pub fn generate_salt() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect()
}

/// Interprets the fourth field of a user-data line.
///
/// Integers are accepted the way the historical format used them (non-zero is
/// admin); the documented `True`/`False` spellings are accepted as well.
fn parse_admin_field(raw: &str, line: usize) -> Result<bool, UserDataError> {
    let value = raw.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n != 0);
    }
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(UserDataError::InvalidAdminField {
            line,
            value: value.to_string(),
        }),
    }
}

/// Parses `username:password:salt:admin` lines. Blank lines are skipped, any
/// other line without exactly four fields rejects the whole file.
pub fn parse_user_data(content: &str) -> Result<Vec<UserRecord>, UserDataError> {
    let mut users = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 4 {
            return Err(UserDataError::InvalidFieldCount {
                line: line_no,
                found: fields.len(),
            });
        }

        let name = fields[0].trim();
        if !is_valid_login_name(name) {
            return Err(UserDataError::InvalidLoginName {
                line: line_no,
                name: name.to_string(),
            });
        }

        let salt = Some(fields[2]).filter(|s| !s.is_empty());
        let is_admin = parse_admin_field(fields[3], line_no)?;
        debug!("Parsed user '{}' (admin: {}) from line {}", name, is_admin, line_no);
        users.push(UserRecord::new(name, fields[1], salt, is_admin));
    }
    Ok(users)
}

pub fn read_user_data(path: &Path) -> Result<Vec<UserRecord>, UserDataError> {
    let content = std::fs::read_to_string(path)?;
    let users = parse_user_data(&content)?;
    info!("Loaded {} user(s) from {}", users.len(), path.display());
    Ok(users)
}

/// The default admin first, followed by the records from `user_file` if given.
pub fn collect_users(
    admin: &DefaultAdmin,
    user_file: Option<&Path>,
) -> Result<Vec<UserRecord>, UserDataError> {
    let mut users = vec![UserRecord::default_admin(admin)];
    if let Some(path) = user_file {
        users.extend(read_user_data(path)?);
    }
    Ok(users)
}
