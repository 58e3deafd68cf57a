//! Database and SSH connection parameters
//!
//! These are collected from the studio form, posted to the backend with each
//! analysis request, and sealed into the vault. Nothing here opens a connection.

pub mod form;

pub use form::ConnectionForm;

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_SSH_PORT: u16 = 22;

const MISSING_DB_FIELDS: &str = "Please fill in all database connection details.";
const MISSING_SSH_FIELDS: &str =
    "Please fill in SSH host, user, and either password or private key.";

/// Database connection as sent to `/analyze` and stored in the vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub use_ssh: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_config: Option<SshConfig>,
}

/// SSH tunnel the backend should use to reach the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub private_key: String,
}

fn default_db_port() -> u16 {
    DEFAULT_DB_PORT
}

fn default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_DB_PORT,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            use_ssh: false,
            ssh_config: None,
        }
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_SSH_PORT,
            user: String::new(),
            password: String::new(),
            private_key: String::new(),
        }
    }
}

impl ConnectionConfig {
    /// Check the fields required before any request leaves the client.
    pub fn validate(&self) -> AppResult<()> {
        if self.host.is_empty() || self.user.is_empty() || self.database.is_empty() {
            return Err(AppError::Validation(MISSING_DB_FIELDS.to_string()));
        }

        if self.use_ssh {
            match &self.ssh_config {
                Some(ssh) => ssh.validate()?,
                None => return Err(AppError::Validation(MISSING_SSH_FIELDS.to_string())),
            }
        }

        Ok(())
    }
}

impl SshConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.host.is_empty()
            || self.user.is_empty()
            || (self.password.is_empty() && self.private_key.is_empty())
        {
            return Err(AppError::Validation(MISSING_SSH_FIELDS.to_string()));
        }
        Ok(())
    }
}
