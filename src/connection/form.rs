use super::{ConnectionConfig, SshConfig, DEFAULT_DB_PORT, DEFAULT_SSH_PORT};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Raw values of the connection form fields.
///
/// Everything is kept as typed text; `collect` turns it into a
/// `ConnectionConfig` and `populate` writes one back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionForm {
    pub db_host: String,
    #[serde(deserialize_with = "port_text")]
    pub db_port: String,
    pub db_user: String,
    pub db_pass: String,
    pub db_name: String,
    pub use_ssh: bool,
    pub ssh_host: String,
    #[serde(deserialize_with = "port_text")]
    pub ssh_port: String,
    pub ssh_user: String,
    pub ssh_pass: String,
    pub ssh_key: String,
    #[serde(skip)]
    ssh_section_visible: bool,
}

impl Default for ConnectionForm {
    fn default() -> Self {
        Self {
            db_host: String::new(),
            db_port: DEFAULT_DB_PORT.to_string(),
            db_user: String::new(),
            db_pass: String::new(),
            db_name: String::new(),
            use_ssh: false,
            ssh_host: String::new(),
            ssh_port: DEFAULT_SSH_PORT.to_string(),
            ssh_user: String::new(),
            ssh_pass: String::new(),
            ssh_key: String::new(),
            ssh_section_visible: false,
        }
    }
}

/// Port fields accept text or a bare number. Anything else is kept as empty
/// text and later falls back to the default port.
fn port_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Parse a port the way a lenient integer field does: leading digits only,
/// anything unusable (empty, zero, out of range) falls back to `default`.
fn parse_port(value: &str, default: u16) -> u16 {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<u16>() {
        Ok(0) | Err(_) => default,
        Ok(port) => port,
    }
}

impl ConnectionForm {
    /// Blank every field and restore default ports.
    ///
    /// Run when a page is built so browser-style autofill never lingers.
    pub fn reset(&mut self) {
        *self = Self {
            use_ssh: self.use_ssh,
            ssh_section_visible: self.use_ssh,
            ..Self::default()
        };
    }

    pub fn set_use_ssh(&mut self, enabled: bool) {
        self.use_ssh = enabled;
        self.ssh_section_visible = enabled;
    }

    pub fn ssh_section_visible(&self) -> bool {
        self.ssh_section_visible
    }

    /// Sync visibility after fields were filled in directly (e.g. deserialized).
    pub fn refresh_visibility(&mut self) {
        self.ssh_section_visible = self.use_ssh;
    }

    pub fn collect(&self) -> ConnectionConfig {
        let ssh_config = self.use_ssh.then(|| SshConfig {
            host: self.ssh_host.trim().to_string(),
            port: parse_port(&self.ssh_port, DEFAULT_SSH_PORT),
            user: self.ssh_user.trim().to_string(),
            password: self.ssh_pass.clone(),
            private_key: self.ssh_key.clone(),
        });

        ConnectionConfig {
            host: self.db_host.trim().to_string(),
            port: parse_port(&self.db_port, DEFAULT_DB_PORT),
            user: self.db_user.trim().to_string(),
            password: self.db_pass.clone(),
            database: self.db_name.trim().to_string(),
            use_ssh: self.use_ssh,
            ssh_config,
        }
    }

    pub fn populate(&mut self, config: &ConnectionConfig) {
        self.db_host = config.host.clone();
        self.db_port = config.port.to_string();
        self.db_user = config.user.clone();
        self.db_pass = config.password.clone();
        self.db_name = config.database.clone();
        self.set_use_ssh(config.use_ssh);

        if let Some(ssh) = &config.ssh_config {
            self.ssh_host = ssh.host.clone();
            self.ssh_port = ssh.port.to_string();
            self.ssh_user = ssh.user.clone();
            self.ssh_pass = ssh.password.clone();
            self.ssh_key = ssh.private_key.clone();
        }
    }
}
