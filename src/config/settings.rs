use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub vault: VaultSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Unset means no explicit timeout; the transport's own behaviour applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// When false the backend manages its own connection and requests carry no credentials.
    #[serde(default = "default_true")]
    pub send_credentials: bool,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_studio_path")]
    pub studio_path: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_studio_path() -> String {
    "/studio".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
            send_credentials: true,
            login_path: default_login_path(),
            studio_path: default_studio_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_file: Option<PathBuf>,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default)]
    pub kdf: KdfSettings,
}

fn default_storage_key() -> String {
    crate::vault::DEFAULT_STORAGE_KEY.to_string()
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            storage_file: None,
            storage_key: default_storage_key(),
            kdf: KdfSettings::default(),
        }
    }
}

/// Argon2id cost parameters used when sealing new vault records.
/// Records carry their own parameters, so changing these never locks out old records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfSettings {
    #[serde(default = "default_m_cost")]
    pub m_cost_kib: u32,
    #[serde(default = "default_t_cost")]
    pub t_cost: u32,
    #[serde(default = "default_p_cost")]
    pub p_cost: u32,
}

fn default_m_cost() -> u32 {
    19 * 1024
}

fn default_t_cost() -> u32 {
    2
}

fn default_p_cost() -> u32 {
    1
}

impl Default for KdfSettings {
    fn default() -> Self {
        Self {
            m_cost_kib: default_m_cost(),
            t_cost: default_t_cost(),
            p_cost: default_p_cost(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    crate::logging::DEFAULT_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl AppSettings {
    pub fn load(config_dir: &Path) -> AppResult<Self> {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: AppSettings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            let settings = AppSettings::default();
            std::fs::create_dir_all(config_dir)?;
            settings.save(config_dir)?;
            Ok(settings)
        }
    }

    pub fn save(&self, config_dir: &Path) -> AppResult<()> {
        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        let base = self.server.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "server.base_url must be an http(s) URL, got {:?}",
                self.server.base_url
            )));
        }
        if self.vault.storage_key.is_empty() {
            return Err(AppError::Config("vault.storage_key cannot be empty".into()));
        }
        Ok(())
    }

    /// Resolve the local storage file, falling back to the config directory.
    pub fn storage_path(&self, config_dir: &Path) -> PathBuf {
        self.vault
            .storage_file
            .clone()
            .unwrap_or_else(|| config_dir.join("local_storage.json"))
    }
}
