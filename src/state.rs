use crate::client::AnalysisClient;
use crate::config::AppSettings;
use crate::error::AppResult;
use crate::vault::{FileStore, Vault};
use std::path::Path;

/// Everything a front end needs to drive a page
pub struct AppState {
    pub settings: AppSettings,
    pub client: AnalysisClient,
    pub vault: Vault,
}

impl AppState {
    /// Load settings from `config_dir` and build the client and file-backed vault.
    pub fn new(config_dir: &Path) -> AppResult<Self> {
        let settings = AppSettings::load(config_dir)?;
        Self::from_settings(settings, config_dir)
    }

    pub fn from_settings(settings: AppSettings, config_dir: &Path) -> AppResult<Self> {
        let storage_path = settings.storage_path(config_dir);
        tracing::debug!("Vault storage: {:?}", storage_path);

        let client = AnalysisClient::from_settings(&settings.server)?;
        let vault = Vault::new(Box::new(FileStore::new(storage_path)), &settings.vault);

        Ok(Self {
            settings,
            client,
            vault,
        })
    }
}
