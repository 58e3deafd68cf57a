//! Passphrase-encrypted connection vault
//!
//! A single saved connection is sealed under a master password and kept in one
//! fixed local-storage slot. The passphrase is never stored, logged or sent
//! anywhere; the backend never sees vault contents.

pub mod crypto;
pub mod store;

pub use store::{FileStore, LocalStore, MemoryStore};

use crate::config::{KdfSettings, VaultSettings};
use crate::connection::ConnectionConfig;
use crate::error::{AppError, AppResult};

pub const DEFAULT_STORAGE_KEY: &str = "queryvault_vault";

pub struct Vault {
    store: Box<dyn LocalStore>,
    storage_key: String,
    kdf: KdfSettings,
}

impl Vault {
    pub fn new(store: Box<dyn LocalStore>, settings: &VaultSettings) -> Self {
        Self {
            store,
            storage_key: settings.storage_key.clone(),
            kdf: settings.kdf,
        }
    }

    /// Encrypt `config` and overwrite the vault slot.
    pub fn save(&self, config: &ConnectionConfig, passphrase: &str) -> AppResult<()> {
        if passphrase.is_empty() {
            return Err(AppError::EmptyPassphrase);
        }

        let plaintext = serde_json::to_vec(config)?;
        let sealed = crypto::seal(&plaintext, passphrase, &self.kdf)?;
        self.store.set_item(&self.storage_key, &sealed)?;

        tracing::info!("Saved connection to vault (use_ssh: {})", config.use_ssh);
        Ok(())
    }

    /// Decrypt the vault slot.
    pub fn load(&self, passphrase: &str) -> AppResult<ConnectionConfig> {
        if passphrase.is_empty() {
            return Err(AppError::EmptyPassphrase);
        }

        let sealed = self
            .store
            .get_item(&self.storage_key)?
            .filter(|s| !s.is_empty())
            .ok_or(AppError::NoVaultRecord)?;

        let plaintext = crypto::open(&sealed, passphrase).map_err(|e| {
            tracing::warn!("Vault unlock failed");
            e
        })?;

        let config = serde_json::from_slice(&plaintext).map_err(|_| AppError::DecryptionFailed)?;
        tracing::info!("Vault unlocked");
        Ok(config)
    }

    pub fn has_record(&self) -> AppResult<bool> {
        Ok(self
            .store
            .get_item(&self.storage_key)?
            .map(|s| !s.is_empty())
            .unwrap_or(false))
    }

    pub fn clear(&self) -> AppResult<()> {
        self.store.remove_item(&self.storage_key)
    }
}

#[cfg(test)]
pub(crate) fn test_vault() -> Vault {
    let settings = VaultSettings {
        kdf: KdfSettings {
            m_cost_kib: 256,
            t_cost: 1,
            p_cost: 1,
        },
        ..Default::default()
    };
    Vault::new(Box::new(MemoryStore::new()), &settings)
}
