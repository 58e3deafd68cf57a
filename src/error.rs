use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Please paste a SQL query.")]
    EmptyQuery,

    #[error("Please enter a master password.")]
    EmptyPassphrase,

    #[error("No saved connection found in vault.")]
    NoVaultRecord,

    #[error("Failed to unlock vault. Incorrect master password?")]
    DecryptionFailed,

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Server error: {status} - {body}")]
    Server { status: u16, body: String },

    #[error("Authentication required")]
    AuthRequired,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_message_carries_status_and_body() {
        let err = AppError::Server {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Server error: 500 - boom");
    }

    #[test]
    fn test_vault_errors_are_distinguishable() {
        assert_ne!(
            AppError::NoVaultRecord.to_string(),
            AppError::DecryptionFailed.to_string()
        );
        assert_ne!(
            AppError::EmptyPassphrase.to_string(),
            AppError::DecryptionFailed.to_string()
        );
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let err: AppError = serde_json::from_str::<u8>("x").unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
