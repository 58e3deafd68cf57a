pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod render;
pub mod state;
pub mod studio;
pub mod vault;

pub use client::{AnalysisClient, AnalysisResponse, SchemaOverview};
pub use connection::{ConnectionConfig, ConnectionForm, SshConfig};
pub use error::{AppError, AppResult};
pub use state::AppState;
pub use studio::{analyze_schema, PageKind, StudioPage};
pub use vault::Vault;
