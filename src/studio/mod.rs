//! Page view-model
//!
//! `StudioPage` holds everything the studio and vault pages show: the form
//! fields, button states, the inline message, blocking notices and rendered
//! result fragments. Actions take `&mut self` and never return errors; every
//! failure ends up as visible state on the page.

use crate::client::AnalysisClient;
use crate::config::ServerSettings;
use crate::connection::ConnectionForm;
use crate::error::AppError;
use crate::render::{self, escape_html, RenderedView};
use crate::vault::Vault;

pub const RUN_LABEL: &str = "Run Analysis";
pub const RUN_BUSY_LABEL: &str = "Running...";
pub const SCHEMA_LABEL: &str = "Analyze Schema";
pub const SCHEMA_BUSY_LABEL: &str = "Loading schema...";

const SAVE_PASSPHRASE_MISSING: &str = "Please enter a Master Password to encrypt your data.";
const LOAD_PASSPHRASE_MISSING: &str = "Please enter your Master Password to unlock the vault.";
const VAULT_SAVED: &str = "Connection encrypted and saved to local vault. Your server never sees your plain-text password!";
const VAULT_POPULATED: &str = "Vault unlocked successfully! Credentials populated.";
const VAULT_LISTED: &str = "Vault unlocked! Connection details listed below.";

/// Which page the view-model backs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Query studio: form, SQL input and results
    Studio,
    /// Vault page: unlock and list the saved connection
    Vault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub label: String,
    pub disabled: bool,
}

impl ButtonState {
    fn idle(label: &str) -> Self {
        Self {
            label: label.to_string(),
            disabled: false,
        }
    }

    fn busy(&mut self, label: &str) {
        self.label = label.to_string();
        self.disabled = true;
    }

    fn restore(&mut self, label: &str) {
        *self = Self::idle(label);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

pub struct StudioPage {
    pub kind: PageKind,
    pub form: ConnectionForm,
    pub sql: String,
    pub sandbox: bool,
    pub master_pass: String,
    pub run_button: ButtonState,
    pub schema_button: ButtonState,
    /// Inline message above the results
    pub message: Option<Notice>,
    /// Blocking notice the user has to acknowledge
    pub alert: Option<Notice>,
    pub results: Option<RenderedView>,
    pub schema_results: Option<String>,
    pub vault_list: Option<String>,
    /// Set when the page should navigate away; nothing else is rendered then
    pub redirect: Option<String>,
    login_path: String,
    studio_path: String,
}

impl StudioPage {
    pub fn new(kind: PageKind, server: &ServerSettings) -> Self {
        let mut form = ConnectionForm::default();
        form.reset();

        Self {
            kind,
            form,
            sql: String::new(),
            sandbox: false,
            master_pass: String::new(),
            run_button: ButtonState::idle(RUN_LABEL),
            schema_button: ButtonState::idle(SCHEMA_LABEL),
            message: None,
            alert: None,
            results: None,
            schema_results: None,
            vault_list: None,
            redirect: None,
            login_path: server.login_path.clone(),
            studio_path: server.studio_path.clone(),
        }
    }

    pub fn studio_path(&self) -> &str {
        &self.studio_path
    }

    /// Submit the SQL and connection for analysis and render the response.
    pub async fn run_analysis(&mut self, client: &AnalysisClient) {
        self.message = None;

        let sql = self.sql.trim().to_string();
        if sql.is_empty() {
            self.message = Some(Notice::error(AppError::EmptyQuery.to_string()));
            return;
        }

        let config = self.form.collect();
        if client.sends_credentials() {
            if let Err(e) = config.validate() {
                self.message = Some(Notice::error(e.to_string()));
                return;
            }
        }

        tracing::info!("Running analysis (sandbox: {})", self.sandbox);
        self.run_button.busy(RUN_BUSY_LABEL);
        let outcome = client.submit(&sql, &config, self.sandbox).await;
        self.run_button.restore(RUN_LABEL);

        match outcome {
            Ok(response) => {
                self.results = Some(render::render_analysis(&response));
            }
            Err(AppError::AuthRequired) => {
                self.redirect = Some(self.login_path.clone());
            }
            Err(e) => {
                tracing::warn!("Analysis failed: {}", e);
                self.message = Some(Notice::error(e.to_string()));
            }
        }
    }

    /// Empty the SQL input and every result section.
    pub fn clear(&mut self) {
        self.sql.clear();
        self.results = None;
        self.message = None;
    }

    /// Fetch and render the schema overview of the form's database.
    pub async fn analyze_schema(&mut self, client: &AnalysisClient) {
        let config = self.form.collect();
        if client.sends_credentials() {
            if let Err(e) = config.validate() {
                self.alert = Some(Notice::error(e.to_string()));
                return;
            }
        }

        tracing::info!("Fetching schema overview");
        self.schema_button.busy(SCHEMA_BUSY_LABEL);
        let outcome = client.fetch_schema(&config).await;
        self.schema_button.restore(SCHEMA_LABEL);

        match outcome {
            Ok(overview) => {
                self.schema_results = Some(render::render_schema_overview(&overview));
            }
            Err(AppError::AuthRequired) => {
                self.redirect = Some(self.login_path.clone());
            }
            Err(e) => {
                tracing::warn!("Schema fetch failed: {}", e);
                self.schema_results = Some(format!(
                    "<p class=\"error\">✗ Failed to load schema: {}</p>",
                    escape_html(&e.to_string())
                ));
            }
        }
    }

    /// Encrypt the form's connection under the master password.
    pub fn save_vault(&mut self, vault: &Vault) {
        let config = self.form.collect();
        self.alert = Some(match vault.save(&config, &self.master_pass) {
            Ok(()) => Notice::info(VAULT_SAVED),
            Err(AppError::EmptyPassphrase) => Notice::error(SAVE_PASSPHRASE_MISSING),
            Err(e) => Notice::error(e.to_string()),
        });
    }

    /// Unlock the vault. The studio page gets its form populated, the vault
    /// page a summary card of the saved connection.
    pub fn load_vault(&mut self, vault: &Vault) {
        let config = match vault.load(&self.master_pass) {
            Ok(config) => config,
            Err(AppError::EmptyPassphrase) => {
                self.alert = Some(Notice::error(LOAD_PASSPHRASE_MISSING));
                return;
            }
            Err(e) => {
                self.alert = Some(Notice::error(e.to_string()));
                return;
            }
        };

        match self.kind {
            PageKind::Studio => {
                self.form.populate(&config);
                self.alert = Some(Notice::info(VAULT_POPULATED));
            }
            PageKind::Vault => {
                self.vault_list = Some(render::render_vault_summary(&config, &self.studio_path));
                self.alert = Some(Notice::info(VAULT_LISTED));
            }
        }
    }
}

/// Entry point for markup-level "analyze schema" handlers.
pub async fn analyze_schema(page: &mut StudioPage, client: &AnalysisClient) {
    page.analyze_schema(client).await
}
