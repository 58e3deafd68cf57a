//! Analysis backend client
//!
//! Talks to two endpoints:
//! - `POST /analyze`: query analysis (summary, optimization, advisors, explain plan)
//! - `POST /analyze-schema`: full schema overview of the target database

pub mod types;

pub use types::*;

use crate::config::ServerSettings;
use crate::connection::ConnectionConfig;
use crate::error::{AppError, AppResult};
use crate::logging::sanitize_json;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const ANALYZE_PATH: &str = "/analyze";
pub const ANALYZE_SCHEMA_PATH: &str = "/analyze-schema";

/// Status and raw text of an HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP seam between the client and the network
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON (or an empty body) to `path` relative to the backend.
    async fn post(&self, path: &str, body: Option<&Value>) -> AppResult<RawResponse>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(settings: &ServerSettings) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, path: &str, body: Option<&Value>) -> AppResult<RawResponse> {
        let mut request = self.client.post(format!("{}{}", self.base_url, path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!("Request to {} failed: {}", path, e);
            AppError::Network(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read response: {}", e)))?;

        Ok(RawResponse { status, body })
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    sql: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a ConnectionConfig>,
    run_in_sandbox: bool,
}

#[derive(Serialize)]
struct SchemaRequest<'a> {
    database: &'a ConnectionConfig,
}

pub struct AnalysisClient {
    transport: Box<dyn Transport>,
    send_credentials: bool,
}

impl AnalysisClient {
    pub fn new(transport: Box<dyn Transport>, send_credentials: bool) -> Self {
        Self {
            transport,
            send_credentials,
        }
    }

    pub fn from_settings(settings: &ServerSettings) -> AppResult<Self> {
        Ok(Self::new(
            Box::new(HttpTransport::new(settings)?),
            settings.send_credentials,
        ))
    }

    /// Whether requests carry form-collected credentials
    pub fn sends_credentials(&self) -> bool {
        self.send_credentials
    }

    /// Run an analysis of `sql` against the configured connection.
    pub async fn submit(
        &self,
        sql: &str,
        config: &ConnectionConfig,
        sandboxed: bool,
    ) -> AppResult<AnalysisResponse> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(AppError::EmptyQuery);
        }
        if self.send_credentials {
            config.validate()?;
        }

        let body = serde_json::to_value(AnalyzeRequest {
            sql,
            database: self.send_credentials.then_some(config),
            run_in_sandbox: sandboxed,
        })?;
        tracing::debug!("POST {} {}", ANALYZE_PATH, sanitize_json(&body));

        let response = self.transport.post(ANALYZE_PATH, Some(&body)).await?;
        let text = check_status(ANALYZE_PATH, response)?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::InvalidResponse(format!("Analysis response is not valid JSON: {}", e)))
    }

    /// Fetch every table's column descriptors.
    pub async fn fetch_schema(&self, config: &ConnectionConfig) -> AppResult<SchemaOverview> {
        let body = if self.send_credentials {
            config.validate()?;
            Some(serde_json::to_value(SchemaRequest { database: config })?)
        } else {
            None
        };
        if let Some(body) = &body {
            tracing::debug!("POST {} {}", ANALYZE_SCHEMA_PATH, sanitize_json(body));
        }

        let response = self
            .transport
            .post(ANALYZE_SCHEMA_PATH, body.as_ref())
            .await?;
        let text = check_status(ANALYZE_SCHEMA_PATH, response)?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::InvalidResponse(format!("Schema response is not valid JSON: {}", e)))
    }
}

fn check_status(path: &str, response: RawResponse) -> AppResult<String> {
    match response.status {
        200..=299 => Ok(response.body),
        401 => {
            tracing::info!("{} returned 401, authentication required", path);
            Err(AppError::AuthRequired)
        }
        status => {
            tracing::warn!("{} returned {}", path, status);
            Err(AppError::Server {
                status,
                body: response.body,
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Transport double that records requests and replays canned responses
    #[derive(Clone, Default)]
    pub struct FakeTransport {
        pub requests: Arc<Mutex<Vec<(String, Option<Value>)>>>,
        responses: Arc<Mutex<VecDeque<AppResult<RawResponse>>>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
            self.responses.lock().push_back(Ok(RawResponse {
                status,
                body: body.into(),
            }));
            self
        }

        pub fn fail(&self, err: AppError) -> &Self {
            self.responses.lock().push_back(Err(err));
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }

        pub fn last_request(&self) -> Option<(String, Option<Value>)> {
            self.requests.lock().last().cloned()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn post(&self, path: &str, body: Option<&Value>) -> AppResult<RawResponse> {
            self.requests
                .lock()
                .push((path.to_string(), body.cloned()));
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Network("no canned response".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeTransport;
    use super::*;
    use serde_json::json;

    fn config() -> ConnectionConfig {
        ConnectionConfig {
            host: "db.internal".to_string(),
            user: "analyst".to_string(),
            password: "pw".to_string(),
            database: "shop".to_string(),
            ..Default::default()
        }
    }

    fn client(fake: &FakeTransport) -> AnalysisClient {
        AnalysisClient::new(Box::new(fake.clone()), true)
    }

    #[tokio::test]
    async fn test_submit_posts_triple() {
        let fake = FakeTransport::new();
        fake.respond(200, r#"{"optimization":{"status":"success"}}"#);

        let resp = client(&fake)
            .submit("  SELECT * FROM orders \n", &config(), true)
            .await
            .unwrap();
        assert_eq!(resp.optimization.unwrap().status.as_deref(), Some("success"));

        let (path, body) = fake.last_request().unwrap();
        assert_eq!(path, "/analyze");
        assert_eq!(
            body.unwrap(),
            json!({
                "sql": "SELECT * FROM orders",
                "database": serde_json::to_value(config()).unwrap(),
                "run_in_sandbox": true
            })
        );
    }

    #[tokio::test]
    async fn test_empty_query_sends_nothing() {
        let fake = FakeTransport::new();
        let err = client(&fake).submit("   ", &config(), false).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyQuery));
        assert_eq!(fake.request_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_sends_nothing() {
        let fake = FakeTransport::new();
        let mut cfg = config();
        cfg.database.clear();
        let err = client(&fake).submit("SELECT 1", &cfg, false).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(fake.request_count(), 0);
    }

    #[tokio::test]
    async fn test_401_is_auth_required() {
        let fake = FakeTransport::new();
        fake.respond(401, "not json at all");
        let err = client(&fake).submit("SELECT 1", &config(), false).await.unwrap_err();
        assert!(matches!(err, AppError::AuthRequired));
    }

    #[tokio::test]
    async fn test_non_success_keeps_raw_body() {
        let fake = FakeTransport::new();
        fake.respond(400, r#"{"detail":"Only SELECT/CTE queries are allowed."}"#);
        let err = client(&fake).submit("DROP TABLE x", &config(), false).await.unwrap_err();
        match err {
            AppError::Server { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("Only SELECT/CTE"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let fake = FakeTransport::new();
        fake.fail(AppError::Network("connection refused".to_string()));
        let err = client(&fake).submit("SELECT 1", &config(), false).await.unwrap_err();
        assert!(matches!(err, AppError::Network(ref m) if m == "connection refused"));
    }

    #[tokio::test]
    async fn test_non_json_success_is_invalid_response() {
        let fake = FakeTransport::new();
        fake.respond(200, "<html>proxy page</html>");
        let err = client(&fake).submit("SELECT 1", &config(), false).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_credentialless_variant() {
        let fake = FakeTransport::new();
        fake.respond(200, "{}").respond(200, r#"{"database":"shop","tables":{}}"#);
        let client = AnalysisClient::new(Box::new(fake.clone()), false);

        client
            .submit("SELECT 1", &ConnectionConfig::default(), false)
            .await
            .unwrap();
        let (_, body) = fake.last_request().unwrap();
        assert_eq!(body.unwrap(), json!({ "sql": "SELECT 1", "run_in_sandbox": false }));

        let overview = client.fetch_schema(&ConnectionConfig::default()).await.unwrap();
        assert_eq!(overview.database.as_deref(), Some("shop"));
        let (path, body) = fake.last_request().unwrap();
        assert_eq!(path, "/analyze-schema");
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_schema_posts_database() {
        let fake = FakeTransport::new();
        fake.respond(
            200,
            r#"{"database":"shop","tables":{"orders":[{"COLUMN_NAME":"id"}]}}"#,
        );
        let overview = client(&fake).fetch_schema(&config()).await.unwrap();
        assert!(overview.tables.unwrap().contains_key("orders"));

        let (_, body) = fake.last_request().unwrap();
        assert_eq!(body.unwrap()["database"]["host"], "db.internal");
    }

    #[test]
    fn test_http_transport_trims_base_url() {
        let settings = ServerSettings {
            base_url: "http://localhost:8000/".to_string(),
            request_timeout_secs: Some(5),
            ..Default::default()
        };
        let transport = HttpTransport::new(&settings).unwrap();
        assert_eq!(transport.base_url, "http://localhost:8000");
    }
}
