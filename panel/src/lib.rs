//! Panel REST Client
//!
//! Typed async client for a Pterodactyl-compatible application API. Every
//! response is classified: 2xx succeeds, 4xx is surfaced immediately with
//! the panel's own message (sanitized, never the API key), and 5xx or
//! network failures are retried with bounded exponential backoff before
//! being surfaced.

mod types;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
pub use types::{
    Limits, NewUser, PowerSignal, PowerState, ResourceMetrics, ResourceUsage, ServerInfo,
    UserInfo, UserUpdate,
};
use url::Url;

/// Longest panel-provided message carried into an error.
const MAX_ERROR_DETAIL: usize = 200;

/// Errors from the panel API.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Invalid panel base URL: {0}")]
    InvalidBaseUrl(String),

    /// The API key contains characters that cannot appear in a header.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Request rejected before it was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 4xx from the panel; not retried. The message is the panel's own,
    /// truncated and free of credentials.
    #[error("Panel rejected the request ({status}): {message}")]
    Client { status: u16, message: String },

    /// 5xx after retries were exhausted.
    #[error("Panel server error ({status})")]
    Server { status: u16 },

    /// Connection or timeout failure after retries were exhausted.
    #[error("Panel unreachable: {0}")]
    Network(String),

    /// Response body did not match the expected shape.
    #[error("Unexpected panel response: {0}")]
    Decode(String),
}

/// Retry and timeout settings.
#[derive(Debug, Clone)]
pub struct PanelClientConfig {
    pub request_timeout: Duration,
    /// Total attempts for retryable failures (minimum 1).
    pub retry_attempts: u32,
    /// First retry delay; doubles per attempt.
    pub retry_base_delay: Duration,
}

impl Default for PanelClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(250),
        }
    }
}

/// Classification of one HTTP outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Success,
    /// Client error: surfaced immediately, never retried.
    Fatal,
    /// Server error: worth retrying.
    Retryable,
}

fn classify_status(status: StatusCode) -> Disposition {
    if status.is_success() {
        Disposition::Success
    } else if status.is_server_error() {
        Disposition::Retryable
    } else {
        Disposition::Fatal
    }
}

/// Delay before retry `attempt` (0-based): base * 2^attempt, capped.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1_u32 << attempt.min(6))
}

/// Extract the panel's message from a 4xx body, falling back to the bare
/// status. Only panel-provided text is used; request headers never appear.
fn extract_error_detail(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/errors/0/detail")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .filter(|d| !d.is_empty());

    match detail {
        Some(d) if d.chars().count() > MAX_ERROR_DETAIL => {
            let mut truncated: String = d.chars().take(MAX_ERROR_DETAIL).collect();
            truncated.push_str("...");
            truncated
        }
        Some(d) => d,
        None => format!("HTTP {status}"),
    }
}

/// Client for one user's panel, authenticated with their application API
/// key. The key lives only in the prebuilt (sensitive) auth header, and
/// the panel address never appears in `Debug` output.
#[derive(Clone)]
pub struct PanelClient {
    http: reqwest::Client,
    base_url: String,
    config: PanelClientConfig,
}

impl std::fmt::Debug for PanelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PanelClient {
    /// Build a client for the panel at `panel_url`.
    pub fn new(
        panel_url: &str,
        api_key: &str,
        config: PanelClientConfig,
    ) -> Result<Self, PanelError> {
        let base_url = Url::parse(panel_url)
            .map_err(|e| PanelError::InvalidBaseUrl(e.to_string()))?;
        if base_url.host_str().is_none() {
            return Err(PanelError::InvalidBaseUrl("missing host".to_string()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| PanelError::InvalidApiKey)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PanelError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            config,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/application{path}", self.base_url)
    }

    /// Send one request, classifying and retrying per the config.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, PanelError> {
        let url = self.endpoint(path);
        let attempts = self.config.retry_attempts.max(1);
        let mut attempt = 0;

        loop {
            let mut request = self.http.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }

            let failure = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    match classify_status(status) {
                        Disposition::Success => {
                            let text = response
                                .text()
                                .await
                                .map_err(|e| PanelError::Decode(e.to_string()))?;
                            if text.trim().is_empty() {
                                return Ok(Value::Null);
                            }
                            return serde_json::from_str(&text)
                                .map_err(|e| PanelError::Decode(e.to_string()));
                        }
                        Disposition::Fatal => {
                            let body = response.text().await.unwrap_or_default();
                            return Err(PanelError::Client {
                                status: status.as_u16(),
                                message: extract_error_detail(status, &body),
                            });
                        }
                        Disposition::Retryable => PanelError::Server {
                            status: status.as_u16(),
                        },
                    }
                }
                // The URL is stripped so connection errors cannot echo
                // panel addresses into user-facing messages.
                Err(e) => PanelError::Network(e.without_url().to_string()),
            };

            attempt += 1;
            if attempt >= attempts {
                return Err(failure);
            }

            let delay = backoff_delay(self.config.retry_base_delay, attempt - 1);
            warn!(
                path,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Panel request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Whether the panel accepts this client's credentials.
    pub async fn test_connection(&self) -> bool {
        self.request(Method::GET, "/users", None).await.is_ok()
    }

    // Server Management

    /// All servers visible to this API key.
    pub async fn list_servers(&self) -> Result<Vec<ServerInfo>, PanelError> {
        let response = self.request(Method::GET, "/servers", None).await?;
        parse_list(&response)
    }

    /// One server by panel id.
    pub async fn get_server(&self, server_id: i64) -> Result<ServerInfo, PanelError> {
        let response = self
            .request(Method::GET, &format!("/servers/{server_id}"), None)
            .await?;
        parse_single(&response)
    }

    /// Send a power signal to a server.
    pub async fn power(&self, server_id: i64, signal: PowerSignal) -> Result<(), PanelError> {
        let body = serde_json::json!({ "signal": signal.as_str() });
        self.request(Method::POST, &format!("/servers/{server_id}/power"), Some(&body))
            .await?;
        Ok(())
    }

    /// Submit a console command to a server.
    pub async fn send_command(&self, server_id: i64, command: &str) -> Result<(), PanelError> {
        if command.trim().is_empty() {
            return Err(PanelError::InvalidRequest(
                "console command must not be empty".to_string(),
            ));
        }

        let body = serde_json::json!({ "command": command });
        self.request(
            Method::POST,
            &format!("/servers/{server_id}/command"),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    /// Live resource usage for a server.
    pub async fn server_resources(&self, server_id: i64) -> Result<ResourceUsage, PanelError> {
        let response = self
            .request(Method::GET, &format!("/servers/{server_id}/resources"), None)
            .await?;
        parse_single(&response)
    }

    // User Management

    /// All panel users.
    pub async fn list_users(&self) -> Result<Vec<UserInfo>, PanelError> {
        let response = self.request(Method::GET, "/users", None).await?;
        parse_list(&response)
    }

    /// One panel user by id.
    pub async fn get_user(&self, user_id: i64) -> Result<UserInfo, PanelError> {
        let response = self
            .request(Method::GET, &format!("/users/{user_id}"), None)
            .await?;
        parse_single(&response)
    }

    /// Create a panel user.
    pub async fn create_user(&self, user: &NewUser) -> Result<UserInfo, PanelError> {
        let body = serde_json::to_value(user).map_err(|e| PanelError::Decode(e.to_string()))?;
        let response = self.request(Method::POST, "/users", Some(&body)).await?;
        parse_single(&response)
    }

    /// Apply a typed patch to a panel user.
    pub async fn update_user(&self, user_id: i64, patch: &UserUpdate) -> Result<(), PanelError> {
        if patch.is_empty() {
            return Err(PanelError::InvalidRequest(
                "user update patch is empty".to_string(),
            ));
        }

        let body = serde_json::to_value(patch).map_err(|e| PanelError::Decode(e.to_string()))?;
        self.request(Method::PATCH, &format!("/users/{user_id}"), Some(&body))
            .await?;
        Ok(())
    }

    /// Delete a panel user.
    pub async fn delete_user(&self, user_id: i64) -> Result<(), PanelError> {
        self.request(Method::DELETE, &format!("/users/{user_id}"), None)
            .await?;
        Ok(())
    }
}

/// Parse a single resource: `{"data": {"attributes": {...}}}`.
fn parse_single<T: DeserializeOwned>(response: &Value) -> Result<T, PanelError> {
    let attributes = response
        .pointer("/data/attributes")
        .ok_or_else(|| PanelError::Decode("missing data.attributes".to_string()))?;
    serde_json::from_value(attributes.clone()).map_err(|e| PanelError::Decode(e.to_string()))
}

/// Parse a list: `{"data": [{"attributes": {...}}, ...]}`.
fn parse_list<T: DeserializeOwned>(response: &Value) -> Result<Vec<T>, PanelError> {
    let items = response
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| PanelError::Decode("missing data array".to_string()))?;

    items
        .iter()
        .map(|item| {
            let attributes = item
                .get("attributes")
                .ok_or_else(|| PanelError::Decode("missing attributes".to_string()))?;
            serde_json::from_value(attributes.clone()).map_err(|e| PanelError::Decode(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_by_status() {
        assert_eq!(classify_status(StatusCode::OK), Disposition::Success);
        assert_eq!(classify_status(StatusCode::NO_CONTENT), Disposition::Success);

        // 4xx is the caller's problem: surfaced, never retried.
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED), Disposition::Fatal);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), Disposition::Fatal);
        assert_eq!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY),
            Disposition::Fatal
        );

        // 5xx is the panel's problem: retryable.
        assert_eq!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            Disposition::Retryable
        );
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            Disposition::Retryable
        );
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let base = Duration::from_millis(250);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(250));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(1000));

        // Exponent is capped so the schedule stays bounded.
        assert_eq!(backoff_delay(base, 6), backoff_delay(base, 20));
    }

    #[test]
    fn test_extract_error_detail() {
        let body = r#"{"errors": [{"code": "NotFound", "status": "404", "detail": "The requested resource was not found."}]}"#;
        assert_eq!(
            extract_error_detail(StatusCode::NOT_FOUND, body),
            "The requested resource was not found."
        );

        // Non-JSON and empty bodies fall back to the bare status.
        assert_eq!(
            extract_error_detail(StatusCode::NOT_FOUND, "<html>nope</html>"),
            "HTTP 404 Not Found"
        );
        assert_eq!(
            extract_error_detail(StatusCode::BAD_REQUEST, ""),
            "HTTP 400 Bad Request"
        );
    }

    #[test]
    fn test_extract_error_detail_truncates() {
        let long = "x".repeat(500);
        let body = format!(r#"{{"errors": [{{"detail": "{long}"}}]}}"#);
        let detail = extract_error_detail(StatusCode::BAD_REQUEST, &body);
        assert_eq!(detail.len(), MAX_ERROR_DETAIL + 3);
        assert!(detail.ends_with("..."));
    }

    #[test]
    fn test_endpoint_building_normalizes_trailing_slash() {
        let client = PanelClient::new(
            "https://panel.example.com/",
            "key-abc",
            PanelClientConfig::default(),
        )
        .expect("client should build");
        assert_eq!(
            client.endpoint("/servers/7/power"),
            "https://panel.example.com/api/application/servers/7/power"
        );
    }

    #[test]
    fn test_new_rejects_bad_inputs() {
        let config = PanelClientConfig::default();
        assert!(matches!(
            PanelClient::new("panel.example.com", "key-abc", config.clone()),
            Err(PanelError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            PanelClient::new("https://panel.example.com", "key\nwith-newline", config),
            Err(PanelError::InvalidApiKey)
        ));
    }

    #[test]
    fn test_parse_helpers() {
        let response = serde_json::json!({
            "object": "list",
            "data": [
                { "object": "server", "attributes": { "id": 1, "name": "a", "identifier": "aaaa1111" } },
                { "object": "server", "attributes": { "id": 2, "name": "b", "identifier": "bbbb2222" } }
            ]
        });
        let servers: Vec<ServerInfo> = parse_list(&response).expect("list should parse");
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[1].identifier, "bbbb2222");

        let response = serde_json::json!({
            "data": { "attributes": { "id": 3, "username": "steve", "email": "steve@example.com" } }
        });
        let user: UserInfo = parse_single(&response).expect("single should parse");
        assert_eq!(user.username, "steve");

        let result: Result<Vec<ServerInfo>, _> = parse_list(&serde_json::json!({}));
        assert!(matches!(result, Err(PanelError::Decode(_))));
    }
}
