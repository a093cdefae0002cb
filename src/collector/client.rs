//! Bounded-timeout JSON fetches against the MongoShake status API.

use std::time::Duration;

use reqwest::Client;

/// HTTP client for the per-instance status endpoints.
///
/// All failure modes (connect error, timeout, non-2xx status, malformed
/// body) collapse to `None` with a single warning-level diagnostic. Warning
/// rather than error keeps a transient network blip from flooding the log
/// while persistent problems stay visible. Absence is the only failure
/// signal; callers never see an error from a fetch.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// Create a client with the given per-request timeout.
    ///
    /// # Errors
    /// Returns `reqwest::Error` if the underlying client cannot be built.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// GET `http://{host}:{port}{path}` and parse the body as JSON.
    ///
    /// Returns `None` on any failure.
    pub async fn fetch_json(&self, host: &str, port: u16, path: &str) -> Option<serde_json::Value> {
        let url = format!("http://{}:{}{}", host, port, path);
        match self.get_json(&url).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "failed to fetch status endpoint");
                None
            }
        }
    }

    async fn get_json(&self, url: &str) -> reqwest::Result<serde_json::Value> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        response.json().await
    }
}
