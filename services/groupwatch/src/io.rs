//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;

const USER_AGENT: &str = concat!("groupwatch/", env!("CARGO_PKG_VERSION"));

/// Outbound calls are bounded so shutdown never hangs on a slow remote
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over HTTP client for dependency injection.
///
/// One instance holds one cookie session: the login cookies captured by
/// `get_basic_auth` are replayed on every later call through the same
/// instance. A fresh instance per poll cycle gives a fresh session.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> crate::Result<HttpResponse>;

    /// Send a GET request with HTTP Basic credentials
    async fn get_basic_auth(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> crate::Result<HttpResponse>;

    /// Send a POST request with a JSON body
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest with an in-memory cookie jar
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl std::fmt::Debug for ReqwestHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestHttpClient").finish()
    }
}

impl ReqwestHttpClient {
    /// Create a client with a fresh cookie session
    pub fn new_session() -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }

    async fn read_response(response: reqwest::Response) -> crate::Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::WatchError::Http(format!("Reading response body: {}", e)))?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new_session()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| crate::WatchError::Http(format!("GET {} failed: {}", url, e)))?;

        let response = Self::read_response(response).await?;
        tracing::debug!("GET {} -> {} ({} bytes)", url, response.status, response.body.len());
        Ok(response)
    }

    async fn get_basic_auth(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {} (basic auth)", url);
        let response = self
            .client
            .get(url)
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| crate::WatchError::Http(format!("GET {} failed: {}", url, e)))?;

        let response = Self::read_response(response).await?;
        tracing::debug!("GET {} -> {} ({} bytes)", url, response.status, response.body.len());
        Ok(response)
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| crate::WatchError::Http(format!("POST {} failed: {}", url, e)))?;

        let response = Self::read_response(response).await?;
        tracing::debug!("POST {} -> {} ({} bytes)", url, response.status, response.body.len());
        Ok(response)
    }
}
