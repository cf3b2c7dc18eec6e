//! HTTP client abstraction for testability

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// HTTP verbs used for JSON mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Put,
    Post,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

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

    /// Body of a 2xx response, or `Rejected` for anything else
    pub fn into_body(self) -> crate::Result<String> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(crate::DncError::Rejected {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Build an endpoint URL from a base URL and path segments
///
/// Segments are percent-encoded, so filter keys such as organisation names
/// with spaces or slashes stay a single segment.
pub fn endpoint(base: &str, segments: &[&str]) -> crate::Result<String> {
    let mut url = reqwest::Url::parse(base)
        .map_err(|e| crate::DncError::Config(format!("Invalid base URL {:?}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| crate::DncError::Config(format!("Base URL {:?} cannot take a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}

/// Abstraction over HTTP client for dependency injection
///
/// Every request carries `Authorization: Bearer <token>` and a JSON content
/// type. An empty token is sent as-is; the backend decides what to do with it.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str, token: &str) -> crate::Result<HttpResponse>;

    /// Send a request with a JSON body
    async fn send_json(
        &self,
        method: HttpMethod,
        url: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| crate::DncError::Config(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

async fn read_response(
    method: &str,
    url: &str,
    response: reqwest::Response,
) -> crate::Result<HttpResponse> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| crate::DncError::Transport(format!("Reading response body: {}", e)))?;

    tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
    Ok(HttpResponse { status, body })
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, token: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| crate::DncError::Transport(format!("GET {} failed: {}", url, e)))?;

        read_response("GET", url, response).await
    }

    async fn send_json(
        &self,
        method: HttpMethod,
        url: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("{} {}", method, url);
        let response = self
            .client
            .request(method.into(), url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                crate::DncError::Transport(format!("{} {} failed: {}", method, url, e))
            })?;

        read_response(&method.to_string(), url, response).await
    }
}
