use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::config::{ClientConfig, RetryPolicy};
use super::credentials::CredentialStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Access denied")]
    Forbidden,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Invalid response: {0}")]
    Parse(String),
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Status code for errors where the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

/// Base request builder shared by every resource client.
///
/// Cheap to clone; clones share the connection pool and credential store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    base_url: String,
    client: Client,
    credentials: Arc<dyn CredentialStore>,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(ApiClient {
            inner: Arc::new(ApiClientInner {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                client,
                credentials,
                retry: config.retry,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Start a request, attaching the bearer token if the store has one right now.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_url(method, format!("{}{}", self.inner.base_url, path))
    }

    fn request_url(&self, method: Method, url: String) -> RequestBuilder {
        let token = self.inner.credentials.access_token();
        tracing::debug!(%method, %url, authenticated = token.is_some(), "api request");

        let request = self.inner.client.request(method, url);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET with query parameters. The only verb the retry policy applies to.
    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let retry = self.inner.retry;
        let mut attempt = 0;

        loop {
            let request = self.request(Method::GET, path).query(query);
            match self.send(request).await {
                Err(err) if attempt < retry.max_retries && err.is_retryable() => {
                    attempt += 1;
                    tracing::warn!(
                        "GET {} failed ({}), retry {}/{} in {:?}",
                        path, err, attempt, retry.max_retries, retry.delay
                    );
                    tokio::time::sleep(retry.delay).await;
                }
                result => return result,
            }
        }
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path).json(body);
        self.send(request).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = self.request(Method::PUT, path).json(body);
        self.send(request).await
    }

    /// DELETE `collection/{id}`.
    pub async fn delete<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T, ApiError> {
        let url = self.item_url(collection, id)?;
        let request = self.request_url(Method::DELETE, url.to_string());
        self.send(request).await
    }

    /// URL of one item, with `id` percent-encoded as a single path segment.
    fn item_url(&self, collection: &str, id: &str) -> Result<Url, ApiError> {
        let base = format!("{}{}", self.inner.base_url, collection);
        let mut url = Url::parse(&base).map_err(|e| ApiError::Network(format!("{}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("{}: cannot be a base", base)))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("Request failed before a response: {}", e);
            ApiError::from(e)
        })?;
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();

        if status.is_success() {
            return response.json::<T>().await.map_err(|e| ApiError::Parse(e.to_string()));
        }

        let url = response.url().path().to_string();
        let text = response.text().await.unwrap_or_default();
        tracing::warn!("{} responded {}: {}", url, status, text);

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::FORBIDDEN => Err(ApiError::Forbidden),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(text)),
            _ => Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            }),
        }
    }
}
