// GitHub API HTTP client.
// Handles authentication headers, response classification, and rate limit tracking.

use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::cache::{TtlCache, hash_cache_key};
use crate::config::Settings;
use crate::error::{PrStatusError, Result};

use super::types::RateLimit;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const GITHUB_API_VERSION: &str = "2022-11-28";
pub const DEFAULT_USER_AGENT: &str = concat!("pr-status/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Target of a single GET: a path relative to the API base plus query pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl PageRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Build the request for a `rel="next"` link.
    ///
    /// Absolute URLs contribute their path, with the query string decoded into
    /// parameters (first value per key). Relative URLs are used verbatim and
    /// are assumed to carry their own query string.
    pub fn from_next_link(link: &str) -> Self {
        match url::Url::parse(link) {
            Ok(url) if url.has_host() => {
                let mut query: Vec<(String, String)> = Vec::new();
                for (key, value) in url.query_pairs() {
                    if !query.iter().any(|(existing, _)| *existing == key) {
                        query.push((key.into_owned(), value.into_owned()));
                    }
                }
                Self {
                    path: url.path().to_string(),
                    query,
                }
            }
            _ => Self::new(link),
        }
    }
}

/// GitHub API client with authentication, caching, and rate limit tracking.
#[derive(Debug)]
pub struct GitHubClient {
    token: Option<SecretString>,
    api_base_url: String,
    request_timeout: Duration,
    user_agent: String,
    pub(crate) cache: TtlCache,
    rate_limit: RateLimit,
}

impl GitHubClient {
    /// Create a client. A blank token is treated as no token.
    pub fn new(token: Option<SecretString>, cache: TtlCache) -> Self {
        let token = token.filter(|t| !t.expose_secret().trim().is_empty());

        Self {
            token,
            api_base_url: GITHUB_API_BASE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache,
            rate_limit: RateLimit::default(),
        }
    }

    /// Create a client configured from `settings`, with its own cache store
    /// instance over the configured cache directory.
    pub fn from_settings(settings: &Settings) -> Self {
        let cache = TtlCache::new(&settings.cache_dir, settings.cache_ttl);
        Self::new(settings.token(), cache)
            .with_base_url(&settings.api_base_url)
            .with_timeout(settings.request_timeout)
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.api_base_url = base_url.as_ref().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Short digest of the token, for cache keys scoped to the caller.
    pub(crate) fn token_fingerprint(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|t| hash_cache_key(t.expose_secret().trim())[..16].to_string())
    }

    /// Rate limit headers from the most recent response.
    pub fn last_rate_limit(&self) -> &RateLimit {
        &self.rate_limit
    }

    pub fn cache_mut(&mut self) -> &mut TtlCache {
        &mut self.cache
    }

    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &self.token {
            let mut value =
                HeaderValue::from_str(&format!("Bearer {}", token.expose_secret().trim()))
                    .map_err(|e| PrStatusError::Other(format!("invalid token header: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );

        Ok(headers)
    }

    /// Build the HTTP connection pool for one top-level operation. It is
    /// released when the returned client is dropped, on every exit path.
    pub(crate) fn connect(&self) -> Result<Client> {
        let client = Client::builder()
            .default_headers(self.default_headers()?)
            .timeout(self.request_timeout)
            .build()?;
        Ok(client)
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_base_url, path)
        } else {
            format!("{}/{}", self.api_base_url, path)
        }
    }

    /// Make a GET request and classify the response.
    pub(crate) async fn get(&mut self, http: &Client, request: &PageRequest) -> Result<Response> {
        let url = self.url_for(&request.path);
        debug!(%url, query = ?request.query, "GET");

        let mut builder = http.get(&url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        let response = builder.send().await?;

        self.rate_limit = RateLimit::from_headers(response.headers());
        check_response(response).await
    }
}

/// Pass successful responses through; turn failures into typed errors.
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.as_u16() < 400 {
        return Ok(response);
    }

    let rate_limit = RateLimit::from_headers(response.headers());
    let resource = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|payload| match payload.get("message")? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        });

    Err(classify_failure(status, &rate_limit, message, &resource))
}

/// Map a failed response onto the error taxonomy.
///
/// | status | error |
/// |---|---|
/// | 401 | `Unauthorized` |
/// | 404 | `NotFound` |
/// | 403 with remaining=0 or a "rate limit" message | `RateLimited` |
/// | any other >= 400 | `Api` with GitHub's message or `HTTP {status}` |
pub fn classify_failure(
    status: StatusCode,
    rate_limit: &RateLimit,
    message: Option<String>,
    resource: &str,
) -> PrStatusError {
    match status {
        StatusCode::UNAUTHORIZED => PrStatusError::Unauthorized,
        StatusCode::NOT_FOUND => PrStatusError::NotFound(resource.to_string()),
        StatusCode::FORBIDDEN
            if rate_limit.is_exhausted()
                || message
                    .as_deref()
                    .is_some_and(|m| m.to_lowercase().contains("rate limit")) =>
        {
            PrStatusError::RateLimited {
                remaining: rate_limit.remaining,
                reset_unix_epoch_seconds: rate_limit.reset,
            }
        }
        status => PrStatusError::Api {
            status: status.as_u16(),
            message: message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        },
    }
}
