// GitHub API endpoint functions.
// Paginated, cached listing of open pull requests plus user repositories and rate limit status.

use std::time::Duration;

use reqwest::header::LINK;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::{PrStatusError, Result};

use super::client::{GitHubClient, PageRequest};
use super::link::parse_link_header;
use super::types::{OpenPullRequestsResult, RepositorySummary, parse_batch};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

/// TTL for the user repositories listing, shorter than the store default.
pub const USER_REPOSITORIES_TTL: Duration = Duration::from_secs(60);

/// Version tag written with cached pull request aggregates. Entries with any
/// other version are treated as misses.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Split `owner/name` into its trimmed parts.
pub fn parse_repository_identifier(input: &str) -> Result<(String, String)> {
    let invalid = || PrStatusError::InvalidRepository {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    if trimmed.matches('/').count() != 1 {
        return Err(invalid());
    }
    let (owner, name) = trimmed.split_once('/').ok_or_else(invalid)?;
    let (owner, name) = (owner.trim(), name.trim());
    if owner.is_empty() || name.is_empty() {
        return Err(invalid());
    }

    Ok((owner.to_string(), name.to_string()))
}

/// Options for `list_open_pull_requests`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPullRequestsOptions {
    /// Items per page, clamped to 1..=100.
    pub page_size: u32,
    /// Page cap (at least 1); `None` fetches until the API reports no next page.
    pub max_pages: Option<u32>,
    pub bypass_cache: bool,
    pub sort_field: String,
    pub sort_direction: String,
}

impl Default for ListPullRequestsOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
            bypass_cache: false,
            sort_field: "updated".to_string(),
            sort_direction: "desc".to_string(),
        }
    }
}

impl ListPullRequestsOptions {
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn bypass_cache(mut self, bypass_cache: bool) -> Self {
        self.bypass_cache = bypass_cache;
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sort_field = field.into();
        self.sort_direction = direction.into();
        self
    }
}

/// Options for `list_user_repositories`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRepositoriesOptions {
    pub max_items: u32,
    /// Value of the `type` query parameter (`owner`, `all`, `member`, ...).
    pub connection_type: String,
    pub sort_field: String,
    pub sort_direction: String,
}

impl Default for ListRepositoriesOptions {
    fn default() -> Self {
        Self {
            max_items: 10,
            connection_type: "owner".to_string(),
            sort_field: "updated".to_string(),
            sort_direction: "desc".to_string(),
        }
    }
}

/// Cache key for an open pull request listing. Hashed by the store.
pub fn pull_requests_cache_key(
    owner: &str,
    name: &str,
    page_size: u32,
    max_pages: Option<u32>,
    sort_field: &str,
    sort_direction: &str,
) -> String {
    let max_pages = max_pages.map_or_else(|| "all".to_string(), |m| m.to_string());
    format!(
        "pull_requests:open:{}/{}:items_per_page={}:max_pages={}:sort={}:direction={}",
        owner, name, page_size, max_pages, sort_field, sort_direction
    )
}

/// Aggregate stored in the cache for a pull request listing.
#[derive(Debug, Serialize, Deserialize)]
struct CachedAggregate {
    #[serde(default)]
    schema_version: u32,
    items: Vec<Value>,
    #[serde(default)]
    pages_fetched: u32,
}

impl GitHubClient {
    /// List open pull requests, following `Link: rel="next"` pagination.
    ///
    /// Pages are fetched sequentially. The aggregate is cached under a key
    /// derived from the repository and options; with `bypass_cache` the
    /// lookup is skipped but the fresh result is still written.
    #[instrument(skip(self, options), fields(page_size = options.page_size, max_pages = ?options.max_pages))]
    pub async fn list_open_pull_requests(
        &mut self,
        repository: &str,
        options: &ListPullRequestsOptions,
    ) -> Result<OpenPullRequestsResult> {
        let (owner, name) = parse_repository_identifier(repository)?;
        let page_size = options.page_size.clamp(1, MAX_PAGE_SIZE);
        let max_pages = options.max_pages.map(|m| m.max(1));

        let cache_key = pull_requests_cache_key(
            &owner,
            &name,
            page_size,
            max_pages,
            &options.sort_field,
            &options.sort_direction,
        );

        if !options.bypass_cache {
            if let Some(aggregate) = self.cache.get(&cache_key).and_then(read_aggregate) {
                debug!(pages_fetched = aggregate.pages_fetched, "serving pull requests from cache");
                return Ok(OpenPullRequestsResult {
                    pull_requests: parse_batch(&aggregate.items),
                    pages_fetched: aggregate.pages_fetched,
                    response_was_from_cache: true,
                });
            }
        }

        let http = self.connect()?;
        let mut request = PageRequest::new(format!("/repos/{}/{}/pulls", owner, name))
            .param("state", "open")
            .param("per_page", page_size)
            .param("page", 1)
            .param("sort", &options.sort_field)
            .param("direction", &options.sort_direction);

        let mut pages_fetched: u32 = 0;
        let mut items: Vec<Value> = Vec::new();

        loop {
            let response = self.get(&http, &request).await?;
            let link_header = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();

            let Value::Array(page_items) = response.json::<Value>().await? else {
                debug!(pages_fetched, "response body is not a list; stopping");
                break;
            };
            items.extend(page_items.into_iter().filter(Value::is_object));
            pages_fetched += 1;

            if max_pages.is_some_and(|max| pages_fetched >= max) {
                debug!(pages_fetched, "page cap reached");
                break;
            }

            let links = parse_link_header(&link_header);
            let Some(next) = links.get("next") else {
                break;
            };
            request = PageRequest::from_next_link(next);

            tokio::task::yield_now().await;
        }
        drop(http);

        info!(pages_fetched, items = items.len(), "fetched open pull requests");

        let pull_requests = parse_batch(&items);
        let aggregate = CachedAggregate {
            schema_version: CACHE_SCHEMA_VERSION,
            items,
            pages_fetched,
        };
        self.cache.set(&cache_key, serde_json::to_value(&aggregate)?, None);

        Ok(OpenPullRequestsResult {
            pull_requests,
            pages_fetched,
            response_was_from_cache: false,
        })
    }

    /// List repositories the authenticated user can access (one page).
    ///
    /// Without a token this returns an empty list and makes no request.
    #[instrument(skip(self))]
    pub async fn list_user_repositories(
        &mut self,
        options: &ListRepositoriesOptions,
    ) -> Result<Vec<RepositorySummary>> {
        let Some(fingerprint) = self.token_fingerprint() else {
            debug!("no token configured; skipping user repositories");
            return Ok(Vec::new());
        };

        let max_items = options.max_items.clamp(1, MAX_PAGE_SIZE);
        let cache_key = format!(
            "user:repos:token={}:type={}:sort={}:direction={}:limit={}",
            fingerprint,
            options.connection_type,
            options.sort_field,
            options.sort_direction,
            max_items
        );

        if let Some(cached) = self.cache.get(&cache_key) {
            match serde_json::from_value::<Vec<RepositorySummary>>(cached) {
                Ok(repositories) if !repositories.is_empty() => return Ok(repositories),
                _ => debug!("ignoring unusable cached repositories"),
            }
        }

        let http = self.connect()?;
        let request = PageRequest::new("/user/repos")
            .param("type", &options.connection_type)
            .param("sort", &options.sort_field)
            .param("direction", &options.sort_direction)
            .param("per_page", max_items);
        let response = self.get(&http, &request).await?;

        let Value::Array(payload) = response.json::<Value>().await? else {
            return Ok(Vec::new());
        };
        let repositories: Vec<RepositorySummary> =
            payload.iter().filter_map(RepositorySummary::from_json).collect();

        self.cache.set(
            &cache_key,
            serde_json::to_value(&repositories)?,
            Some(USER_REPOSITORIES_TTL),
        );
        Ok(repositories)
    }

    /// Fetch `/rate_limit`, uncached, as raw JSON.
    #[instrument(skip(self))]
    pub async fn fetch_rate_limit_status(&mut self) -> Result<Value> {
        let http = self.connect()?;
        let response = self.get(&http, &PageRequest::new("/rate_limit")).await?;
        Ok(response.json().await?)
    }
}

fn read_aggregate(value: Value) -> Option<CachedAggregate> {
    let aggregate: CachedAggregate = serde_json::from_value(value).ok()?;
    (aggregate.schema_version == CACHE_SCHEMA_VERSION).then_some(aggregate)
}
