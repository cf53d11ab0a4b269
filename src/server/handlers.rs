// HTTP request handlers.
// Pull request listing, user repositories, agent tools, summaries, and health.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::github::{
    ListPullRequestsOptions, ListRepositoriesOptions, PullRequestSummary, RepositorySummary,
};
use crate::tools::{ToolDefinition, agent_tools};

use super::error::ApiError;
use super::state::AppState;

pub const API_PAGE_SIZE: u32 = 50;
pub const SUMMARY_PAGE_SIZE: u32 = 100;
pub const MAX_API_PAGES: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct PullRequestsParams {
    pub repository: Option<String>,
    pub token: Option<String>,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default)]
    pub bypass_cache: bool,
}

fn default_max_pages() -> u32 {
    3
}

#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub author_avatar: String,
    pub html_url: String,
    pub labels: Vec<String>,
    pub is_draft: bool,
    pub state: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub body: String,
}

impl From<PullRequestSummary> for PullRequestResponse {
    fn from(pr: PullRequestSummary) -> Self {
        Self {
            number: pr.number,
            title: pr.title,
            author: pr.author_login,
            author_avatar: pr.author_avatar_url,
            html_url: pr.html_url,
            labels: pr.label_names,
            is_draft: pr.is_draft,
            state: pr.state,
            created_at: pr.created_at,
            updated_at: pr.updated_at,
            body: pr.body,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse {
    pub items: Vec<PullRequestResponse>,
    pub pages_fetched: u32,
    pub from_cache: bool,
    pub repository: String,
}

pub async fn list_pull_requests(
    State(state): State<Arc<AppState>>,
    params: Result<Query<PullRequestsParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse>, ApiError> {
    let Query(params) = params?;
    let repository = params
        .repository
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Query parameter 'repository' is required",
            )
        })?;
    if !(1..=MAX_API_PAGES).contains(&params.max_pages) {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("max_pages must be between 1 and {}", MAX_API_PAGES),
        ));
    }

    let token = state.resolve_token(params.token.as_deref());
    if token.is_none() {
        warn!("listing pull requests without a token; rate limits will be low");
    }
    let mut client = state.github_client(token);
    let options = ListPullRequestsOptions::default()
        .page_size(API_PAGE_SIZE)
        .max_pages(Some(params.max_pages))
        .bypass_cache(params.bypass_cache);
    let result = client.list_open_pull_requests(&repository, &options).await?;

    info!(
        %repository,
        count = result.pull_requests.len(),
        from_cache = result.response_was_from_cache,
        "served pull requests"
    );

    Ok(Json(PaginatedResponse {
        pages_fetched: result.pages_fetched,
        from_cache: result.response_was_from_cache,
        items: result.pull_requests.into_iter().map(Into::into).collect(),
        repository,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub token: Option<String>,
}

pub async fn list_user_repositories(
    State(state): State<Arc<AppState>>,
    params: Result<Query<TokenParams>, QueryRejection>,
) -> Result<Json<Vec<RepositorySummary>>, ApiError> {
    let Query(params) = params?;
    let token = state.resolve_token(params.token.as_deref()).ok_or_else(|| {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            "GitHub Token is required to list user repositories.",
        )
    })?;

    let mut client = state.github_client(Some(token));
    let options = ListRepositoriesOptions {
        max_items: 100,
        ..ListRepositoriesOptions::default()
    };
    Ok(Json(client.list_user_repositories(&options).await?))
}

pub async fn list_agent_tools() -> Json<Vec<ToolDefinition>> {
    Json(agent_tools())
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub repository: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

pub async fn summarize_pull_request(
    State(state): State<Arc<AppState>>,
    Path(number): Path<u64>,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let Query(params) = params?;
    let repository = params
        .repository
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Query parameter 'repository' is required",
            )
        })?;
    let token = state
        .resolve_token(params.token.as_deref())
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "GitHub Token required"))?;

    let mut client = state.github_client(Some(token));
    let options = ListPullRequestsOptions::default().page_size(SUMMARY_PAGE_SIZE);
    let result = client.list_open_pull_requests(&repository, &options).await?;

    let pull_request = result.find(number).ok_or_else(|| {
        ApiError::new(StatusCode::NOT_FOUND, "Pull Request not found in open list")
    })?;

    let summarizer = state.summarizer().map_err(|e| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("AI Service Config Error: {}", e),
        )
    })?;

    let summary = match summarizer.summarize_pull_request(pull_request).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(number, error = %e, "summary generation failed");
            format!("Could not generate summary: {}", e)
        }
    };
    Ok(Json(SummaryResponse { summary }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub github_reachable: bool,
    pub core_limit: Option<u64>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut client = state.github_client(state.settings.token());
    let core_limit = match client.fetch_rate_limit_status().await {
        Ok(payload) => Some(payload["resources"]["core"]["limit"].as_u64()),
        Err(e) => {
            warn!(error = %e, "GitHub is not reachable");
            None
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        github_reachable: core_limit.is_some(),
        core_limit: core_limit.flatten(),
    })
}
