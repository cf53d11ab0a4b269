// GitHub API response types.
// Validated pull request and repository summaries parsed from raw JSON payloads.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Open pull request, reduced to the fields the presentation layers use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    pub author_login: String,
    pub author_avatar_url: String,
    pub html_url: String,
    pub label_names: Vec<String>,
    pub is_draft: bool,
    pub state: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub body: String,
}

/// Why a single pull request payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PullRequestParseError {
    #[error("pull request payload is not an object")]
    NotAnObject,

    #[error("pull request number is missing or not a positive integer")]
    InvalidNumber,

    #[error("{field} is not a valid ISO-8601 timestamp: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },
}

impl PullRequestSummary {
    /// Parse one pull request object from the GitHub REST API.
    pub fn from_json(payload: &Value) -> Result<Self, PullRequestParseError> {
        let object = payload
            .as_object()
            .ok_or(PullRequestParseError::NotAnObject)?;

        let number = coerce_number(object.get("number")).ok_or(PullRequestParseError::InvalidNumber)?;

        let label_names = object
            .get("labels")
            .and_then(Value::as_array)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|label| label.as_object()?.get("name").map(text))
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let user = object.get("user").and_then(Value::as_object);
        let author_login = user
            .and_then(|u| u.get("login"))
            .map(text)
            .filter(|login| !login.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        let author_avatar_url = user
            .and_then(|u| u.get("avatar_url"))
            .map(text)
            .unwrap_or_default();

        let state = object
            .get("state")
            .map(text)
            .filter(|state| !state.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            number,
            title: field_text(object.get("title")),
            author_login,
            author_avatar_url,
            html_url: field_text(object.get("html_url")),
            label_names,
            is_draft: object.get("draft").and_then(Value::as_bool).unwrap_or(false),
            state,
            created_at: timestamp_field(object.get("created_at"), "created_at")?,
            updated_at: timestamp_field(object.get("updated_at"), "updated_at")?,
            body: object.get("body").map(raw_text).unwrap_or_default(),
        })
    }
}

/// Parse a batch of raw pull request payloads.
///
/// Items that fail to parse are dropped; the survivors keep their order.
pub fn parse_batch<'a, I>(items: I) -> Vec<PullRequestSummary>
where
    I: IntoIterator<Item = &'a Value>,
{
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match PullRequestSummary::from_json(item) {
            Ok(summary) => Some(summary),
            Err(e) => {
                debug!(index, error = %e, "skipping malformed pull request");
                None
            }
        })
        .collect()
}

/// Parse a GitHub timestamp. A trailing `Z` means UTC; timestamps without an
/// offset are read as UTC as well.
pub fn parse_github_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    let normalized = match trimmed.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => trimmed.to_string(),
    };

    DateTime::parse_from_rfc3339(&normalized).ok().or_else(|| {
        NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

fn coerce_number(value: Option<&Value>) -> Option<u64> {
    let number = match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 1.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (number > 0).then_some(number)
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => raw_text(other),
    }
}

/// Like `text` but keeps string whitespace intact.
fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn field_text(value: Option<&Value>) -> String {
    value.map(text).unwrap_or_default()
}

fn timestamp_field(
    value: Option<&Value>,
    field: &'static str,
) -> Result<DateTime<FixedOffset>, PullRequestParseError> {
    let raw = field_text(value);
    parse_github_datetime(&raw).ok_or(PullRequestParseError::InvalidTimestamp { field, value: raw })
}

/// Result of a `list_open_pull_requests` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPullRequestsResult {
    /// Pull requests in API response order.
    pub pull_requests: Vec<PullRequestSummary>,
    /// Pages fetched by this call, or recorded when the cache entry was written.
    pub pages_fetched: u32,
    pub response_was_from_cache: bool,
}

impl OpenPullRequestsResult {
    /// Find a pull request by number.
    pub fn find(&self, number: u64) -> Option<&PullRequestSummary> {
        self.pull_requests.iter().find(|pr| pr.number == number)
    }
}

/// Repository accessible to the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    pub updated_at: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

impl RepositorySummary {
    /// Strip a repository object down to its summary. Entries without a
    /// `full_name` yield `None`.
    pub fn from_json(payload: &Value) -> Option<Self> {
        let object = payload.as_object()?;
        let full_name = object
            .get("full_name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())?;
        let optional_text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            full_name: full_name.to_string(),
            private: object.get("private").and_then(Value::as_bool).unwrap_or(false),
            updated_at: optional_text("updated_at"),
            description: optional_text("description"),
            html_url: optional_text("html_url").unwrap_or_default(),
        })
    }
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset: Option<u64>,
}

impl RateLimit {
    /// Read the `X-RateLimit-*` headers; absent or non-numeric values are `None`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        };

        Self {
            limit: read("x-ratelimit-limit"),
            remaining: read("x-ratelimit-remaining"),
            reset: read("x-ratelimit-reset"),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}
