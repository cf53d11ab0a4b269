// Error types for pr-status.
// Classifies GitHub API failures, repository validation, and local errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrStatusError {
    #[error("Repository must be in the form 'owner/name' (got {input:?})")]
    InvalidRepository { input: String },

    #[error("Unauthorized (401). Check your GITHUB_TOKEN.")]
    Unauthorized,

    #[error("Not found (404): {0}. Check repository owner/name.")]
    NotFound(String),

    #[error("Rate limit exceeded (403). Remaining={}.{}", format_remaining(*.remaining), format_reset(*.reset_unix_epoch_seconds))]
    RateLimited {
        remaining: Option<u64>,
        reset_unix_epoch_seconds: Option<u64>,
    },

    #[error("GitHub API error: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing GITHUB_TOKEN. Export it as an environment variable or set it in .env.")]
    MissingToken,

    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("Summarizer error: {0}")]
    Summarizer(String),

    #[error("{0}")]
    Other(String),
}

impl PrStatusError {
    /// Whether this error was classified from a GitHub response or input
    /// validation, as opposed to an unexpected local or transport failure.
    pub fn is_github_error(&self) -> bool {
        matches!(
            self,
            PrStatusError::InvalidRepository { .. }
                | PrStatusError::Unauthorized
                | PrStatusError::NotFound(_)
                | PrStatusError::RateLimited { .. }
                | PrStatusError::Api { .. }
        )
    }
}

fn format_remaining(remaining: Option<u64>) -> String {
    remaining.map_or_else(|| "unknown".to_string(), |r| r.to_string())
}

fn format_reset(reset: Option<u64>) -> String {
    match reset {
        Some(epoch) => format!(" reset_unix_epoch_seconds={}", epoch),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, PrStatusError>;
