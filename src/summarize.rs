// Pull request summarization.
// Gemini generateContent client that turns a pull request title and body into a short summary.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{PrStatusError, Result};
use crate::github::PullRequestSummary;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug)]
pub struct GeminiClient {
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Fails with `MissingApiKey` when no non-blank key is given.
    pub fn new(api_key: Option<SecretString>) -> Result<Self> {
        let api_key = api_key
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or(PrStatusError::MissingApiKey)?;

        Ok(Self {
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = base_url.as_ref().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Summarize a pull request, returning the model's Markdown text.
    #[instrument(skip(self, pull_request), fields(number = pull_request.number))]
    pub async fn summarize_pull_request(&self, pull_request: &PullRequestSummary) -> Result<String> {
        let prompt = build_prompt(&pull_request.title, &pull_request.body);
        self.generate(&prompt).await
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(self.api_key.expose_secret().trim())
            .map_err(|e| PrStatusError::Summarizer(format!("invalid API key header: {}", e)))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!(endpoint = %self.endpoint(), "requesting summary");
        let response = http.post(self.endpoint()).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PrStatusError::Summarizer(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let payload: GenerateContentResponse = response.json().await?;
        extract_text(payload)
    }
}

/// Prompt asking for a concise Markdown summary of intent, changes, and risks.
pub fn build_prompt(title: &str, body: &str) -> String {
    let body = if body.trim().is_empty() {
        "(no description provided)"
    } else {
        body.trim()
    };

    format!(
        "You are an expert software engineer. Please summarize the following Pull Request.\n\n\
         Title: {}\n\n\
         Description:\n{}\n\n\
         Provide a concise summary of the changes, the intent, and any potential risks. \
         Format your response in Markdown.",
        title.trim(),
        body
    )
}

fn extract_text(payload: GenerateContentResponse) -> Result<String> {
    let text: String = payload
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(PrStatusError::Summarizer(
            "response contained no text".to_string(),
        ));
    }
    Ok(text)
}
