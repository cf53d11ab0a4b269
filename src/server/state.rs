// HTTP server state.
// Settings shared by every request handler; clients and caches are built per request.

use secrecy::SecretString;

use crate::cache::TtlCache;
use crate::config::{Settings, copy_secret};
use crate::error::Result;
use crate::github::GitHubClient;
use crate::summarize::{GEMINI_API_BASE, GeminiClient};

#[derive(Debug)]
pub struct AppState {
    pub settings: Settings,
    pub gemini_base_url: String,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            gemini_base_url: GEMINI_API_BASE.to_string(),
        }
    }

    pub fn with_gemini_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.gemini_base_url = base_url.into();
        self
    }

    /// Prefer a non-blank `token` query parameter over the configured token.
    pub fn resolve_token(&self, token: Option<&str>) -> Option<SecretString> {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => Some(SecretString::from(token.to_string())),
            None => self.settings.token(),
        }
    }

    /// A fresh client and cache store instance over the shared cache file.
    pub fn github_client(&self, token: Option<SecretString>) -> GitHubClient {
        let cache = TtlCache::new(&self.settings.cache_dir, self.settings.cache_ttl);
        GitHubClient::new(token, cache)
            .with_base_url(&self.settings.api_base_url)
            .with_timeout(self.settings.request_timeout)
    }

    pub fn summarizer(&self) -> Result<GeminiClient> {
        let key = self.settings.gemini_api_key.as_ref().map(copy_secret);
        Ok(GeminiClient::new(key)?.with_base_url(&self.gemini_base_url))
    }
}
