// Application settings.
// Built explicitly from environment lookups and handed to the client and cache.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::cache::{DEFAULT_TTL, cache_dir_or_temp};
use crate::error::{PrStatusError, Result};
use crate::github::client::{DEFAULT_REQUEST_TIMEOUT, GITHUB_API_BASE};

pub const DEFAULT_REPOSITORY: &str = "vercel/next.js";

/// Runtime configuration shared by the CLI, the HTTP server and the doctor.
#[derive(Debug)]
pub struct Settings {
    pub github_token: Option<SecretString>,
    pub api_base_url: String,
    pub default_repository: String,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub gemini_api_key: Option<SecretString>,
    pub cache_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_token: None,
            api_base_url: GITHUB_API_BASE.to_string(),
            default_repository: DEFAULT_REPOSITORY.to_string(),
            cache_ttl: DEFAULT_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            gemini_api_key: None,
            cache_dir: cache_dir_or_temp(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup`, which maps a variable name to its value.
    ///
    /// Blank values count as unset; unparseable numbers fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let cache_ttl = read("CACHE_TIME_TO_LIVE_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);
        let request_timeout = read("HTTP_REQUEST_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<f64>().ok())
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(defaults.request_timeout);

        Self {
            github_token: read("GITHUB_TOKEN").map(SecretString::from),
            api_base_url: read("GITHUB_API_BASE_URL").unwrap_or(defaults.api_base_url),
            default_repository: read("GITHUB_DEFAULT_REPOSITORY")
                .unwrap_or(defaults.default_repository),
            cache_ttl,
            request_timeout,
            gemini_api_key: read("GEMINI_API_KEY").map(SecretString::from),
            cache_dir: read("PR_STATUS_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
        }
    }

    /// The configured token, or `MissingToken` for commands that need one.
    pub fn require_token(&self) -> Result<&SecretString> {
        self.github_token.as_ref().ok_or(PrStatusError::MissingToken)
    }

    /// Copy of the configured token, for building a client.
    pub fn token(&self) -> Option<SecretString> {
        self.github_token.as_ref().map(copy_secret)
    }

    pub fn has_token(&self) -> bool {
        self.github_token.is_some()
    }
}

pub(crate) fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let settings = settings_from(&[]);
        assert!(settings.github_token.is_none());
        assert_eq!(settings.api_base_url, "https://api.github.com");
        assert_eq!(settings.default_repository, "vercel/next.js");
        assert_eq!(settings.cache_ttl, Duration::from_secs(90));
        assert_eq!(settings.request_timeout, Duration::from_secs(15));
        assert!(matches!(settings.require_token(), Err(PrStatusError::MissingToken)));
    }

    #[test]
    fn test_values_are_read_and_trimmed() {
        let settings = settings_from(&[
            ("GITHUB_TOKEN", "  ghp_abc  "),
            ("GITHUB_API_BASE_URL", "http://localhost:9999"),
            ("GITHUB_DEFAULT_REPOSITORY", "rust-lang/rust"),
            ("CACHE_TIME_TO_LIVE_SECONDS", "300"),
            ("HTTP_REQUEST_TIMEOUT_SECONDS", "2.5"),
            ("PR_STATUS_CACHE_DIR", "/tmp/prs"),
        ]);
        assert_eq!(settings.require_token().unwrap().expose_secret(), "ghp_abc");
        assert_eq!(settings.api_base_url, "http://localhost:9999");
        assert_eq!(settings.default_repository, "rust-lang/rust");
        assert_eq!(settings.cache_ttl, Duration::from_secs(300));
        assert_eq!(settings.request_timeout, Duration::from_millis(2500));
        assert_eq!(settings.cache_dir, PathBuf::from("/tmp/prs"));
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let settings = settings_from(&[
            ("CACHE_TIME_TO_LIVE_SECONDS", "soon"),
            ("HTTP_REQUEST_TIMEOUT_SECONDS", "-3"),
        ]);
        assert_eq!(settings.cache_ttl, DEFAULT_TTL);
        assert_eq!(settings.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_blank_token_is_unset() {
        let settings = settings_from(&[("GITHUB_TOKEN", "   ")]);
        assert!(!settings.has_token());
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let settings = settings_from(&[("GITHUB_TOKEN", "ghp_supersecret")]);
        assert!(!format!("{:?}", settings).contains("ghp_supersecret"));
    }
}
