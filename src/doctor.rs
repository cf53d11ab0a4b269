// Self-check for a local installation.
// Verifies the token, API reachability, pagination and the cache against live GitHub.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::github::{GitHubClient, ListPullRequestsOptions};

/// A core limit at or above this means requests are authenticated.
const AUTHENTICATED_CORE_LIMIT: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    pub notes: String,
    /// A failed critical check makes the doctor exit non-zero.
    pub critical: bool,
}

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub checks: Vec<Check>,
}

impl DoctorReport {
    fn push(&mut self, name: &'static str, passed: bool, notes: impl Into<String>, critical: bool) {
        self.checks.push(Check {
            name,
            passed,
            notes: notes.into(),
            critical,
        });
    }

    pub fn has_critical_failure(&self) -> bool {
        self.checks.iter().any(|c| c.critical && !c.passed)
    }

    pub fn render(&self) -> String {
        let width = self
            .checks
            .iter()
            .map(|c| c.name.chars().count())
            .max()
            .unwrap_or(0);

        let mut lines = vec!["Doctor Checklist".to_string(), String::new()];
        for check in &self.checks {
            let result = if check.passed { "PASS" } else { "FAIL" };
            let pad = " ".repeat(width - check.name.chars().count());
            lines.push(format!("{}{}  {}  {}", check.name, pad, result, check.notes));
        }
        lines.join("\n")
    }
}

fn core_limit(payload: &Value) -> u64 {
    payload["resources"]["core"]["limit"].as_u64().unwrap_or(0)
}

/// Run every check. Failures are recorded in the report, never returned.
pub async fn run(settings: &Settings, env_file: Option<&Path>) -> DoctorReport {
    let mut report = DoctorReport::default();

    if let Some(path) = env_file {
        report.push(
            ".env file exists",
            path.exists(),
            format!("Expected at: {}", path.display()),
            false,
        );
    }

    report.push(
        "GITHUB_TOKEN is set",
        settings.has_token(),
        "Set via environment variable or .env",
        true,
    );

    let mut client = GitHubClient::from_settings(settings);
    let limit = match client.fetch_rate_limit_status().await {
        Ok(payload) => core_limit(&payload),
        Err(e) => {
            warn!(error = %e, "rate limit check failed");
            0
        }
    };
    report.push(
        "GitHub API call works (/rate_limit)",
        limit > 0,
        "Network + GitHub API reachable",
        true,
    );
    report.push(
        "Authentication likely active (high rate limit)",
        limit >= AUTHENTICATED_CORE_LIMIT,
        format!("core.limit={}; with a token it is usually 5000", limit),
        false,
    );

    let (paginated, cached) = if settings.has_token() {
        exercise_pagination_and_cache(&mut client, &settings.default_repository).await
    } else {
        (false, false)
    };
    report.push(
        "Pagination exercised (>=2 pages)",
        paginated,
        "Follows Link rel=\"next\"",
        false,
    );
    report.push(
        "Cache exercised (2nd call served from cache)",
        cached,
        "TTL cache prevents repeated API calls",
        false,
    );

    report
}

async fn exercise_pagination_and_cache(client: &mut GitHubClient, repository: &str) -> (bool, bool) {
    let options = ListPullRequestsOptions::default()
        .page_size(1)
        .max_pages(Some(2));

    let paginated = match client
        .list_open_pull_requests(repository, &options.clone().bypass_cache(true))
        .await
    {
        Ok(result) => result.pages_fetched >= 2,
        Err(e) => {
            warn!(error = %e, "pagination check failed");
            return (false, false);
        }
    };

    let cached = match client.list_open_pull_requests(repository, &options).await {
        Ok(result) => result.response_was_from_cache,
        Err(e) => {
            debug!(error = %e, "cache check failed");
            false
        }
    };

    (paginated, cached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer, dir: &TempDir, token: Option<&str>) -> Settings {
        Settings {
            github_token: token.map(|t| SecretString::from(t.to_string())),
            api_base_url: server.uri(),
            default_repository: "o/r".to_string(),
            cache_dir: dir.path().to_path_buf(),
            ..Settings::default()
        }
    }

    fn passed(report: &DoctorReport, name: &str) -> bool {
        report
            .checks
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.passed)
            .unwrap()
    }

    #[tokio::test]
    async fn test_all_checks_pass() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"resources": {"core": {"limit": 5000}}})),
            )
            .mount(&server)
            .await;
        let next = format!("<{}/repos/o/r/pulls?page=2>; rel=\"next\"", server.uri());
        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .insert_header("Link", next.as_str()),
            )
            .expect(2)
            .mount(&server)
            .await;

        let report = run(&settings(&server, &dir, Some("t")), None).await;
        assert!(report.checks.iter().all(|c| c.passed), "{}", report.render());
        assert!(!report.has_critical_failure());
    }

    #[tokio::test]
    async fn test_missing_token_is_critical() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"resources": {"core": {"limit": 60}}})),
            )
            .mount(&server)
            .await;

        let report = run(&settings(&server, &dir, None), None).await;
        assert!(!passed(&report, "GITHUB_TOKEN is set"));
        assert!(passed(&report, "GitHub API call works (/rate_limit)"));
        assert!(!passed(&report, "Authentication likely active (high rate limit)"));
        assert!(!passed(&report, "Pagination exercised (>=2 pages)"));
        assert!(report.has_critical_failure());
    }

    #[tokio::test]
    async fn test_unreachable_api_fails_checks() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let env_file = dir.path().join(".env");
        let report = run(&settings(&server, &dir, Some("t")), Some(env_file.as_path())).await;
        assert!(!passed(&report, ".env file exists"));
        assert!(!passed(&report, "GitHub API call works (/rate_limit)"));
        assert!(!passed(&report, "Cache exercised (2nd call served from cache)"));
        assert!(report.has_critical_failure());
        assert!(report.render().contains("FAIL"));
    }
}
