// Terminal rendering for pull request listings.
// Plain-text table and JSON document output used by the CLI.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::github::{OpenPullRequestsResult, PullRequestSummary};

const TITLE_WIDTH: usize = 60;
const HEADERS: [&str; 7] = ["PR #", "Title", "Author", "Labels", "Readiness", "Updated", "URL"];

/// Format the time between `timestamp` and `now` as `Ns`, `Nm`, `Nh` (under
/// 48 hours) or `Nd`. Future timestamps render as `0s`.
pub fn format_relative_age(timestamp: &DateTime<FixedOffset>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(*timestamp).num_seconds().max(0);

    if seconds < 60 {
        return format!("{}s", seconds);
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }
    let hours = minutes / 60;
    if hours < 48 {
        return format!("{}h", hours);
    }
    format!("{}d", hours / 24)
}

fn or_dash(text: &str) -> String {
    if text.trim().is_empty() {
        "-".to_string()
    } else {
        text.to_string()
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(width.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}

fn table_row(pull_request: &PullRequestSummary, now: DateTime<Utc>) -> [String; 7] {
    let labels = if pull_request.label_names.is_empty() {
        "-".to_string()
    } else {
        pull_request.label_names.join(", ")
    };
    let readiness = if pull_request.is_draft { "DRAFT" } else { "READY" };

    [
        pull_request.number.to_string(),
        truncate(&or_dash(&pull_request.title), TITLE_WIDTH),
        or_dash(&pull_request.author_login),
        labels,
        readiness.to_string(),
        format_relative_age(&pull_request.updated_at, now),
        or_dash(&pull_request.html_url),
    ]
}

/// Table caption: `Open Pull Requests (<repo> • pages=<n> • cache|live)`.
pub fn table_title(repository: &str, result: &OpenPullRequestsResult) -> String {
    let source = if result.response_was_from_cache {
        "cache"
    } else {
        "live"
    };
    format!(
        "Open Pull Requests ({} • pages={} • {})",
        repository, result.pages_fetched, source
    )
}

/// Render up to `max_rows` pull requests (all when `None`) as an aligned table.
pub fn render_table(
    repository: &str,
    result: &OpenPullRequestsResult,
    max_rows: Option<usize>,
    now: DateTime<Utc>,
) -> String {
    let limit = max_rows.unwrap_or(usize::MAX);
    let rows: Vec<[String; 7]> = result
        .pull_requests
        .iter()
        .take(limit)
        .map(|pr| table_row(pr, now))
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(cell.chars().count());
                format!("{}{}", cell, " ".repeat(pad))
            })
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();

    let mut lines = vec![table_title(repository, result), String::new()];
    lines.push(format_line(header.as_slice()));
    lines.push(format_line(rule.as_slice()));
    lines.extend(rows.iter().map(|row| format_line(row.as_slice())));
    if rows.is_empty() {
        lines.push("(no open pull requests)".to_string());
    }

    lines.join("\n")
}

#[derive(Debug, Serialize)]
pub struct ListingItem<'a> {
    pub pull_request_number: u64,
    pub title: &'a str,
    pub author_login: &'a str,
    pub html_url: &'a str,
    pub label_names: &'a [String],
    pub is_draft: bool,
    pub state: &'a str,
    pub created_at: String,
    pub updated_at: String,
}

/// JSON document printed by `pull-requests list --output-json`.
#[derive(Debug, Serialize)]
pub struct ListingDocument<'a> {
    pub repository: &'a str,
    pub pages_fetched: u32,
    pub response_was_from_cache: bool,
    pub count: usize,
    pub items: Vec<ListingItem<'a>>,
}

impl<'a> ListingDocument<'a> {
    pub fn new(repository: &'a str, result: &'a OpenPullRequestsResult, max_rows: Option<usize>) -> Self {
        let items: Vec<ListingItem<'a>> = result
            .pull_requests
            .iter()
            .take(max_rows.unwrap_or(usize::MAX))
            .map(|pr| ListingItem {
                pull_request_number: pr.number,
                title: &pr.title,
                author_login: &pr.author_login,
                html_url: &pr.html_url,
                label_names: &pr.label_names,
                is_draft: pr.is_draft,
                state: &pr.state,
                created_at: pr.created_at.to_rfc3339(),
                updated_at: pr.updated_at.to_rfc3339(),
            })
            .collect();

        Self {
            repository,
            pages_fetched: result.pages_fetched,
            response_was_from_cache: result.response_was_from_cache,
            count: items.len(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn ago(duration: Duration) -> DateTime<FixedOffset> {
        (now() - duration).fixed_offset()
    }

    fn pull_request(number: u64, title: &str, draft: bool, labels: &[&str]) -> PullRequestSummary {
        PullRequestSummary {
            number,
            title: title.to_string(),
            author_login: "octocat".to_string(),
            author_avatar_url: String::new(),
            html_url: format!("https://github.com/o/r/pull/{}", number),
            label_names: labels.iter().map(|l| l.to_string()).collect(),
            is_draft: draft,
            state: "open".to_string(),
            created_at: ago(Duration::days(3)),
            updated_at: ago(Duration::minutes(5)),
            body: String::new(),
        }
    }

    fn result(pull_requests: Vec<PullRequestSummary>, cached: bool) -> OpenPullRequestsResult {
        OpenPullRequestsResult {
            pull_requests,
            pages_fetched: 2,
            response_was_from_cache: cached,
        }
    }

    #[test]
    fn test_relative_age_buckets() {
        assert_eq!(format_relative_age(&ago(Duration::seconds(59)), now()), "59s");
        assert_eq!(format_relative_age(&ago(Duration::seconds(60)), now()), "1m");
        assert_eq!(format_relative_age(&ago(Duration::minutes(59)), now()), "59m");
        assert_eq!(format_relative_age(&ago(Duration::hours(47)), now()), "47h");
        assert_eq!(format_relative_age(&ago(Duration::hours(48)), now()), "2d");
        assert_eq!(format_relative_age(&ago(Duration::days(30)), now()), "30d");
    }

    #[test]
    fn test_relative_age_future_is_zero() {
        let future = (now() + Duration::minutes(3)).fixed_offset();
        assert_eq!(format_relative_age(&future, now()), "0s");
    }

    #[test]
    fn test_table_title_marks_source() {
        assert_eq!(
            table_title("o/r", &result(vec![], true)),
            "Open Pull Requests (o/r • pages=2 • cache)"
        );
        assert_eq!(
            table_title("o/r", &result(vec![], false)),
            "Open Pull Requests (o/r • pages=2 • live)"
        );
    }

    #[test]
    fn test_table_rows_and_limit() {
        let listing = result(
            vec![
                pull_request(1, "First", false, &["bug", "ui"]),
                pull_request(2, "", true, &[]),
                pull_request(3, "Third", false, &[]),
            ],
            false,
        );
        let table = render_table("o/r", &listing, Some(2), now());
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[2].starts_with("PR #"));
        assert!(lines[4].contains("First") && lines[4].contains("bug, ui") && lines[4].contains("READY"));
        assert!(lines[4].contains("5m"));
        assert!(lines[5].contains("DRAFT"));
        assert!(lines[5].starts_with("2 "));
        assert!(!table.contains("Third"));
    }

    #[test]
    fn test_empty_table_has_placeholder() {
        let table = render_table("o/r", &result(vec![], false), None, now());
        assert!(table.ends_with("(no open pull requests)"));
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let long = "x".repeat(100);
        let table = render_table("o/r", &result(vec![pull_request(1, &long, false, &[])], false), None, now());
        assert!(!table.contains(&long));
        assert!(table.contains('…'));
    }

    #[test]
    fn test_listing_document_shape() {
        let listing = result(vec![pull_request(7, "Seven", true, &["wip"])], true);
        let document = serde_json::to_value(ListingDocument::new("o/r", &listing, None)).unwrap();

        assert_eq!(document["repository"], "o/r");
        assert_eq!(document["pages_fetched"], 2);
        assert_eq!(document["response_was_from_cache"], true);
        assert_eq!(document["count"], 1);
        assert_eq!(document["items"][0]["pull_request_number"], 7);
        assert_eq!(document["items"][0]["label_names"][0], "wip");
        assert_eq!(document["items"][0]["is_draft"], true);
        assert!(document["items"][0].get("body").is_none());
    }
}
