// Link header parsing.
// Extracts rel -> URL relations from RFC 8288 style `Link` headers used for pagination.

use std::collections::HashMap;

/// Parse a `Link` header value into a map of relation name to URL.
///
/// Segments without a `<url>` token or a `rel=` parameter are ignored. A
/// relation repeated later in the header replaces the earlier one.
pub fn parse_link_header(header: &str) -> HashMap<String, String> {
    let mut links = HashMap::new();

    for segment in split_segments(header) {
        let segment = segment.trim();
        let Some(rest) = segment.strip_prefix('<') else {
            continue;
        };
        let Some((url, params)) = rest.split_once('>') else {
            continue;
        };

        let relation = params
            .split(';')
            .filter_map(|param| param.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("rel"))
            .map(|(_, value)| value.trim().trim_matches('"').trim());

        if let Some(relation) = relation.filter(|r| !r.is_empty()) {
            links.insert(relation.to_string(), url.trim().to_string());
        }
    }

    links
}

/// Split on commas that are not inside `<...>`.
fn split_segments(header: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in header.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                segments.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&header[start..]);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_next_and_last() {
        let links = parse_link_header(
            r#"<https://api.x.com/page2>; rel="next", <https://api.x.com/page9>; rel="last""#,
        );
        assert_eq!(links.len(), 2);
        assert_eq!(links["next"], "https://api.x.com/page2");
        assert_eq!(links["last"], "https://api.x.com/page9");
    }

    #[test]
    fn test_empty_and_garbage_headers() {
        assert!(parse_link_header("").is_empty());
        assert!(parse_link_header("   ").is_empty());
        assert!(parse_link_header("not a link header").is_empty());
        assert!(parse_link_header("<https://api.x.com/page2").is_empty());
    }

    #[test]
    fn test_segment_without_rel_is_ignored() {
        let links = parse_link_header(
            r#"<https://api.x.com/a>; title="first", <https://api.x.com/b>; rel="prev""#,
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links["prev"], "https://api.x.com/b");
    }

    #[test]
    fn test_segment_without_url_is_ignored() {
        let links = parse_link_header(r#"https://api.x.com/a; rel="next""#);
        assert!(links.is_empty());
    }

    #[test]
    fn test_unquoted_rel_and_extra_params() {
        let links = parse_link_header("<https://api.x.com/p3>; type=json; rel=next");
        assert_eq!(links["next"], "https://api.x.com/p3");
    }

    #[test]
    fn test_commas_inside_url_are_kept() {
        let links = parse_link_header(r#"<https://api.x.com/p?labels=a,b&page=2>; rel="next""#);
        assert_eq!(links["next"], "https://api.x.com/p?labels=a,b&page=2");
    }

    #[test]
    fn test_repeated_relation_last_wins() {
        let links = parse_link_header(r#"<https://a/1>; rel="next", <https://a/2>; rel="next""#);
        assert_eq!(links["next"], "https://a/2");
    }

    #[test]
    fn test_relative_url() {
        let links = parse_link_header(r#"</repos/o/r/pulls?page=2>; rel="next""#);
        assert_eq!(links["next"], "/repos/o/r/pulls?page=2");
    }
}
