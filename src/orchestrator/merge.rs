//! Merge ordered backend results into one formatted document.
//!
//! The first successful backend's content leads; remaining successes
//! are grouped under an `Additional Information` header; every captured
//! URL is listed in a numbered `Sources` section in backend order. The
//! assembled text is handed to the response formatter together with the
//! fixed-slot status header.

use crate::config::AggregatorConfig;
use crate::format;
use crate::types::{SearchResult, SearchStatus};

/// Assemble the merged result document and format it for display.
///
/// `results` must be in configuration order (as produced by
/// [`crate::orchestrator::orchestrate_search`]); ordering determines
/// which backend leads and the numbering of the sources list.
pub fn format_results(results: &[SearchResult], config: &AggregatorConfig) -> String {
    let raw = merge_results(results);
    let status = SearchStatus::from_results(results);
    format::format_response(&raw, &status, config.include_thinking)
}

/// Concatenate successful backend contents into the raw merged text.
pub(crate) fn merge_results(results: &[SearchResult]) -> String {
    let successful: Vec<&SearchResult> = results.iter().filter(|r| r.is_success()).collect();

    let mut text = String::new();

    if let Some(lead) = successful.first() {
        text.push_str(&lead.content);
        text.push_str("\n\n");
    }

    if successful.len() > 1 {
        text.push_str("### Additional Information\n");
        for result in &successful[1..] {
            text.push_str(&result.content);
            text.push_str("\n\n");
        }
    }

    let urls: Vec<&str> = successful.iter().filter_map(|r| r.url.as_deref()).collect();
    if !urls.is_empty() {
        text.push_str("### Sources\n");
        for (index, url) in urls.iter().enumerate() {
            text.push_str(&format!("[{}] {url}\n", index + 1));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Backend;

    fn ok(backend: Backend, content: &str, url: Option<&str>) -> SearchResult {
        SearchResult::ok(backend, content.to_string(), url.map(str::to_string))
    }

    #[test]
    fn first_success_leads_document() {
        let results = vec![
            ok(Backend::DuckDuckGo, "lead content", Some("https://a.com")),
            ok(Backend::Perplexica, "secondary content", Some("https://b.com")),
        ];
        let raw = merge_results(&results);
        assert!(raw.starts_with("lead content"));
        let additional = raw.find("### Additional Information").expect("header");
        assert!(raw.find("secondary content").expect("secondary") > additional);
    }

    #[test]
    fn failed_backends_are_skipped_in_body() {
        let results = vec![
            SearchResult::failed(Backend::DuckDuckGo, "down".into()),
            ok(Backend::Perplexica, "only survivor", None),
        ];
        let raw = merge_results(&results);
        assert!(raw.starts_with("only survivor"));
        assert!(!raw.contains("Additional Information"));
        assert!(!raw.contains("down"));
    }

    #[test]
    fn sources_numbered_in_backend_order() {
        let results = vec![
            ok(Backend::DuckDuckGo, "a", Some("https://first.com")),
            ok(Backend::Perplexica, "b", Some("https://second.com")),
        ];
        let raw = merge_results(&results);
        assert!(raw.contains("[1] https://first.com"));
        assert!(raw.contains("[2] https://second.com"));
        assert!(raw.find("[1]").expect("[1]") < raw.find("[2]").expect("[2]"));
    }

    #[test]
    fn successful_result_without_url_skips_sources_entry() {
        let results = vec![ok(Backend::DuckDuckGo, "content", None)];
        let raw = merge_results(&results);
        assert!(!raw.contains("### Sources"));
    }

    #[test]
    fn all_failed_yields_empty_body() {
        let results = vec![
            SearchResult::failed(Backend::DuckDuckGo, "x".into()),
            SearchResult::failed(Backend::Perplexica, "y".into()),
        ];
        assert!(merge_results(&results).is_empty());
    }

    #[test]
    fn bullet_items_keep_their_url_lines_through_formatting() {
        let config = AggregatorConfig::default();
        let results = vec![ok(
            Backend::DuckDuckGo,
            "• Cat Facts\n  URL: https://catfacts.example.com\n\n\
             • Cat Trivia\n  URL: https://trivia.example.com",
            Some("https://catfacts.example.com"),
        )];
        let document = format_results(&results, &config);
        assert!(document.contains("• Cat Facts\n  URL: https://catfacts.example.com"));
        assert!(document.contains("• Cat Trivia\n  URL: https://trivia.example.com"));
    }

    #[test]
    fn formatted_document_carries_status_header() {
        let config = AggregatorConfig::default();
        let results = vec![
            ok(Backend::DuckDuckGo, "cat facts", Some("https://cats.example.com")),
            SearchResult::failed(Backend::Perplexica, "timeout".into()),
        ];
        let document = format_results(&results, &config);
        assert!(document.starts_with("Search Sources Used:"));
        assert!(document.contains("✅ DuckDuckGo"));
        assert!(document.contains("❌ Perplexica"));
        assert!(document.contains("⚠️ Brave"));
        assert!(document.contains("cat facts"));
    }
}
