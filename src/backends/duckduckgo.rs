//! DuckDuckGo backend — scrapes the HTML-only endpoint.
//!
//! Uses `https://html.duckduckgo.com/html/`, which requires no
//! JavaScript and is tolerant of automated requests. Result links are
//! wrapped in a redirect (`//duckduckgo.com/l/?uddg=…`) that must be
//! unwrapped to recover the target URL.

use crate::backend::SearchBackend;
use crate::config::AggregatorConfig;
use crate::error::AggregatorError;
use crate::http;
use crate::types::{render_items, Backend, RawItem};
use scraper::{Html, Selector};
use url::Url;

/// DuckDuckGo HTML scraper backend. No key required.
pub struct DuckDuckGoBackend;

impl DuckDuckGoBackend {
    /// Unwrap DuckDuckGo's redirect wrapper around result URLs.
    ///
    /// Links look like `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=…`;
    /// the `uddg` query parameter holds the percent-encoded target.
    fn extract_url(href: &str) -> Option<String> {
        let full_href = if href.starts_with("//") {
            format!("https:{href}")
        } else {
            href.to_string()
        };

        let parsed = Url::parse(&full_href).ok()?;

        if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        } else {
            Some(full_href)
        }
    }
}

impl SearchBackend for DuckDuckGoBackend {
    async fn search(
        &self,
        query: &str,
        config: &AggregatorConfig,
    ) -> Result<String, AggregatorError> {
        tracing::trace!(query, "DuckDuckGo search");

        let client = http::build_client(config)?;

        let mut params = vec![("q", query)];
        if config.safe_search {
            params.push(("kp", "1"));
        }

        let response = client
            .post("https://html.duckduckgo.com/html/")
            .form(&params)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| http::request_error(Backend::DuckDuckGo, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(http::status_error(Backend::DuckDuckGo, status));
        }

        let html = response
            .text()
            .await
            .map_err(|e| http::request_error(Backend::DuckDuckGo, e))?;

        tracing::trace!(bytes = html.len(), "DuckDuckGo response received");

        let items = parse_result_page(&html)?;
        if items.is_empty() {
            return Err(AggregatorError::Parse(
                "DuckDuckGo returned no results".into(),
            ));
        }
        Ok(render_items(&items, config.max_items_per_backend))
    }

    fn backend_type(&self) -> Backend {
        Backend::DuckDuckGo
    }
}

/// Parse a DuckDuckGo HTML results page into raw items.
///
/// Ads (`.result--ad`) are excluded; entries without a title link are
/// skipped.
pub(crate) fn parse_result_page(html: &str) -> Result<Vec<RawItem>, AggregatorError> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse(
        ".result.results_links.results_links_deep:not(.result--ad), .web-result:not(.result--ad)",
    )
    .map_err(|e| AggregatorError::Parse(format!("invalid result selector: {e:?}")))?;
    let title_sel = Selector::parse(".result__a")
        .map_err(|e| AggregatorError::Parse(format!("invalid title selector: {e:?}")))?;
    let snippet_sel = Selector::parse(".result__snippet")
        .map_err(|e| AggregatorError::Parse(format!("invalid snippet selector: {e:?}")))?;

    let mut items = Vec::new();

    for element in document.select(&result_sel) {
        let title_el = match element.select(&title_sel).next() {
            Some(el) => el,
            None => continue,
        };

        let title = title_el.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let url = title_el
            .value()
            .attr("href")
            .and_then(DuckDuckGoBackend::extract_url);

        let description = element
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty());

        items.push(RawItem {
            title: Some(title),
            description,
            url,
        });
    }

    tracing::debug!(count = items.len(), "DuckDuckGo results parsed");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_DDG_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<div class="result results_links results_links_deep web-result">
    <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc123">
        Rust Programming Language
    </a>
    <div class="result__snippet">
        A language empowering everyone to build reliable and efficient software.
    </div>
</div>
<div class="result results_links results_links_deep web-result">
    <a class="result__a" href="https://doc.rust-lang.org/book/">
        The Rust Programming Language Book
    </a>
    <div class="result__snippet">
        An introductory book about Rust.
    </div>
</div>
<div class="result results_links results_links_deep web-result">
    <a class="result__a" href="https://no-snippet.example.com/">
        Bare Result
    </a>
</div>
</body>
</html>"#;

    #[test]
    fn extract_url_from_redirect_wrapper() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=abc";
        assert_eq!(
            DuckDuckGoBackend::extract_url(href),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn extract_url_direct_link_passes_through() {
        assert_eq!(
            DuckDuckGoBackend::extract_url("https://example.com/direct"),
            Some("https://example.com/direct".to_string())
        );
    }

    #[test]
    fn extract_url_rejects_garbage() {
        assert!(DuckDuckGoBackend::extract_url("not-a-url").is_none());
    }

    #[test]
    fn parse_mock_html_coerces_items() {
        let items = parse_result_page(MOCK_DDG_HTML).expect("should parse");
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].title.as_deref(), Some("Rust Programming Language"));
        assert_eq!(items[0].url.as_deref(), Some("https://www.rust-lang.org/"));
        assert!(items[0]
            .description
            .as_deref()
            .is_some_and(|d| d.contains("reliable and efficient")));

        // Third result has no snippet; description stays unset and the
        // renderer falls back gracefully.
        assert!(items[2].description.is_none());
    }

    #[test]
    fn parse_empty_page_returns_no_items() {
        let items = parse_result_page("<html><body></body></html>").expect("should parse");
        assert!(items.is_empty());
    }

    #[test]
    fn rendered_block_carries_url_markers() {
        let items = parse_result_page(MOCK_DDG_HTML).expect("should parse");
        let block = render_items(&items, 5);
        assert!(block.contains("URL: https://www.rust-lang.org/"));
        assert!(block.contains("URL: https://doc.rust-lang.org/book/"));
        assert!(block.starts_with("• Rust Programming Language"));
    }

    #[test]
    fn backend_type_is_duckduckgo() {
        assert_eq!(DuckDuckGoBackend.backend_type(), Backend::DuckDuckGo);
    }

    #[test]
    fn is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DuckDuckGoBackend>();
    }
}
