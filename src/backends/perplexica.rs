//! Perplexica backend — self-hosted answer-engine JSON API.
//!
//! Sends the query with a recency window and optional conversation
//! history to `POST {base}/api/search`, and renders the returned
//! message plus its cited sources as one content block.

use crate::backend::SearchBackend;
use crate::config::AggregatorConfig;
use crate::error::AggregatorError;
use crate::http;
use crate::types::{render_items, Backend, RawItem};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Search focus modes supported by Perplexica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FocusMode {
    /// General web search (the aggregator default).
    WebSearch,
    /// Academic paper search.
    AcademicSearch,
    /// Writing assistance without web lookup.
    WritingAssistant,
}

/// One conversation turn forwarded to Perplexica, as a
/// `["human" | "assistant", text]` pair.
pub type HistoryPair = (String, String);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    search_date: String,
    recency_boost: bool,
    date_range: DateRange,
    focus_mode: FocusMode,
    optimization_mode: &'static str,
    history: &'a [HistoryPair],
}

#[derive(Debug, Serialize)]
struct DateRange {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    message: String,
    #[serde(default)]
    sources: Vec<Source>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Source {
    #[serde(default)]
    page_content: String,
    metadata: SourceMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_date: Option<String>,
}

/// Perplexica JSON API backend.
pub struct PerplexicaBackend {
    /// Conversation history pairs sent with every query.
    pub history: Vec<HistoryPair>,
    /// Focus mode for this backend instance.
    pub focus_mode: FocusMode,
}

impl Default for PerplexicaBackend {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            focus_mode: FocusMode::WebSearch,
        }
    }
}

impl PerplexicaBackend {
    /// Backend with history pairs forwarded for conversational context.
    pub fn with_history(history: Vec<HistoryPair>) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }

    fn date_range(now: DateTime<Utc>, recency_days: i64) -> DateRange {
        let start = now - Duration::days(recency_days.max(0));
        DateRange {
            start: start.format("%Y-%m-%d").to_string(),
            end: now.format("%Y-%m-%d").to_string(),
        }
    }
}

impl SearchBackend for PerplexicaBackend {
    async fn search(
        &self,
        query: &str,
        config: &AggregatorConfig,
    ) -> Result<String, AggregatorError> {
        tracing::trace!(query, "Perplexica search");

        let client = http::build_client(config)?;
        let now = Utc::now();
        let request = SearchRequest {
            query,
            search_date: now.format("%Y-%m-%d").to_string(),
            recency_boost: true,
            date_range: Self::date_range(now, config.recency_days),
            focus_mode: self.focus_mode,
            optimization_mode: "balanced",
            history: &self.history,
        };

        let response = client
            .post(format!("{}/api/search", config.perplexica_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| http::request_error(Backend::Perplexica, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(http::status_error(Backend::Perplexica, status));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AggregatorError::Parse(format!("Perplexica response: {e}")))?;

        if body.message.trim().is_empty() && body.sources.is_empty() {
            return Err(AggregatorError::Parse(
                "Perplexica returned an empty answer".into(),
            ));
        }

        Ok(render_answer(body, config.max_items_per_backend))
    }

    fn backend_type(&self) -> Backend {
        Backend::Perplexica
    }
}

/// Render the Perplexica answer message followed by its sources.
///
/// Sources are ordered newest first (undated sources last) and coerced
/// to the common item shape with snippet text from the page content.
fn render_answer(body: SearchResponse, max_items: usize) -> String {
    let mut sources = body.sources;
    sources.sort_by_key(|s| {
        std::cmp::Reverse(
            s.metadata
                .published_date
                .as_deref()
                .and_then(|d| d.parse::<DateTime<Utc>>().ok())
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        )
    });

    let items: Vec<RawItem> = sources
        .into_iter()
        .map(|s| RawItem {
            title: s.metadata.title,
            description: Some(truncate_snippet(&s.page_content)).filter(|d| !d.is_empty()),
            url: s.metadata.url,
        })
        .collect();

    let message = body.message.trim();
    if items.is_empty() {
        return message.to_string();
    }

    let rendered = render_items(&items, max_items);
    if message.is_empty() {
        rendered
    } else {
        format!("{message}\n\n{rendered}")
    }
}

/// Cap a source snippet at a single readable line.
fn truncate_snippet(text: &str) -> String {
    const MAX_SNIPPET_CHARS: usize = 200;
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= MAX_SNIPPET_CHARS {
        return line;
    }
    let truncated: String = line.chars().take(MAX_SNIPPET_CHARS).collect();
    format!("{truncated}…")
}
