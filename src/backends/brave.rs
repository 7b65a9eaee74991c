//! Brave Search backend — independent index behind a keyed REST API.
//!
//! Requires a subscription token (`X-Subscription-Token` header). The
//! backend stays an unconfigured status slot until a key is supplied.

use crate::backend::SearchBackend;
use crate::config::AggregatorConfig;
use crate::error::AggregatorError;
use crate::http;
use crate::types::{render_items, Backend, RawItem};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<WebResults>,
}

#[derive(Debug, Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<WebResult>,
}

#[derive(Debug, Deserialize)]
struct WebResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    age: Option<String>,
}

/// Brave Search API backend.
pub struct BraveBackend;

impl SearchBackend for BraveBackend {
    async fn search(
        &self,
        query: &str,
        config: &AggregatorConfig,
    ) -> Result<String, AggregatorError> {
        tracing::trace!(query, "Brave search");

        let api_key = config.brave_api_key.as_deref().ok_or_else(|| {
            AggregatorError::Config("Brave backend requires brave_api_key".into())
        })?;

        let client = http::build_client(config)?;
        let mut params = vec![("q", query.to_string()), ("freshness", "pw".to_string())];
        if config.safe_search {
            params.push(("safesearch", "moderate".to_string()));
        }

        let response = client
            .get(format!("{}/search", config.brave_url))
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json")
            .query(&params)
            .send()
            .await
            .map_err(|e| http::request_error(Backend::Brave, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(http::status_error(Backend::Brave, status));
        }

        let body: BraveResponse = response
            .json()
            .await
            .map_err(|e| AggregatorError::Parse(format!("Brave response: {e}")))?;

        let items = coerce_items(body);
        if items.is_empty() {
            return Err(AggregatorError::Parse("Brave returned no results".into()));
        }
        Ok(render_items(&items, config.max_items_per_backend))
    }

    fn backend_type(&self) -> Backend {
        Backend::Brave
    }
}

/// Coerce Brave's web results into the common item shape, folding the
/// result age into the description when present.
fn coerce_items(body: BraveResponse) -> Vec<RawItem> {
    let results = body.web.map(|w| w.results).unwrap_or_default();
    results
        .into_iter()
        .map(|r| {
            let description = match (r.description, r.age) {
                (Some(desc), Some(age)) if !desc.is_empty() => {
                    Some(format!("{desc} (published {age})"))
                }
                (Some(desc), _) if !desc.is_empty() => Some(desc),
                (_, Some(age)) => Some(format!("Published {age}")),
                _ => None,
            };
            RawItem {
                title: r.title,
                description,
                url: r.url,
            }
        })
        .collect()
}
