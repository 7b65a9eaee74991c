//! Core types: backend identity, per-backend results, status slots,
//! and the provider-agnostic raw item shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Search backends the orchestrator knows how to query.
///
/// This is the fixed display superset: every variant gets a status slot
/// in formatted output even when it is not part of the configured
/// backend list for a given search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// DuckDuckGo — HTML-endpoint scrape, no key required.
    DuckDuckGo,
    /// Perplexica — self-hosted answer-engine JSON API.
    Perplexica,
    /// Brave Search — subscription-token REST API.
    Brave,
}

impl Backend {
    /// Returns the human-readable name of this backend.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "DuckDuckGo",
            Self::Perplexica => "Perplexica",
            Self::Brave => "Brave",
        }
    }

    /// Returns all known backends, in status-slot display order.
    pub fn all() -> &'static [Backend] {
        &[Self::DuckDuckGo, Self::Perplexica, Self::Brave]
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One backend's contribution to a search, success or failure.
///
/// Terminal invariant: either `error` is set and `content` is empty,
/// or `error` is unset and `content` is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The backend's formatted result text. Empty on failure.
    pub content: String,
    /// Name of the backend that produced this entry.
    pub source: String,
    /// One representative URL extracted from the content, if any.
    pub url: Option<String>,
    /// Failure message when the backend could not be queried.
    pub error: Option<String>,
}

impl SearchResult {
    /// Build a successful result for `backend`.
    pub fn ok(backend: Backend, content: String, url: Option<String>) -> Self {
        Self {
            content,
            source: backend.name().to_string(),
            url,
            error: None,
        }
    }

    /// Build a failed result for `backend`, carrying the error message.
    pub fn failed(backend: Backend, message: String) -> Self {
        Self {
            content: String::new(),
            source: backend.name().to_string(),
            url: None,
            error: Some(message),
        }
    }

    /// Whether this entry represents a successful backend query.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Display state of one backend's status slot.
///
/// Transitions once from [`SlotState::Pending`] to a terminal value and
/// never reverts. Backends outside the configured set stay
/// [`SlotState::NotConfigured`] — a deliberate placeholder slot, not an
/// omission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Backend exists but was not part of this search's configuration.
    NotConfigured,
    /// Query dispatched, no terminal outcome yet.
    Pending,
    /// Backend returned usable content.
    Succeeded,
    /// Backend failed after retries.
    Failed,
}

impl SlotState {
    /// The glyph rendered in the status header for this state.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::NotConfigured => "⚠️",
            Self::Pending => "⏳",
            Self::Succeeded => "✅",
            Self::Failed => "❌",
        }
    }
}

/// Fixed-slot status header state: one slot per known backend, in
/// [`Backend::all`] order, regardless of which backends were queried.
#[derive(Debug, Clone)]
pub struct SearchStatus {
    slots: Vec<(Backend, SlotState)>,
}

impl SearchStatus {
    /// All slots not-attempted — the state before any query runs.
    pub fn unattempted() -> Self {
        Self {
            slots: Backend::all()
                .iter()
                .map(|b| (*b, SlotState::NotConfigured))
                .collect(),
        }
    }

    /// Derive slot states from an ordered result list.
    ///
    /// Backends present in `results` become `Succeeded` or `Failed`;
    /// every other known backend keeps its `NotConfigured` placeholder.
    pub fn from_results(results: &[SearchResult]) -> Self {
        let mut status = Self::unattempted();
        for result in results {
            let state = if result.is_success() {
                SlotState::Succeeded
            } else {
                SlotState::Failed
            };
            status.set_by_name(&result.source, state);
        }
        status
    }

    /// Set the slot for the named backend, if it is a known backend.
    fn set_by_name(&mut self, name: &str, state: SlotState) {
        for (backend, slot) in &mut self.slots {
            if backend.name() == name {
                *slot = state;
            }
        }
    }

    /// Look up the slot state for a backend.
    pub fn slot(&self, backend: Backend) -> SlotState {
        self.slots
            .iter()
            .find(|(b, _)| *b == backend)
            .map_or(SlotState::NotConfigured, |(_, s)| *s)
    }

    /// Render the status header block shown at the top of every
    /// formatted response.
    pub fn header(&self) -> String {
        let mut out = String::from("Search Sources Used:");
        for (backend, slot) in &self.slots {
            out.push('\n');
            out.push_str(slot.glyph());
            out.push(' ');
            out.push_str(backend.name());
        }
        out
    }
}

/// Provider-agnostic shape every backend's native response coerces to.
///
/// Fields missing from a provider's payload render with literal
/// fallbacks so downstream formatting never deals with holes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawItem {
    /// Result title, if the provider supplied one.
    pub title: Option<String>,
    /// Snippet or description text.
    pub description: Option<String>,
    /// Result URL.
    pub url: Option<String>,
}

impl RawItem {
    /// Render this item as one bulleted block with a `URL: ` line.
    pub fn render(&self) -> String {
        let title = self.title.as_deref().filter(|t| !t.is_empty());
        let url = self.url.as_deref().filter(|u| !u.is_empty());
        let mut out = format!("• {}", title.unwrap_or("Untitled"));
        if let Some(desc) = self.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str("\n  ");
            out.push_str(desc);
        }
        out.push_str("\n  URL: ");
        out.push_str(url.unwrap_or("No URL"));
        out
    }
}

/// Render a list of raw items as a backend content block, capped at
/// `max_items` entries with blank lines between blocks.
pub fn render_items(items: &[RawItem], max_items: usize) -> String {
    items
        .iter()
        .take(max_items)
        .map(RawItem::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}
