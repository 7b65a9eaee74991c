//! Response formatting: parse, reassemble, normalise.
//!
//! Takes raw generated or merged text, splits out the thinking segment
//! and direct answer, extracts URLs and sections, and reassembles a
//! status-annotated document with a trailing numbered sources list.
//! The output is stable: formatting an already formatted document
//! yields the same sections and sources again.

pub mod normalize;
pub mod parser;

pub use normalize::normalize;
pub use parser::{ParsedAnswer, Section, ANSWER_MARKER, THINK_DELIMITER};

use crate::types::SearchStatus;

/// Title of the sources section emitted at the end of every document.
const SOURCES_TITLE: &str = "Sources";

/// Format a raw response into the final status-annotated document.
///
/// Pipeline: parse (thinking split, answer split, URL and section
/// extraction) → assemble (status header, direct answer, sections,
/// trailing sources) → normalise. Every stage is total; degenerate
/// input produces a document containing just the status header.
pub fn format_response(raw: &str, status: &SearchStatus, include_thinking: bool) -> String {
    let parsed = parser::parse(raw);

    let mut out = status.header();
    out.push_str("\n\n");

    if include_thinking && !parsed.thinking.is_empty() {
        out.push_str("Thinking Process:\n");
        out.push_str(&parsed.thinking);
        out.push_str("\n\n");
    }

    if !parsed.direct_answer.is_empty() {
        out.push_str(ANSWER_MARKER);
        out.push(' ');
        out.push_str(&parsed.direct_answer);
        out.push_str("\n\n");
    }

    for section in &parsed.sections {
        // The sources list is re-emitted from the extracted URLs below;
        // an embedded Sources section would duplicate it.
        if section.title.as_deref() == Some(SOURCES_TITLE) {
            continue;
        }
        match &section.title {
            Some(title) => {
                out.push_str(&format!("### {title}\n{}\n\n", section.content));
            }
            None => {
                out.push_str(&section.content);
                out.push_str("\n\n");
            }
        }
    }

    if !parsed.urls.is_empty() {
        out.push_str(&format!("### {SOURCES_TITLE}\n"));
        for (index, url) in parsed.urls.iter().enumerate() {
            out.push_str(&format!("[{}] {url}\n", index + 1));
        }
    }

    normalize(&out)
}
