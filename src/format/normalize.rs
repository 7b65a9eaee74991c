//! Idempotent whitespace normalisation for formatted documents.
//!
//! Every rule collapses rather than inserts, so applying the
//! normaliser twice always equals applying it once:
//!
//! - trailing whitespace stripped from every line
//! - empty bullets dropped, bullet markers respaced to `• item`
//! - runs of spaces after `:` and `.` collapsed to one space
//! - runs of 3+ newlines collapsed to exactly 2
//! - leading/trailing blank lines trimmed

use regex::Regex;
use std::sync::OnceLock;

static NEWLINE_RUNS: OnceLock<Regex> = OnceLock::new();
static COLON_SPACES: OnceLock<Regex> = OnceLock::new();
static DOT_SPACES: OnceLock<Regex> = OnceLock::new();

/// Normalise a document's whitespace. Idempotent:
/// `normalize(normalize(x)) == normalize(x)` for all inputs.
pub fn normalize(text: &str) -> String {
    let newline_runs = NEWLINE_RUNS
        .get_or_init(|| Regex::new(r"\n{3,}").expect("newline run pattern is valid"));

    let lines: Vec<String> = text.lines().filter_map(normalize_line).collect();
    let joined = lines.join("\n");
    let collapsed = newline_runs.replace_all(&joined, "\n\n");
    collapsed.trim_matches('\n').to_string()
}

/// Normalise one line; returns `None` for empty bullets, which are
/// dropped entirely.
fn normalize_line(line: &str) -> Option<String> {
    let line = line.trim_end();
    let stripped = line.trim_start();

    let line = if let Some(rest) = stripped.strip_prefix('•') {
        let item = rest.trim();
        if item.is_empty() {
            return None;
        }
        let indent = &line[..line.len() - stripped.len()];
        format!("{indent}• {item}")
    } else {
        line.to_string()
    };

    Some(collapse_inline_spacing(&line))
}

/// Collapse runs of spaces after `:` and `.` to a single space.
///
/// Only existing whitespace is collapsed, never inserted, so URL
/// schemes (`https://`) and decimal numbers are untouched.
fn collapse_inline_spacing(line: &str) -> String {
    let colon = COLON_SPACES
        .get_or_init(|| Regex::new(r":[ \t]{2,}").expect("colon spacing pattern is valid"));
    let dot = DOT_SPACES
        .get_or_init(|| Regex::new(r"\.[ \t]{2,}").expect("dot spacing pattern is valid"));

    let line = colon.replace_all(line, ": ");
    dot.replace_all(&line, ". ").into_owned()
}
