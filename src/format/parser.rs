//! Two-pass parser for generated answer text.
//!
//! Pass one tokenizes the immutable input into line tokens (header,
//! bullet, blank, text). Pass two builds an ordered section list:
//! header-led segments become titled sections, ungrouped bullet runs
//! merge into one synthetic `Key Points` section at the position of
//! their first occurrence, and ungrouped plain text is preserved as an
//! untitled preamble. The thinking segment, direct answer, and URLs are
//! split off before tokenization.

use regex::Regex;
use std::sync::OnceLock;

/// Literal delimiter closing a model's thinking segment.
pub const THINK_DELIMITER: &str = "</think>";

/// Literal marker introducing the direct answer.
pub const ANSWER_MARKER: &str = "**Answer:**";

/// Title of the synthetic section collecting ungrouped bullet runs.
pub const KEY_POINTS_TITLE: &str = "Key Points";

/// One extracted section. Ordering follows first appearance in the
/// source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Header title, or `None` for the untitled preamble.
    pub title: Option<String>,
    /// Section body with surrounding blank lines trimmed.
    pub content: String,
}

/// Structured view of one generated response. Derived and recomputed
/// per response, never persisted.
#[derive(Debug, Clone, Default)]
pub struct ParsedAnswer {
    /// Text before the thinking delimiter. Empty when absent.
    pub thinking: String,
    /// Body text before the answer marker.
    pub context: String,
    /// Text after the answer marker. Empty when absent.
    pub direct_answer: String,
    /// Deduplicated http(s) URLs from the context, first-occurrence order.
    pub urls: Vec<String>,
    /// Ordered sections extracted from the context.
    pub sections: Vec<Section>,
}

/// Parse raw generated text into its structured form. Total: every
/// input produces a `ParsedAnswer`, degenerate inputs simply leave
/// fields empty.
pub fn parse(raw: &str) -> ParsedAnswer {
    let (thinking, body) = split_thinking(raw);
    let (context, direct_answer) = split_direct_answer(body);
    let urls = extract_urls(context);
    let sections = build_sections(&tokenize(context));

    ParsedAnswer {
        thinking: thinking.to_string(),
        context: context.to_string(),
        direct_answer: direct_answer.to_string(),
        urls,
        sections,
    }
}

/// Split on the literal thinking delimiter. Absent delimiter means the
/// whole text is body and thinking is empty.
fn split_thinking(text: &str) -> (&str, &str) {
    match text.split_once(THINK_DELIMITER) {
        Some((thinking, body)) => (thinking.trim(), body.trim()),
        None => ("", text.trim()),
    }
}

/// Split on the literal answer marker. Absent marker means the whole
/// body is context and the direct answer is empty.
fn split_direct_answer(text: &str) -> (&str, &str) {
    match text.split_once(ANSWER_MARKER) {
        Some((context, answer)) => (context.trim(), answer.trim()),
        None => (text.trim(), ""),
    }
}

static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Extract http(s) URLs from text, deduplicated, preserving
/// first-occurrence order. Trailing sentence punctuation is stripped.
pub fn extract_urls(text: &str) -> Vec<String> {
    let re = URL_PATTERN
        .get_or_init(|| Regex::new(r#"https?://[^\s)\]>"']+"#).expect("URL pattern is valid"));

    let mut seen = Vec::new();
    for m in re.find_iter(text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';']).to_string();
        if !seen.contains(&url) {
            seen.push(url);
        }
    }
    seen
}

/// One tokenized input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineToken<'a> {
    /// Markdown header line; carries the title with `#` markers stripped.
    Header(&'a str),
    /// Bullet item; carries the text after the bullet marker.
    Bullet(&'a str),
    /// Empty or whitespace-only line.
    Blank,
    /// Any other line.
    Text(&'a str),
}

/// Pass one: classify each line of the context.
fn tokenize(text: &str) -> Vec<LineToken<'_>> {
    text.lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                LineToken::Blank
            } else if trimmed.starts_with('#') {
                LineToken::Header(trimmed.trim_start_matches('#').trim())
            } else if let Some(rest) = bullet_text(trimmed) {
                LineToken::Bullet(rest)
            } else {
                LineToken::Text(line)
            }
        })
        .collect()
}

/// Returns the item text when `line` is a bullet item.
fn bullet_text(line: &str) -> Option<&str> {
    for marker in ["•", "- ", "* "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    None
}

/// Pass two: fold tokens into an ordered section list.
fn build_sections(tokens: &[LineToken<'_>]) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    // Index of the section currently receiving lines, if any.
    let mut open: Option<usize> = None;
    // Index of the synthetic Key Points section once created.
    let mut key_points: Option<usize> = None;
    // Active ungrouped bullet run: continuation lines under a bullet
    // (indented `URL: …` lines and the like) stay with it.
    let mut bullet_run: Option<usize> = None;
    // Index of the untitled preamble once created.
    let mut preamble: Option<usize> = None;

    for token in tokens {
        match token {
            LineToken::Header(title) => {
                sections.push(Section {
                    title: Some((*title).to_string()),
                    content: String::new(),
                });
                open = Some(sections.len() - 1);
                bullet_run = None;
            }
            LineToken::Bullet(text) => {
                let index = match open {
                    Some(i) => i,
                    None => {
                        let i = *key_points.get_or_insert_with(|| {
                            sections.push(Section {
                                title: Some(KEY_POINTS_TITLE.to_string()),
                                content: String::new(),
                            });
                            sections.len() - 1
                        });
                        bullet_run = Some(i);
                        i
                    }
                };
                push_line(&mut sections[index], &format!("• {text}"));
            }
            LineToken::Text(line) => {
                let index = match (open, bullet_run) {
                    (Some(i), _) => i,
                    (None, Some(i)) => i,
                    (None, None) => *preamble.get_or_insert_with(|| {
                        sections.push(Section {
                            title: None,
                            content: String::new(),
                        });
                        sections.len() - 1
                    }),
                };
                push_line(&mut sections[index], line);
            }
            LineToken::Blank => {
                // A blank line closes an ungrouped bullet run, so a later
                // run still merges into the same Key Points section while
                // intervening text returns to the preamble.
                if let Some(i) = open {
                    push_line(&mut sections[i], "");
                } else if let Some(i) = bullet_run {
                    push_line(&mut sections[i], "");
                }
                bullet_run = None;
            }
        }
    }

    // Drop sections that ended up with no content (e.g. a trailing
    // header with nothing under it keeps its title but empty body is
    // still meaningful for ordering, so only fully empty untitled
    // sections are removed).
    sections.retain(|s| s.title.is_some() || !s.content.trim().is_empty());
    for section in &mut sections {
        section.content = section.content.trim_matches('\n').to_string();
    }
    sections
}

fn push_line(section: &mut Section, line: &str) {
    if !section.content.is_empty() || !line.is_empty() {
        section.content.push_str(line);
        section.content.push('\n');
    }
}
