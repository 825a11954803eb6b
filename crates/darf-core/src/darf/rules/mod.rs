//! Validators, patterns and shared helpers for DARF field extraction.

pub mod amounts;
pub mod barcode;
pub mod cnpj;
pub mod dates;
pub mod patterns;

pub use amounts::{first_amount, format_br_amount, parse_br_amount, validate_br_amount};
pub use barcode::{score_barcode_line, validate_barcode_line, ScoringDisambiguator, BARCODE_DIGITS};
pub use cnpj::{format_cnpj, normalize_cnpj, validate_cnpj};
pub use dates::{find_dates, parse_br_date, validate_br_date};

use tracing::debug;

use patterns::{EDGE_ARTIFACTS, PIPES, WHITESPACE};

/// Page content handed to every field extractor.
#[derive(Debug, Clone, Copy)]
pub struct PageInput<'a> {
    /// Non-empty, whitespace-collapsed lines.
    pub lines: &'a [String],
    /// Full page text with line breaks preserved.
    pub text: &'a str,
}

impl<'a> PageInput<'a> {
    pub fn new(lines: &'a [String], text: &'a str) -> Self {
        Self { lines, text }
    }

    /// Index and content of the first line containing `needle` (case sensitive).
    pub fn find_line(&self, needle: &str) -> Option<(usize, &'a str)> {
        self.lines
            .iter()
            .enumerate()
            .find(|(_, line)| line.contains(needle))
            .map(|(idx, line)| (idx, line.as_str()))
    }

    /// Lines `start..end`, clamped to the page.
    pub fn window(&self, start: usize, end: usize) -> &'a [String] {
        let end = end.min(self.lines.len());
        let start = start.min(end);
        &self.lines[start..end]
    }

    /// Full text with every whitespace run collapsed to one space.
    pub fn flat_text(&self) -> String {
        collapse_whitespace(self.text)
    }
}

/// A candidate value found by one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    /// Extracted value.
    pub value: T,
    /// Ranking score (higher wins).
    pub score: u32,
    /// Byte range in the searched text, when known.
    pub position: Option<(usize, usize)>,
    /// Name of the strategy that produced it.
    pub source: &'static str,
}

impl<T> Candidate<T> {
    pub fn new(value: T, score: u32, source: &'static str) -> Self {
        Self {
            value,
            score,
            position: None,
            source,
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// One step of a fallback chain.
pub type Strategy<T> = fn(&PageInput<'_>) -> Option<T>;

/// Run strategies in order and return the first hit.
pub fn first_success<T>(
    field: &str,
    page: &PageInput<'_>,
    strategies: &[(&'static str, Strategy<T>)],
) -> Option<Candidate<T>> {
    for (name, strategy) in strategies {
        if let Some(value) = strategy(page) {
            debug!("{}: matched by {}", field, name);
            return Some(Candidate::new(value, 1, name));
        }
    }
    debug!("{}: no strategy matched", field);
    None
}

/// Strip a leading/trailing pipe and a leading dash run.
pub fn strip_edge_artifacts(text: &str) -> String {
    EDGE_ARTIFACTS.replace_all(text.trim(), "").trim().to_string()
}

/// Replace every pipe run with a space and trim.
pub fn strip_pipes(text: &str) -> String {
    PIPES.replace_all(text, " ").trim().to_string()
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

/// Up to `n` characters before byte offset `pos`.
pub fn chars_before(text: &str, pos: usize, n: usize) -> &str {
    let start = text[..pos]
        .char_indices()
        .rev()
        .nth(n.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    if n == 0 { &text[pos..pos] } else { &text[start..pos] }
}

/// Up to `n` characters from byte offset `pos`.
pub fn chars_after(text: &str, pos: usize, n: usize) -> &str {
    let rest = &text[pos..];
    let end = rest.char_indices().nth(n).map(|(i, _)| i).unwrap_or(rest.len());
    &rest[..end]
}

/// First `n` characters of a string.
pub fn truncate_chars(text: &str, n: usize) -> &str {
    chars_after(text, 0, n)
}

/// Whether a 4-digit token could be a calendar year.
pub fn looks_like_year(code: &str) -> bool {
    code.starts_with("19") || code.starts_with("20")
}
