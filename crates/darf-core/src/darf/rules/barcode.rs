//! DARF payment line (linha digitável) validation and candidate scoring.

use std::collections::HashMap;
use tracing::trace;

use super::Candidate;
use crate::formatters::digits_only;

/// Number of digits in a DARF payment line.
pub const BARCODE_DIGITS: usize = 48;

/// Normalize a candidate to its 48 payment-line digits.
///
/// Non-digits are stripped. Exactly 48 digits must start with 8 or 9; a
/// longer run yields its first 48-digit window starting with 8 or 9.
pub fn validate_barcode_line(candidate: &str) -> Option<String> {
    let digits = digits_only(candidate);

    if digits.len() < BARCODE_DIGITS {
        return None;
    }

    let starts_ok = |s: &str| matches!(s.as_bytes().first(), Some(b'8') | Some(b'9'));

    if digits.len() == BARCODE_DIGITS {
        return starts_ok(&digits).then_some(digits);
    }

    (0..=digits.len() - BARCODE_DIGITS)
        .map(|i| &digits[i..i + BARCODE_DIGITS])
        .find(|window| starts_ok(window))
        .map(str::to_string)
}

/// Confidence score of a 48-digit payment line.
///
/// "85" is the usual DARF prefix; "88" mostly shows up when OCR merges
/// neighbouring blocks.
pub fn score_barcode_line(digits: &str) -> u32 {
    if digits.len() != BARCODE_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }

    if digits.starts_with("85") {
        100
    } else if digits.starts_with("89") {
        90
    } else if digits.starts_with("88") {
        50
    } else if digits.starts_with('8') {
        70
    } else if digits.starts_with('9') {
        60
    } else {
        0
    }
}

/// Ranks payment line candidates collected by several strategies.
#[derive(Debug, Default)]
pub struct ScoringDisambiguator {
    candidates: Vec<Candidate<String>>,
}

impl ScoringDisambiguator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and score a raw candidate, keeping it if it scores above zero.
    pub fn offer(&mut self, raw: &str, source: &'static str) {
        let Some(digits) = validate_barcode_line(raw) else {
            return;
        };
        let score = score_barcode_line(&digits);
        if score == 0 {
            return;
        }
        trace!("Barcode candidate from {}: {} (score {})", source, digits, score);
        self.candidates.push(Candidate::new(digits, score, source));
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Pick the winner: highest score, ties broken by earliest position of the
    /// digits inside `digit_stream` (the page text reduced to digits).
    ///
    /// Candidates are deduplicated by digit string keeping the best score.
    pub fn best(self, digit_stream: &str) -> Option<Candidate<String>> {
        let mut unique: HashMap<String, Candidate<String>> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for candidate in self.candidates {
            match unique.get_mut(&candidate.value) {
                Some(existing) if existing.score >= candidate.score => {}
                Some(existing) => *existing = candidate,
                None => {
                    order.push(candidate.value.clone());
                    unique.insert(candidate.value.clone(), candidate);
                }
            }
        }

        order
            .into_iter()
            .enumerate()
            .filter_map(|(seen, value)| {
                let candidate = unique.remove(&value)?;
                let position = digit_stream.find(&candidate.value).unwrap_or(usize::MAX);
                Some((candidate, position, seen))
            })
            .min_by(|(a, a_pos, a_seen), (b, b_pos, b_seen)| {
                b.score
                    .cmp(&a.score)
                    .then(a_pos.cmp(b_pos))
                    .then(a_seen.cmp(b_seen))
            })
            .map(|(candidate, position, _)| {
                if position == usize::MAX {
                    candidate
                } else {
                    candidate.with_position(position, position + BARCODE_DIGITS)
                }
            })
    }
}
