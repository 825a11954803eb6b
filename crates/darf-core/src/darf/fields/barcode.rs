//! Payment line (linha digitável).
//!
//! Unlike the other fields every strategy runs: candidates are pooled and
//! ranked by [`ScoringDisambiguator`].

use super::FieldExtractor;
use crate::darf::rules::patterns::{BARCODE_COMPACT, BARCODE_LINE, BARCODE_LINE_START, DIGIT_RUN};
use crate::darf::rules::{PageInput, ScoringDisambiguator};
use crate::formatters::digits_only;
use crate::models::record::FieldValue;
use tracing::debug;

/// Minimum digits on a line that starts like a payment line.
const MIN_LINE_DIGITS: usize = 40;
/// Shortest digit run kept when stitching runs together.
const MIN_RUN: usize = 10;

#[derive(Debug, Default)]
pub struct BarcodeExtractor;

impl BarcodeExtractor {
    pub fn new() -> Self {
        Self
    }

    fn collect(&self, page: &PageInput<'_>) -> ScoringDisambiguator {
        let mut pool = ScoringDisambiguator::new();

        for line in page.lines {
            for caps in BARCODE_LINE.captures_iter(line) {
                pool.offer(&caps[1], "formatted line");
            }
            if BARCODE_LINE_START.is_match(line) && digits_only(line).len() >= MIN_LINE_DIGITS {
                pool.offer(line, "digit line");
            }
        }

        let compact: String = page.text.chars().filter(|c| *c != ' ' && *c != '\n').collect();
        for m in BARCODE_COMPACT.find_iter(&compact) {
            pool.offer(m.as_str(), "compact text");
        }

        for caps in BARCODE_LINE.captures_iter(page.text) {
            pool.offer(&caps[1], "formatted text");
        }

        let stitched: String = DIGIT_RUN
            .find_iter(page.text)
            .map(|m| m.as_str())
            .filter(|run| run.len() >= MIN_RUN)
            .collect();
        pool.offer(&stitched, "stitched runs");

        pool
    }
}

impl FieldExtractor for BarcodeExtractor {
    type Output = FieldValue;

    fn extract(&self, page: &PageInput<'_>) -> FieldValue {
        let pool = self.collect(page);
        debug!("payment line: {} candidates", pool.len());

        match pool.best(&digits_only(page.text)) {
            Some(best) => {
                debug!("payment line: picked {} (score {})", best.source, best.score);
                FieldValue::found(best.value)
            }
            None => FieldValue::not_found("Linha digitável não encontrada."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FieldStatus;
    use pretty_assertions::assert_eq;

    const FORMATTED: &str = "85810000013-8 86000328050-5 07012527507-1 46065905017-6";
    const DIGITS: &str = "858100000138860003280505070125275071460659050176";

    fn extract(lines: &[&str]) -> FieldValue {
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        let text = lines.join("\n");
        BarcodeExtractor::new().extract(&PageInput::new(&lines, &text))
    }

    #[test]
    fn test_formatted_line() {
        let v = extract(&["Linha digitável", FORMATTED, "Autenticação"]);
        assert_eq!(v, FieldValue::found(DIGITS));
    }

    #[test]
    fn test_split_blocks_are_stitched() {
        let v = extract(&[
            "858100000138 860003280505",
            "Pague até 20/10/2025",
            "070125275071 460659050176",
        ]);
        assert_eq!(v.as_deref(), Some(DIGITS));
    }

    #[test]
    fn test_85_beats_89() {
        let other = format!("89{}", &DIGITS[2..]);
        let v = extract(&[other.as_str(), "Valor 10,00", DIGITS]);
        assert_eq!(v.as_deref(), Some(DIGITS));
    }

    #[test]
    fn test_not_found() {
        let v = extract(&["12345 67890", "sem linha"]);
        assert_eq!(v.status, FieldStatus::NotFound);
        assert_eq!(v.error.as_deref(), Some("Linha digitável não encontrada."));
    }
}
