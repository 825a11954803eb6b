//! Per-page text acquisition with OCR fallback for scanned pages.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{DarfError, Result};
use crate::models::config::PdfConfig;
use crate::ocr::LazyRecognizer;
use crate::pdf::PdfProcessor;

lazy_static! {
    static ref INLINE_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref ANY_SPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Where the text of a page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// The PDF text layer.
    Native,
    /// The recognizer, run on the rendered page.
    Ocr,
}

/// Normalized text of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Text with space/tab runs collapsed and line breaks preserved.
    pub text: String,
    /// Non-empty trimmed lines, whitespace collapsed.
    pub lines: Vec<String>,
    pub source: TextSource,
}

impl PageText {
    pub fn new(raw: &str, source: TextSource) -> Self {
        Self {
            text: normalize_text(raw),
            lines: split_lines(raw),
            source,
        }
    }

    /// Native text layer content.
    pub fn native(raw: &str) -> Self {
        Self::new(raw, TextSource::Native)
    }
}

/// Collapse runs of spaces and tabs, keeping line breaks.
pub fn normalize_text(raw: &str) -> String {
    INLINE_SPACE.replace_all(raw, " ").into_owned()
}

/// Non-empty lines, trimmed, with inner whitespace collapsed.
pub fn split_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| ANY_SPACE.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Number of non-whitespace characters.
pub fn visible_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Reads page text, switching to OCR when the text layer is too sparse.
pub struct TextAcquirer {
    recognizer: Option<Arc<LazyRecognizer>>,
    render_dpi: u32,
    min_text_chars: usize,
}

impl TextAcquirer {
    /// Native text only; OCR is never attempted.
    pub fn native_only(config: &PdfConfig) -> Self {
        Self {
            recognizer: None,
            render_dpi: config.render_dpi,
            min_text_chars: config.min_text_chars,
        }
    }

    pub fn with_recognizer(config: &PdfConfig, recognizer: Arc<LazyRecognizer>) -> Self {
        Self {
            recognizer: Some(recognizer),
            ..Self::native_only(config)
        }
    }

    /// Whether a page with this native text should go through OCR.
    pub fn needs_ocr(&self, native: &str) -> bool {
        visible_chars(native) < self.min_text_chars
    }

    /// Text of a 1-based page.
    pub fn acquire(&self, pdf: &dyn PdfProcessor, page: u32) -> Result<PageText> {
        let native = pdf.extract_page_text(page)?;
        let chars = visible_chars(&native);
        debug!("Page {}: {} characters in text layer", page, chars);

        if !self.needs_ocr(&native) {
            return Ok(PageText::native(&native));
        }

        let Some(recognizer) = &self.recognizer else {
            return Ok(PageText::native(&native));
        };

        debug!("Page {}: sparse text layer, running OCR at {} DPI", page, self.render_dpi);
        match self.recognize(pdf, page, recognizer) {
            Ok(lines) if lines.iter().any(|l| !l.trim().is_empty()) => {
                debug!("Page {}: OCR returned {} regions", page, lines.len());
                Ok(PageText::new(&lines.join("\n"), TextSource::Ocr))
            }
            Ok(_) => {
                debug!("Page {}: OCR returned no text, keeping text layer", page);
                Ok(PageText::native(&native))
            }
            Err(e) => {
                warn!("Page {}: OCR failed, keeping text layer: {}", page, e);
                Ok(PageText::native(&native))
            }
        }
    }

    fn recognize(
        &self,
        pdf: &dyn PdfProcessor,
        page: u32,
        recognizer: &LazyRecognizer,
    ) -> Result<Vec<String>> {
        let engine = recognizer.get()?;
        let image = pdf.render_page(page, self.render_dpi)?;
        engine.recognize(&image).map_err(DarfError::from)
    }
}
