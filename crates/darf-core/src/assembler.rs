//! Document-level extraction: one record per page, failures turned into records.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::darf::{DarfParser, RecordParser};
use crate::error::{DarfError, PdfError, Result};
use crate::models::config::DarfConfig;
use crate::models::record::ExtractionRecord;
use crate::ocr::LazyRecognizer;
use crate::pdf::{PdfExtractor, PdfProcessor};
use crate::text::TextAcquirer;

/// Message for documents without pages.
pub const EMPTY_DOCUMENT: &str = "PDF vazio ou inválido.";

/// Prefix for pages whose extraction panicked.
pub const PAGE_PANIC: &str = "Erro ao processar página";

/// Extracts DARF records from PDF documents.
pub struct DocumentAssembler {
    acquirer: TextAcquirer,
    parser: DarfParser,
}

impl DocumentAssembler {
    pub fn new(acquirer: TextAcquirer, parser: DarfParser) -> Self {
        Self { acquirer, parser }
    }

    /// Assembler sharing `recognizer` with other assemblers of the same run.
    pub fn from_config(config: &DarfConfig, recognizer: Arc<LazyRecognizer>) -> Self {
        Self::new(
            TextAcquirer::with_recognizer(&config.pdf, recognizer),
            DarfParser::from_config(&config.extraction),
        )
    }

    /// Assembler that never runs OCR.
    pub fn native_only(config: &DarfConfig) -> Self {
        Self::new(
            TextAcquirer::native_only(&config.pdf),
            DarfParser::from_config(&config.extraction),
        )
    }

    /// Every page of a document. Never fails: problems become failed records.
    pub fn extract_document(&self, path: &Path) -> Vec<ExtractionRecord> {
        let filename = file_name(path);
        let start = Instant::now();
        info!("Processing {}", path.display());

        let opened = panic::catch_unwind(AssertUnwindSafe(|| open(path)))
            .unwrap_or_else(|payload| Err(PdfError::Parse(panic_message(payload.as_ref())).into()));

        let records = match opened {
            Ok(pdf) => self.extract_loaded(&pdf, &filename),
            Err(DarfError::Pdf(PdfError::NoPages)) => {
                warn!("{}: no pages", filename);
                vec![ExtractionRecord::failed(ExtractionRecord::page_label(&filename, 1), EMPTY_DOCUMENT)]
            }
            Err(e) => {
                warn!("{}: {}", filename, e);
                let message = format!("Erro geral ao processar PDF: {}", e);
                vec![ExtractionRecord::failed(ExtractionRecord::page_label(&filename, 1), &message)]
            }
        };

        info!(
            "{}: {} records in {}ms",
            filename,
            records.len(),
            start.elapsed().as_millis()
        );
        records
    }

    /// A single 1-based page.
    pub fn extract_page(&self, path: &Path, page: u32) -> Result<ExtractionRecord> {
        let pdf = open(path)?;
        if page == 0 || page > pdf.page_count() {
            return Err(PdfError::InvalidPage(page).into());
        }
        self.extract_loaded_page(&pdf, &file_name(path), page)
    }

    /// Every page of an already loaded document.
    pub fn extract_loaded(&self, pdf: &dyn PdfProcessor, filename: &str) -> Vec<ExtractionRecord> {
        let pages = pdf.page_count();
        if pages == 0 {
            return vec![ExtractionRecord::failed(ExtractionRecord::page_label(filename, 1), EMPTY_DOCUMENT)];
        }

        (1..=pages)
            .map(|page| {
                let label = ExtractionRecord::page_label(filename, page);
                match panic::catch_unwind(AssertUnwindSafe(|| self.extract_loaded_page(pdf, filename, page))) {
                    Ok(Ok(record)) => record,
                    Ok(Err(e)) => {
                        warn!("{} page {}: {}", filename, page, e);
                        ExtractionRecord::failed(label, &e.to_string())
                    }
                    Err(payload) => {
                        let message = format!("{}: {}", PAGE_PANIC, panic_message(payload.as_ref()));
                        warn!("{} page {}: {}", filename, page, message);
                        ExtractionRecord::failed(label, &message)
                    }
                }
            })
            .collect()
    }

    fn extract_loaded_page(
        &self,
        pdf: &dyn PdfProcessor,
        filename: &str,
        page: u32,
    ) -> Result<ExtractionRecord> {
        let text = self.acquirer.acquire(pdf, page)?;
        debug!("{} page {}: text from {:?}", filename, page, text.source);
        Ok(self.parser.parse(&ExtractionRecord::page_label(filename, page), &text))
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open(path: &Path) -> Result<PdfExtractor> {
    let data = std::fs::read(path)?;
    let mut pdf = PdfExtractor::new();
    pdf.load(&data)?;
    Ok(pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FieldStatus;
    use image::DynamicImage;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    struct FakePdf {
        pages: Vec<Option<&'static str>>,
        panics_on: Option<u32>,
    }

    impl FakePdf {
        fn new(pages: Vec<Option<&'static str>>) -> Self {
            Self { pages, panics_on: None }
        }
    }

    impl PdfProcessor for FakePdf {
        fn load(&mut self, _data: &[u8]) -> crate::pdf::Result<()> {
            Ok(())
        }

        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn extract_page_text(&self, page: u32) -> crate::pdf::Result<String> {
            if self.panics_on == Some(page) {
                panic!("unexpected end of content stream");
            }
            match self.pages.get(page as usize - 1) {
                Some(Some(text)) => Ok(text.to_string()),
                Some(None) => Err(PdfError::TextExtraction("broken content stream".into())),
                None => Err(PdfError::InvalidPage(page)),
            }
        }

        fn render_page(&self, page: u32, _dpi: u32) -> crate::pdf::Result<DynamicImage> {
            Err(PdfError::ImageExtraction(format!("no image on page {}", page)))
        }
    }

    fn assembler() -> DocumentAssembler {
        DocumentAssembler::native_only(&DarfConfig::default())
    }

    #[test]
    fn test_one_record_per_page() {
        let pdf = FakePdf::new(vec![
            Some("18.715.565/0001-10 MUNICIPIO DE EXEMPLO"),
            None,
            Some("Valor Total do Documento 10,00"),
        ]);
        let records = assembler().extract_loaded(&pdf, "lote.pdf");

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].source_label, "lote.pdf - Page 1");
        assert_eq!(records[0].tax_id.as_deref(), Some("18.715.565/0001-10"));

        assert_eq!(records[1].source_label, "lote.pdf - Page 2");
        assert_eq!(records[1].total_amount.status, FieldStatus::Failed);
        assert_eq!(
            records[1].total_amount.error.as_deref(),
            Some("PDF error: failed to extract text: broken content stream")
        );

        assert_eq!(records[2].total_amount.as_deref(), Some("10,00"));
    }

    #[test]
    fn test_panicking_page_does_not_abort_document() {
        let pdf = FakePdf {
            pages: vec![Some("ignored"), Some("Valor Total do Documento 10,00")],
            panics_on: Some(1),
        };
        let records = assembler().extract_loaded(&pdf, "lote.pdf");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_label, "lote.pdf - Page 1");
        for (_, value) in records[0].fields() {
            assert_eq!(value.status, FieldStatus::Failed);
            assert_eq!(
                value.error.as_deref(),
                Some("Erro ao processar página: unexpected end of content stream")
            );
        }
        assert_eq!(records[1].source_label, "lote.pdf - Page 2");
        assert_eq!(records[1].total_amount.as_deref(), Some("10,00"));
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "panic");
    }

    #[test]
    fn test_empty_document() {
        let records = assembler().extract_loaded(&FakePdf::new(vec![]), "vazio.pdf");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_label, "vazio.pdf - Page 1");
        for (_, value) in records[0].fields() {
            assert_eq!(value.status, FieldStatus::Failed);
            assert_eq!(value.error.as_deref(), Some(EMPTY_DOCUMENT));
        }
    }

    #[test]
    fn test_unreadable_file() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"this is not a pdf").unwrap();

        let records = assembler().extract_document(file.path());
        assert_eq!(records.len(), 1);
        assert!(records[0].source_label.ends_with(".pdf - Page 1"));
        let error = records[0].category_code.error.as_deref().unwrap();
        assert!(error.starts_with("Erro geral ao processar PDF: "));
    }

    #[test]
    fn test_missing_file() {
        let records = assembler().extract_document(Path::new("/nonexistent/darf.pdf"));
        assert_eq!(records[0].source_label, "darf.pdf - Page 1");
        assert!(records[0].has_errors());
    }

    #[test]
    fn test_extract_page_propagates_errors() {
        assert!(assembler().extract_page(Path::new("/nonexistent/darf.pdf"), 1).is_err());
    }
}
