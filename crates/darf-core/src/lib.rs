//! Core library for DARF payment slip processing.
//!
//! This crate provides:
//! - PDF processing (per-page text layer and page images)
//! - OCR fallback for scanned pages, built lazily once per run
//! - DARF field extraction (CNPJ, dates, document number, amounts, category, payment line)
//! - Lookup tables, error reports and payment rows built from extracted records

pub mod assembler;
pub mod darf;
pub mod error;
pub mod formatters;
pub mod lookup;
pub mod models;
pub mod ocr;
pub mod output;
pub mod pdf;
pub mod report;
pub mod text;

pub use assembler::DocumentAssembler;
pub use darf::{DarfParser, RecordParser};
pub use error::{DarfError, Result};
pub use lookup::{Category, CategoryLookup, LookupTables, OrgUnitLookup};
pub use models::config::DarfConfig;
pub use models::record::{ExtractionRecord, Field, FieldStatus, FieldValue};
pub use ocr::{create_recognizer, LazyRecognizer, TextRecognizer};
pub use output::{PaymentRow, RowBuilder};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use report::{collect_issues, FieldIssue};
pub use text::{PageText, TextAcquirer};
