//! Data models and configuration.

pub mod config;
pub mod record;

pub use config::{DarfConfig, ExtractionConfig, OcrConfig, OutputConfig, PdfConfig};
pub use record::{ExtractionRecord, Field, FieldStatus, FieldValue};
