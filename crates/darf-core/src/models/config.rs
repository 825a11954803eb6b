//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::lookup::LookupTables;

/// Main configuration for the darf pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DarfConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Payment row output configuration.
    pub output: OutputConfig,

    /// Code and CNPJ lookup tables.
    pub lookups: LookupTables,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Run the recognizer on pages with too little native text.
    pub enabled: bool,

    /// Directory containing `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
    pub model_dir: PathBuf,

    /// Keep `[UNK]` tokens in recognizer output instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_dir: PathBuf::from("models"),
            keep_unk: false,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images before OCR.
    pub render_dpi: u32,

    /// Pages with fewer non-whitespace characters than this are treated as scanned.
    pub min_text_chars: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 400,
            min_text_chars: 100,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Enable CNPJ check digit validation.
    pub validate_cnpj: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            validate_cnpj: true,
        }
    }
}

/// Fixed values written into payment rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Creditor CNPJ ("Informe o Credor").
    pub creditor_cnpj: String,

    /// Expense authorizer login ("Ordenador Despesa").
    pub expense_authorizer: String,

    /// Prefix of the reference history, followed by the competence month.
    pub history_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            creditor_cnpj: "29.979.036/0001-40".to_string(),
            expense_authorizer: "m1127166".to_string(),
            history_prefix: "Folha INSS".to_string(),
        }
    }
}

impl DarfConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
