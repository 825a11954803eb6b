//! Common regex patterns for DARF field extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Uppercase letters as printed on DARF slips, accented Portuguese included.
pub const UPPER: &str = "A-ZÁÀÂÃÉÈÊÍÌÎÓÒÔÕÚÙÛÇ";

lazy_static! {
    // CNPJ, always printed formatted on the slip
    pub static ref CNPJ: Regex = Regex::new(
        r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}"
    ).unwrap();

    pub static ref DATE: Regex = Regex::new(
        r"\d{2}/\d{2}/\d{4}"
    ).unwrap();

    // Brazilian currency: 1.386,00
    pub static ref AMOUNT: Regex = Regex::new(
        r"\d{1,3}(?:\.\d{3})*,\d{2}"
    ).unwrap();

    pub static ref AMOUNT_FULL: Regex = Regex::new(
        r"^\d{1,3}(?:\.\d{3})*,\d{2}$"
    ).unwrap();

    // Anchored at the start of a string, for lookahead emulation
    pub static ref AMOUNT_PREFIX: Regex = Regex::new(
        r"^\d{1,3}(?:\.\d{3})*,\d{2}"
    ).unwrap();

    // Document number: 07.01.25275.0746065-9
    pub static ref DOCUMENT_NUMBER: Regex = Regex::new(
        r"\d{2}\.\d{2}\.\d{5}\.\d{7}-\d"
    ).unwrap();

    pub static ref DOCUMENT_NUMBER_FULL: Regex = Regex::new(
        r"^\d{2}\.\d{2}\.\d{5}\.\d{7}-\d$"
    ).unwrap();

    // Payment line: four blocks of 11 digits, each followed by its check digit
    pub static ref BARCODE_LINE: Regex = Regex::new(
        r"\b([89]\d{10}[\s\-]?\d\s+\d{11}[\s\-]?\d\s+\d{11}[\s\-]?\d\s+\d{11}[\s\-]?\d)\b"
    ).unwrap();

    pub static ref BARCODE_COMPACT: Regex = Regex::new(
        r"[89]\d{47}"
    ).unwrap();

    pub static ref BARCODE_LINE_START: Regex = Regex::new(
        r"^[89]\d{4}"
    ).unwrap();

    // Table artifacts
    pub static ref EDGE_ARTIFACTS: Regex = Regex::new(
        r"^\||\|$|^---+"
    ).unwrap();

    pub static ref EDGE_PIPES: Regex = Regex::new(
        r"^\||\|$"
    ).unwrap();

    pub static ref PIPES: Regex = Regex::new(
        r"\|+"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(
        r"\s+"
    ).unwrap();

    pub static ref NUMERIC_PUNCT_LINE: Regex = Regex::new(
        r"^[\d\s\.\-/]+$"
    ).unwrap();

    pub static ref DIGIT_RUN: Regex = Regex::new(
        r"\d+"
    ).unwrap();

    pub static ref FOUR_DIGITS: Regex = Regex::new(
        r"\d{4}"
    ).unwrap();

    // Legal name
    pub static ref LEGAL_NAME_LABEL: Regex = Regex::new(
        r"(?i)Razão Social|Receita Social"
    ).unwrap();

    pub static ref UPPERCASE_RUN: Regex = Regex::new(
        &format!(r"[{u}][{u}\s]{{10,}}", u = UPPER)
    ).unwrap();

    // Period, due date, document number
    pub static ref SCHEDULE_ROW: Regex = Regex::new(
        r"(\d{2}/\d{2}/\d{4})\s*[|\s]+\s*(\d{2}/\d{2}/\d{4})\s*[|\s]+\s*([\d\.\-]+)"
    ).unwrap();

    pub static ref DOCUMENT_NUMBER_LABELED: Regex = Regex::new(
        r"Número[:\s]+(\d{2}\.\d{2}\.\d{5}\.\d{7}-\d)"
    ).unwrap();

    pub static ref PERIOD_TEXT: [Regex; 2] = [
        Regex::new(r"(?i)Período de Apuração[^:]*:?\s*(\d{2}/\d{2}/\d{4})").unwrap(),
        Regex::new(r"(?i)Período[^:]*:?\s*(\d{2}/\d{2}/\d{4})").unwrap(),
    ];

    pub static ref DUE_DATE_TEXT: [Regex; 2] = [
        Regex::new(r"(?i)Data de Vencimento[^:]*:?\s*(\d{2}/\d{2}/\d{4})").unwrap(),
        Regex::new(r"(?i)Vencimento[^:]*:?\s*(\d{2}/\d{2}/\d{4})").unwrap(),
    ];

    pub static ref DOCUMENT_NUMBER_TEXT: [Regex; 2] = [
        Regex::new(r"(?i)Número do Documento[^:]*:?\s*(\d{2}\.\d{2}\.\d{5}\.\d{7}-\d)").unwrap(),
        Regex::new(r"(?i)Número[^:]*:?\s*(\d{2}\.\d{2}\.\d{5}\.\d{7}-\d)").unwrap(),
    ];

    // Total amount
    pub static ref TOTAL_TEXT: [Regex; 2] = [
        Regex::new(r"(?i)Valor Total do Documento[^:]*:?\s*(\d{1,3}(?:\.\d{3})*,\d{2})").unwrap(),
        Regex::new(r"(?i)Valor[^:]*:?\s*(\d{1,3}(?:\.\d{3})*,\d{2})").unwrap(),
    ];

    // Category code and description
    pub static ref CODE_AT_START: Regex = Regex::new(
        r"^(\d{4})\s+(.+)"
    ).unwrap();

    pub static ref CODE_WITH_DESCRIPTION: Regex = Regex::new(
        &format!(r"(\d{{4}})\s+([{u}][{u}\s\-\d/]{{5,}})", u = UPPER)
    ).unwrap();

    pub static ref ISOLATED_CODE: Regex = Regex::new(
        r"^(\d{4})\s*$|^\s*(\d{4})\s+(.{0,20})$"
    ).unwrap();

    pub static ref STARTS_UPPER: Regex = Regex::new(
        &format!(r"^[{u}]", u = UPPER)
    ).unwrap();

    pub static ref SPACE_THEN_UPPER: Regex = Regex::new(
        &format!(r"^\s+[{u}]", u = UPPER)
    ).unwrap();

    pub static ref UPPER_3: Regex = Regex::new(
        &format!(r"[{u}]{{3,}}", u = UPPER)
    ).unwrap();

    pub static ref UPPER_5: Regex = Regex::new(
        &format!(r"[{u}]{{5,}}", u = UPPER)
    ).unwrap();

    pub static ref ANY_UPPER: Regex = Regex::new(
        &format!(r"[{u}]", u = UPPER)
    ).unwrap();

    pub static ref TOTAL_MARKER: Regex = Regex::new(
        r"(?i)^(Totais|Total)$"
    ).unwrap();

    pub static ref TOTAL_OR_NUMBER: Regex = Regex::new(
        r"(?i)^(Totais|Total|\d+)$"
    ).unwrap();

    pub static ref ONLY_DIGITS: Regex = Regex::new(
        r"^\d+$"
    ).unwrap();

    pub static ref PERIOD_REFERENCE: Regex = Regex::new(
        r"(?i)PA\s+\d{2}/\d{4}"
    ).unwrap();

    pub static ref PERIOD_DUE_SUFFIX: Regex = Regex::new(
        r"(?i)\s*PA\s+\d{2}/\d{4}\s+Vencimento\s+\d{2}/(?:\d{2}/)?\d{4}.*$"
    ).unwrap();

    pub static ref COMPOSITION_CODE: Regex = Regex::new(
        r"(?i)composição[^:]*?:?[^:]*?(\d{4})"
    ).unwrap();

    pub static ref COMPOSITION_WORD: Regex = Regex::new(
        r"(?i)composição"
    ).unwrap();

    pub static ref KEYWORD_CODE: Regex = Regex::new(
        r"(?i)(?:código|denominação)[^:]*?:?[^:]*?(\d{4})"
    ).unwrap();

    pub static ref CODE_DESCRIPTION_AMOUNT: Regex = Regex::new(
        &format!(
            r"(?i)(\d{{4}})\s+([{u}][{u}\s\-\d/]{{10,}}?)\s+(\d{{1,3}}(?:\.\d{{3}})*,\d{{2}})",
            u = UPPER
        )
    ).unwrap();

    pub static ref DATE_PREFIX_BEFORE: Regex = Regex::new(
        r"\d{2}/\d{2}/$"
    ).unwrap();
}
