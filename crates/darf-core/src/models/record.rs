//! Per-page extraction record for DARF payment slips.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of extracting a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// Value located and validated.
    Found,
    /// No candidate matched anywhere on the page.
    NotFound,
    /// A candidate matched but failed format or checksum validation.
    Malformed,
    /// The page or document could not be processed at all.
    Failed,
}

/// A field value paired with a user-facing error message.
///
/// `value` and `error` are mutually exclusive except for
/// [`FieldStatus::Malformed`], where the raw value is kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: Option<String>,
    pub error: Option<String>,
    pub status: FieldStatus,
}

impl FieldValue {
    pub fn found(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            error: None,
            status: FieldStatus::Found,
        }
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self {
            value: None,
            error: Some(error.into()),
            status: FieldStatus::NotFound,
        }
    }

    pub fn malformed(value: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            error: Some(error.into()),
            status: FieldStatus::Malformed,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            value: None,
            error: Some(error.into()),
            status: FieldStatus::Failed,
        }
    }

    /// Value as a string slice, if present.
    pub fn as_deref(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_found(&self) -> bool {
        self.status == FieldStatus::Found
    }
}

/// Logical fields extracted from a DARF page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TaxId,
    LegalName,
    AssessmentPeriod,
    DueDate,
    DocumentNumber,
    TotalAmount,
    CategoryCode,
    CategoryDescription,
    PaymentBarcodeLine,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::TaxId,
        Field::LegalName,
        Field::AssessmentPeriod,
        Field::DueDate,
        Field::DocumentNumber,
        Field::TotalAmount,
        Field::CategoryCode,
        Field::CategoryDescription,
        Field::PaymentBarcodeLine,
    ];

    /// Column header used in reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Field::TaxId => "CNPJ",
            Field::LegalName => "Razão Social",
            Field::AssessmentPeriod => "Período de Apuração",
            Field::DueDate => "Data de Vencimento",
            Field::DocumentNumber => "Número do Documento",
            Field::TotalAmount => "Valor Total do Documento",
            Field::CategoryCode => "Código",
            Field::CategoryDescription => "Denominação",
            Field::PaymentBarcodeLine => "Linha Digitável",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Everything extracted from one page of a DARF document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// `"<filename> - Page <n>"`.
    pub source_label: String,
    pub tax_id: FieldValue,
    pub legal_name: FieldValue,
    pub assessment_period: FieldValue,
    pub due_date: FieldValue,
    pub document_number: FieldValue,
    pub total_amount: FieldValue,
    pub category_code: FieldValue,
    pub category_description: FieldValue,
    pub payment_barcode_line: FieldValue,
}

impl ExtractionRecord {
    /// Build the label for a page of a document.
    pub fn page_label(filename: &str, page: u32) -> String {
        format!("{} - Page {}", filename, page)
    }

    /// A record where every field failed with the same message.
    pub fn failed(source_label: impl Into<String>, message: &str) -> Self {
        let field = || FieldValue::failed(message);
        Self {
            source_label: source_label.into(),
            tax_id: field(),
            legal_name: field(),
            assessment_period: field(),
            due_date: field(),
            document_number: field(),
            total_amount: field(),
            category_code: field(),
            category_description: field(),
            payment_barcode_line: field(),
        }
    }

    pub fn field(&self, field: Field) -> &FieldValue {
        match field {
            Field::TaxId => &self.tax_id,
            Field::LegalName => &self.legal_name,
            Field::AssessmentPeriod => &self.assessment_period,
            Field::DueDate => &self.due_date,
            Field::DocumentNumber => &self.document_number,
            Field::TotalAmount => &self.total_amount,
            Field::CategoryCode => &self.category_code,
            Field::CategoryDescription => &self.category_description,
            Field::PaymentBarcodeLine => &self.payment_barcode_line,
        }
    }

    /// All fields in report order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        Field::ALL.into_iter().map(move |f| (f, self.field(f)))
    }

    /// Whether any field carries an error.
    pub fn has_errors(&self) -> bool {
        self.fields().any(|(_, v)| v.error.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_record_sets_every_field() {
        let record = ExtractionRecord::failed("a.pdf - Page 1", "PDF vazio ou inválido.");
        assert_eq!(record.fields().count(), 9);
        for (_, value) in record.fields() {
            assert_eq!(value.value, None);
            assert_eq!(value.error.as_deref(), Some("PDF vazio ou inválido."));
            assert_eq!(value.status, FieldStatus::Failed);
        }
        assert!(record.has_errors());
    }

    #[test]
    fn test_malformed_keeps_value() {
        let v = FieldValue::malformed("11.111.111/1111-11", "inválido");
        assert_eq!(v.as_deref(), Some("11.111.111/1111-11"));
        assert!(v.error.is_some());
        assert!(!v.is_found());
    }

    #[test]
    fn test_page_label() {
        assert_eq!(ExtractionRecord::page_label("guia.pdf", 3), "guia.pdf - Page 3");
    }
}
