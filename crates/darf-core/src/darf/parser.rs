//! Page parser running every field extractor over one page.

use std::time::Instant;

use tracing::debug;

use super::fields::{
    BarcodeExtractor, CategoryExtractor, FieldExtractor, IdentityExtractor, ScheduleExtractor,
    TotalAmountExtractor,
};
use super::rules::PageInput;
use crate::models::config::ExtractionConfig;
use crate::models::record::ExtractionRecord;
use crate::text::PageText;

/// Trait for page parsing.
pub trait RecordParser {
    /// Extract every field of one page into a record labeled `label`.
    fn parse(&self, label: &str, page: &PageText) -> ExtractionRecord;
}

/// Rule-based DARF parser.
#[derive(Debug, Default)]
pub struct DarfParser {
    identity: IdentityExtractor,
    schedule: ScheduleExtractor,
    total: TotalAmountExtractor,
    category: CategoryExtractor,
    barcode: BarcodeExtractor,
}

impl DarfParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new().with_cnpj_validation(config.validate_cnpj)
    }

    /// Set CNPJ check digit validation.
    pub fn with_cnpj_validation(mut self, validate: bool) -> Self {
        self.identity = IdentityExtractor::new().with_validation(validate);
        self
    }

    /// Parse raw page text, normalizing it first.
    pub fn parse_text(&self, label: &str, raw: &str) -> ExtractionRecord {
        self.parse(label, &PageText::native(raw))
    }
}

impl RecordParser for DarfParser {
    fn parse(&self, label: &str, page: &PageText) -> ExtractionRecord {
        let start = Instant::now();
        let input = PageInput::new(&page.lines, &page.text);

        let identity = self.identity.extract(&input);
        let schedule = self.schedule.extract(&input);
        let category = self.category.extract(&input);

        let record = ExtractionRecord {
            source_label: label.to_string(),
            tax_id: identity.tax_id,
            legal_name: identity.legal_name,
            assessment_period: schedule.assessment_period,
            due_date: schedule.due_date,
            document_number: schedule.document_number,
            total_amount: self.total.extract(&input),
            category_code: category.code,
            category_description: category.description,
            payment_barcode_line: self.barcode.extract(&input),
        };

        debug!(
            "{}: {} lines parsed in {}µs, {} fields with errors",
            label,
            page.lines.len(),
            start.elapsed().as_micros(),
            record.fields().filter(|(_, v)| v.error.is_some()).count()
        );

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{FieldStatus, FieldValue};
    use pretty_assertions::assert_eq;

    const SLIP: &str = "\
Documento de Arrecadação de Receitas Federais
CNPJ Razão Social
18.715.565/0001-10   MUNICIPIO DE EXEMPLO
Período de Apuração   Data de Vencimento   Número do Documento
30/09/2025 | 20/10/2025 | 07.01.25275.0746065-9
Valor Total do Documento
1.386,00
Composição do Documento de Arrecadação
Código Denominação Principal Multa Juros Total
1082 | CP DESCONTADA SEGURADO | 1.386,00 | 1.386,00
Totais 1.386,00
85810000013-8 86000328050-5 07012527507-1 46065905017-6
";

    #[test]
    fn test_parse_full_slip() {
        let record = DarfParser::new().parse_text("darf.pdf - Page 1", SLIP);

        assert_eq!(record.source_label, "darf.pdf - Page 1");
        assert_eq!(record.tax_id, FieldValue::found("18.715.565/0001-10"));
        assert_eq!(record.legal_name, FieldValue::found("MUNICIPIO DE EXEMPLO"));
        assert_eq!(record.assessment_period, FieldValue::found("30/09/2025"));
        assert_eq!(record.due_date, FieldValue::found("20/10/2025"));
        assert_eq!(record.document_number, FieldValue::found("07.01.25275.0746065-9"));
        assert_eq!(record.total_amount, FieldValue::found("1.386,00"));
        assert_eq!(record.category_code, FieldValue::found("1082"));
        assert_eq!(record.category_description, FieldValue::found("CP DESCONTADA SEGURADO"));
        assert_eq!(
            record.payment_barcode_line,
            FieldValue::found("858100000138860003280505070125275071460659050176")
        );
        assert!(!record.has_errors());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = DarfParser::new();
        let first = parser.parse_text("a.pdf - Page 2", SLIP);
        let second = parser.parse_text("a.pdf - Page 2", SLIP);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cnpj_validation_toggle() {
        let text = SLIP.replace("18.715.565/0001-10", "18.715.565/0001-11");

        let strict = DarfParser::new().parse_text("x", &text);
        assert_eq!(strict.tax_id.status, FieldStatus::Malformed);
        assert_eq!(strict.tax_id.as_deref(), Some("18.715.565/0001-11"));

        let lenient = DarfParser::new().with_cnpj_validation(false).parse_text("x", &text);
        assert_eq!(lenient.tax_id.status, FieldStatus::Found);
    }

    #[test]
    fn test_empty_page_reports_every_field() {
        let record = DarfParser::new().parse_text("x", "");
        assert_eq!(record.fields().filter(|(_, v)| v.status == FieldStatus::NotFound).count(), 9);
    }
}
