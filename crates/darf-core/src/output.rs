//! Payment rows for the servidor and patronal-gilrat sheets.

use chrono::NaiveDate;
use serde::Serialize;

use crate::formatters::{
    clean_amount, clean_cnpj, clean_date, clean_month_year, digits_only, previous_day,
    previous_month,
};
use crate::lookup::{Category, CategoryLookup, OrgUnitLookup};
use crate::models::config::OutputConfig;
use crate::models::record::ExtractionRecord;

/// Row of the "servidor" sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServidorRow {
    #[serde(rename = "Arquivo")]
    pub file: String,
    #[serde(rename = "Informe o Credor")]
    pub creditor: String,
    #[serde(rename = "Leitora Otica")]
    pub optical_reader: String,
    #[serde(rename = "Selecione com 'X'")]
    pub payment_kind: String,
    #[serde(rename = "Selecione a GUIA para Pagamento")]
    pub slip_type: String,
    #[serde(rename = "Mes/Ano de Competencia:")]
    pub competence: String,
    #[serde(rename = "UO Contribuinte")]
    pub org_unit: String,
    #[serde(rename = "GMI FP")]
    pub gmi_fp: String,
    #[serde(rename = "Ordenador Despesa")]
    pub expense_authorizer: String,
    #[serde(rename = "Nr Docto DARF")]
    pub document_number: String,
    #[serde(rename = "Codigo de Barra")]
    pub barcode: String,
    #[serde(rename = "Valor Total do Documento")]
    pub total_amount: String,
    #[serde(rename = "Data Pagamento Prevista")]
    pub payment_date: String,
    #[serde(rename = "Historico de Referencia")]
    pub history: String,
}

impl ServidorRow {
    /// Column names, in serialization order.
    pub const COLUMNS: &'static [&'static str] = &[
        "Arquivo",
        "Informe o Credor",
        "Leitora Otica",
        "Selecione com 'X'",
        "Selecione a GUIA para Pagamento",
        "Mes/Ano de Competencia:",
        "UO Contribuinte",
        "GMI FP",
        "Ordenador Despesa",
        "Nr Docto DARF",
        "Codigo de Barra",
        "Valor Total do Documento",
        "Data Pagamento Prevista",
        "Historico de Referencia",
    ];
}

/// Row of the "patronal-gilrat" sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatronalRow {
    #[serde(rename = "Arquivo")]
    pub file: String,
    #[serde(rename = "Informe o Credor")]
    pub creditor: String,
    #[serde(rename = "Leitora Otica")]
    pub optical_reader: String,
    #[serde(rename = "Selecione com 'X'")]
    pub payment_kind: String,
    #[serde(rename = "Selecione a GUIA para Pagamento")]
    pub slip_type: String,
    #[serde(rename = "Ano/Nr. Folha")]
    pub payroll: String,
    #[serde(rename = "UO Contribuinte")]
    pub org_unit: String,
    #[serde(rename = "Ordenador Despesa")]
    pub expense_authorizer: String,
    #[serde(rename = "Nr Docto DARF")]
    pub document_number: String,
    #[serde(rename = "Codigo de Barra")]
    pub barcode: String,
    #[serde(rename = "Valor Total do Documento")]
    pub total_amount: String,
    #[serde(rename = "Data Pagamento Prevista")]
    pub payment_date: String,
    #[serde(rename = "Historico de Referencia")]
    pub history: String,
}

impl PatronalRow {
    /// Column names, in serialization order.
    pub const COLUMNS: &'static [&'static str] = &[
        "Arquivo",
        "Informe o Credor",
        "Leitora Otica",
        "Selecione com 'X'",
        "Selecione a GUIA para Pagamento",
        "Ano/Nr. Folha",
        "UO Contribuinte",
        "Ordenador Despesa",
        "Nr Docto DARF",
        "Codigo de Barra",
        "Valor Total do Documento",
        "Data Pagamento Prevista",
        "Historico de Referencia",
    ];
}

/// A record formatted for the sheet of its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRow {
    Servidor(ServidorRow),
    Patronal(PatronalRow),
}

/// Values shared by both row layouts.
struct Common {
    file: String,
    creditor: String,
    org_unit: String,
    document_number: String,
    barcode: String,
    total_amount: String,
    payment_date: String,
    competence: String,
    history: String,
}

/// Builds payment rows from extraction records.
pub struct RowBuilder<'a, L> {
    lookups: &'a L,
    output: &'a OutputConfig,
    today: NaiveDate,
}

impl<'a, L> RowBuilder<'a, L>
where
    L: CategoryLookup + OrgUnitLookup,
{
    /// `today` determines the competence month (the month before it).
    pub fn new(lookups: &'a L, output: &'a OutputConfig, today: NaiveDate) -> Self {
        Self {
            lookups,
            output,
            today,
        }
    }

    /// Category of the record, if its code was extracted and mapped.
    pub fn category(&self, record: &ExtractionRecord) -> Option<Category> {
        let code = record.category_code.value.as_deref()?;
        if record.category_code.error.is_some() {
            return None;
        }
        self.lookups.get_category(code)
    }

    /// Format a record for its category sheet. `None` when the code is unmapped.
    pub fn build(&self, record: &ExtractionRecord) -> Option<PaymentRow> {
        Some(match self.category(record)? {
            Category::Servidor => PaymentRow::Servidor(self.servidor(record)),
            Category::PatronalGilrat => PaymentRow::Patronal(self.patronal(record)),
        })
    }

    pub fn servidor(&self, record: &ExtractionRecord) -> ServidorRow {
        let c = self.common(record);
        ServidorRow {
            file: c.file,
            creditor: c.creditor,
            optical_reader: "n".to_string(),
            payment_kind: "Consignacao (GPS/DARF)".to_string(),
            slip_type: "DARF".to_string(),
            competence: clean_month_year(&c.competence),
            org_unit: c.org_unit,
            gmi_fp: String::new(),
            expense_authorizer: self.output.expense_authorizer.clone(),
            document_number: c.document_number,
            barcode: c.barcode,
            total_amount: c.total_amount,
            payment_date: c.payment_date,
            history: c.history,
        }
    }

    pub fn patronal(&self, record: &ExtractionRecord) -> PatronalRow {
        let c = self.common(record);
        PatronalRow {
            file: c.file,
            creditor: c.creditor,
            optical_reader: "n".to_string(),
            payment_kind: "Patronal (GPS/DARF)".to_string(),
            slip_type: "DARF".to_string(),
            payroll: String::new(),
            org_unit: c.org_unit,
            expense_authorizer: self.output.expense_authorizer.clone(),
            document_number: c.document_number,
            barcode: c.barcode,
            total_amount: c.total_amount,
            payment_date: c.payment_date,
            history: c.history,
        }
    }

    fn common(&self, record: &ExtractionRecord) -> Common {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let cnpj = text(&record.tax_id.value);
        let competence = previous_month(self.today);

        Common {
            file: record.source_label.clone(),
            creditor: clean_cnpj(&self.output.creditor_cnpj),
            org_unit: self.lookups.get_org_unit(&cnpj).unwrap_or_default(),
            document_number: digits_only(&text(&record.document_number.value)),
            barcode: digits_only(&text(&record.payment_barcode_line.value)),
            total_amount: clean_amount(&text(&record.total_amount.value)),
            payment_date: clean_date(&previous_day(&text(&record.due_date.value))),
            history: format!("{} {}", self.output.history_prefix, competence),
            competence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupTables;
    use crate::models::record::FieldValue;
    use pretty_assertions::assert_eq;

    fn record(code: &str) -> ExtractionRecord {
        ExtractionRecord {
            source_label: "guia.pdf - Page 2".to_string(),
            tax_id: FieldValue::found("18.715.565/0001-10"),
            legal_name: FieldValue::found("SECRETARIA DE ESTADO"),
            assessment_period: FieldValue::found("30/09/2025"),
            due_date: FieldValue::found("01/11/2025"),
            document_number: FieldValue::found("07.18.25274.0123456-7"),
            total_amount: FieldValue::found("1.386,00"),
            category_code: FieldValue::found(code),
            category_description: FieldValue::found("CP DESCONTADA SEGURADO"),
            payment_barcode_line: FieldValue::found("85810000013 8 86000000000 1 00000000000 0 00000000000 0"),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
    }

    #[test]
    fn test_servidor_row() {
        let lookups = LookupTables::default();
        let output = OutputConfig::default();
        let builder = RowBuilder::new(&lookups, &output, today());

        let Some(PaymentRow::Servidor(row)) = builder.build(&record("1082")) else {
            panic!("expected servidor row");
        };
        assert_eq!(row.file, "guia.pdf - Page 2");
        assert_eq!(row.creditor, "29979036000140");
        assert_eq!(row.competence, "122025");
        assert_eq!(row.org_unit, "1071");
        assert_eq!(row.document_number, "07182527401234567");
        assert_eq!(row.barcode.len(), 48);
        assert_eq!(row.total_amount, "138600");
        assert_eq!(row.payment_date, "31102025");
        assert_eq!(row.history, "Folha INSS 12/2025");
    }

    #[test]
    fn test_patronal_row() {
        let lookups = LookupTables::default();
        let output = OutputConfig::default();
        let builder = RowBuilder::new(&lookups, &output, today());

        let Some(PaymentRow::Patronal(row)) = builder.build(&record("1138")) else {
            panic!("expected patronal row");
        };
        assert_eq!(row.payment_kind, "Patronal (GPS/DARF)");
        assert_eq!(row.payroll, "");
        assert_eq!(row.expense_authorizer, "m1127166");
    }

    #[test]
    fn test_unmapped_code_has_no_row() {
        let lookups = LookupTables::default();
        let output = OutputConfig::default();
        let builder = RowBuilder::new(&lookups, &output, today());

        assert_eq!(builder.build(&record("4321")), None);

        let mut rec = record("1082");
        rec.category_code = FieldValue::not_found("Código não encontrado na composição do documento.");
        assert_eq!(builder.build(&rec), None);
    }
}
