//! Error report built from extraction records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lookup::{CategoryLookup, OrgUnitLookup};
use crate::models::record::{ExtractionRecord, Field, FieldStatus};

/// Kind of problem found on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    #[serde(rename = "Extração")]
    Extraction,
    #[serde(rename = "Validação")]
    Validation,
    #[serde(rename = "Processamento")]
    Processing,
    #[serde(rename = "Mapeamento")]
    Mapping,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssueKind::Extraction => "Extração",
            IssueKind::Validation => "Validação",
            IssueKind::Processing => "Processamento",
            IssueKind::Mapping => "Mapeamento",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "Crítico")]
    Critical,
    #[serde(rename = "Aviso")]
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Critical => "Crítico",
            Severity::Warning => "Aviso",
        })
    }
}

/// One row of the error report. Field order matches the report columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    #[serde(rename = "Arquivo")]
    pub source_label: String,
    #[serde(rename = "Campo")]
    pub field: String,
    #[serde(rename = "Tipo de Erro")]
    pub kind: IssueKind,
    #[serde(rename = "Mensagem")]
    pub message: String,
    #[serde(rename = "Valor Extraído")]
    pub extracted_value: String,
    #[serde(rename = "Severidade")]
    pub severity: Severity,
}

impl FieldIssue {
    pub const COLUMNS: &'static [&'static str] = &[
        "Arquivo",
        "Campo",
        "Tipo de Erro",
        "Mensagem",
        "Valor Extraído",
        "Severidade",
    ];
}

/// Collect every field error of a record plus lookup mapping warnings.
pub fn collect_issues<L>(record: &ExtractionRecord, lookups: &L) -> Vec<FieldIssue>
where
    L: CategoryLookup + OrgUnitLookup,
{
    let mut issues = Vec::new();

    for (field, value) in record.fields() {
        let Some(message) = value.error.as_ref() else {
            continue;
        };
        let kind = match value.status {
            FieldStatus::Malformed => IssueKind::Validation,
            FieldStatus::Failed => IssueKind::Processing,
            FieldStatus::NotFound | FieldStatus::Found => IssueKind::Extraction,
        };
        issues.push(FieldIssue {
            source_label: record.source_label.clone(),
            field: field.display_name().to_string(),
            kind,
            message: message.clone(),
            extracted_value: value.value.clone().unwrap_or_default(),
            severity: Severity::Critical,
        });
    }

    if let (Some(code), None) = (&record.category_code.value, &record.category_code.error) {
        if lookups.get_category(code).is_none() {
            issues.push(FieldIssue {
                source_label: record.source_label.clone(),
                field: Field::CategoryCode.display_name().to_string(),
                kind: IssueKind::Mapping,
                message: format!(
                    "Código '{}' extraído mas não mapeado para nenhuma aba (servidor ou patronal-gilrat)",
                    code
                ),
                extracted_value: code.clone(),
                severity: Severity::Warning,
            });
        }
    }

    if let (Some(cnpj), None) = (&record.tax_id.value, &record.tax_id.error) {
        if lookups.get_org_unit(cnpj).is_none() {
            issues.push(FieldIssue {
                source_label: record.source_label.clone(),
                field: Field::TaxId.display_name().to_string(),
                kind: IssueKind::Mapping,
                message: format!("CNPJ '{}' extraído mas não possui UO Contribuinte mapeada", cnpj),
                extracted_value: cnpj.clone(),
                severity: Severity::Warning,
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupTables;
    use crate::models::record::FieldValue;
    use pretty_assertions::assert_eq;

    fn clean_record() -> ExtractionRecord {
        ExtractionRecord {
            source_label: "guia.pdf - Page 1".to_string(),
            tax_id: FieldValue::found("18.715.565/0001-10"),
            legal_name: FieldValue::found("SECRETARIA DE ESTADO"),
            assessment_period: FieldValue::found("30/09/2025"),
            due_date: FieldValue::found("20/10/2025"),
            document_number: FieldValue::found("07.18.25274.0123456-7"),
            total_amount: FieldValue::found("1.386,00"),
            category_code: FieldValue::found("1082"),
            category_description: FieldValue::found("CP DESCONTADA SEGURADO"),
            payment_barcode_line: FieldValue::found("8".repeat(48)),
        }
    }

    #[test]
    fn test_clean_record_has_no_issues() {
        let issues = collect_issues(&clean_record(), &LookupTables::default());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_field_errors_are_classified_by_status() {
        let mut record = clean_record();
        record.tax_id = FieldValue::malformed(
            "11.111.111/1111-11",
            "CNPJ encontrado, porém inválido pelos dígitos verificadores.",
        );
        record.total_amount = FieldValue::not_found("Valor total do documento não encontrado.");

        let issues = collect_issues(&record, &LookupTables::default());
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field, "CNPJ");
        assert_eq!(issues[0].kind, IssueKind::Validation);
        assert_eq!(issues[0].extracted_value, "11.111.111/1111-11");
        assert_eq!(issues[1].kind, IssueKind::Extraction);
        assert_eq!(issues[1].extracted_value, "");
    }

    #[test]
    fn test_failed_record_is_processing_issue() {
        let record = ExtractionRecord::failed("x.pdf - Page 1", "PDF vazio ou inválido.");
        let issues = collect_issues(&record, &LookupTables::default());
        assert_eq!(issues.len(), 9);
        assert!(issues.iter().all(|i| i.kind == IssueKind::Processing));
    }

    #[test]
    fn test_mapping_warnings() {
        let issues = collect_issues(&clean_record(), &LookupTables::empty());
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::Mapping));
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
        assert!(issues[0].message.contains("'1082'"));
        assert!(issues[1].message.contains("UO Contribuinte"));
    }
}
