//! Total document amount (Valor Total do Documento).

use rust_decimal::Decimal;

use super::{first_value, FieldExtractor};
use crate::darf::rules::patterns::{AMOUNT, EDGE_PIPES, TOTAL_TEXT};
use crate::darf::rules::{first_amount, parse_br_amount, validate_br_amount, PageInput, Strategy};
use crate::models::record::FieldValue;

const TOTAL_LABEL: &str = "Valor Total do Documento";

#[derive(Debug, Default)]
pub struct TotalAmountExtractor;

impl TotalAmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

const STRATEGIES: [(&str, Strategy<String>); 6] = [
    ("label line", label_line),
    ("below label", below_label),
    ("valor line", valor_line),
    ("first positive amount", first_positive),
    ("text total label", |p| text_amount(0, p)),
    ("text valor label", |p| text_amount(1, p)),
];

impl FieldExtractor for TotalAmountExtractor {
    type Output = FieldValue;

    fn extract(&self, page: &PageInput<'_>) -> FieldValue {
        match first_value("total amount", page, &STRATEGIES) {
            None => FieldValue::not_found("Valor total do documento não encontrado."),
            Some(v) if !validate_br_amount(&v) => {
                FieldValue::malformed(v, "Valor total do documento com formato inválido.")
            }
            Some(v) => FieldValue::found(v),
        }
    }
}

fn label_line(page: &PageInput<'_>) -> Option<String> {
    let (_, line) = page.find_line(TOTAL_LABEL)?;
    let m = AMOUNT.find(line)?;
    validate_br_amount(m.as_str()).then(|| m.as_str().to_string())
}

/// First valid amount within four lines below the label.
fn below_label(page: &PageInput<'_>) -> Option<String> {
    let (idx, _) = page.find_line(TOTAL_LABEL)?;
    page.window(idx + 1, idx + 5).iter().find_map(|line| {
        let cleaned = EDGE_PIPES.replace_all(line, "");
        let m = AMOUNT.find(cleaned.trim())?;
        validate_br_amount(m.as_str()).then(|| m.as_str().to_string())
    })
}

fn valor_line(page: &PageInput<'_>) -> Option<String> {
    page.lines
        .iter()
        .filter(|line| line.contains("Valor:") || line.contains("valor:"))
        .find_map(|line| {
            let m = AMOUNT.find(line)?;
            validate_br_amount(m.as_str()).then(|| m.as_str().to_string())
        })
}

/// First amount on any line that is greater than zero.
fn first_positive(page: &PageInput<'_>) -> Option<String> {
    page.lines.iter().find_map(|line| {
        let amount = first_amount(line)?;
        (parse_br_amount(amount)? > Decimal::ZERO).then(|| amount.to_string())
    })
}

fn text_amount(pattern: usize, page: &PageInput<'_>) -> Option<String> {
    let caps = TOTAL_TEXT[pattern].captures(page.text)?;
    let amount = caps[1].to_string();
    validate_br_amount(&amount).then_some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FieldStatus;
    use pretty_assertions::assert_eq;

    fn extract(lines: &[&str]) -> FieldValue {
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        let text = lines.join("\n");
        TotalAmountExtractor::new().extract(&PageInput::new(&lines, &text))
    }

    #[test]
    fn test_amount_on_label_line() {
        let v = extract(&["Valor Total do Documento | 1.386,00 |"]);
        assert_eq!(v, FieldValue::found("1.386,00"));
    }

    #[test]
    fn test_amount_below_label() {
        let v = extract(&["Valor Total do Documento", "Multa", "| 12.345,67 |"]);
        assert_eq!(v.as_deref(), Some("12.345,67"));
    }

    #[test]
    fn test_valor_label() {
        let v = extract(&["Sem total", "Pagar valor: 99,90"]);
        assert_eq!(v.as_deref(), Some("99,90"));
    }

    #[test]
    fn test_first_positive_amount_skips_zero() {
        let v = extract(&["Juros 0,00", "Principal 250,00"]);
        assert_eq!(v.as_deref(), Some("250,00"));
    }

    #[test]
    fn test_not_found() {
        let v = extract(&["Juros 0,00", "sem valores"]);
        assert_eq!(v.status, FieldStatus::NotFound);
        assert_eq!(v.error.as_deref(), Some("Valor total do documento não encontrado."));
    }
}
