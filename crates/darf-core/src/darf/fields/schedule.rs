//! Assessment period, due date and document number.
//!
//! On the slip these three sit in one table row right below the
//! "Período de Apuração" header.

use super::{first_value, FieldExtractor};
use crate::darf::rules::patterns::{
    DATE, DOCUMENT_NUMBER, DOCUMENT_NUMBER_FULL, DOCUMENT_NUMBER_LABELED, DOCUMENT_NUMBER_TEXT,
    DUE_DATE_TEXT, PERIOD_TEXT, SCHEDULE_ROW,
};
use crate::darf::rules::{find_dates, validate_br_date, PageInput, Strategy};
use crate::models::record::FieldValue;

const PERIOD_LABEL: &str = "Período de Apuração";

/// Fields produced by [`ScheduleExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub assessment_period: FieldValue,
    pub due_date: FieldValue,
    pub document_number: FieldValue,
}

/// Values read together from the row under the period header.
struct Row {
    period: String,
    due: String,
    number: Option<String>,
}

#[derive(Debug, Default)]
pub struct ScheduleExtractor;

impl ScheduleExtractor {
    pub fn new() -> Self {
        Self
    }
}

const ROW: [(&str, Strategy<Row>); 3] = [
    ("row below label", row_below_label),
    ("row on label line", row_on_label_line),
    ("dates below label", dates_below_label),
];

const PERIOD_LINES: [(&str, Strategy<String>); 1] = [("label line dates", label_line_period)];

const PERIOD_FLAT: [(&str, Strategy<String>); 3] = [
    ("text period label", |p| capture(&PERIOD_TEXT[0], p.text)),
    ("text short label", |p| capture(&PERIOD_TEXT[1], p.text)),
    ("text first date", |p| DATE.find(p.text).map(|m| m.as_str().to_string())),
];

const DUE_LINES: [(&str, Strategy<String>); 2] = [
    ("label line dates", label_line_due),
    ("vencimento line", vencimento_line),
];

const DUE_FLAT: [(&str, Strategy<String>); 2] = [
    ("text due date label", |p| capture(&DUE_DATE_TEXT[0], p.text)),
    ("text short label", |p| capture(&DUE_DATE_TEXT[1], p.text)),
];

const NUMBER_LINES: [(&str, Strategy<String>); 1] = [("number line", number_line)];

const NUMBER_FLAT: [(&str, Strategy<String>); 3] = [
    ("text number label", |p| capture(&DOCUMENT_NUMBER_TEXT[0], p.text)),
    ("text short label", |p| capture(&DOCUMENT_NUMBER_TEXT[1], p.text)),
    ("text bare pattern", |p| DOCUMENT_NUMBER.find(p.text).map(|m| m.as_str().to_string())),
];

impl FieldExtractor for ScheduleExtractor {
    type Output = Schedule;

    fn extract(&self, page: &PageInput<'_>) -> Schedule {
        let row = first_value("schedule row", page, &ROW);

        let flat = page.flat_text();
        let flat_page = PageInput::new(page.lines, &flat);

        let (mut period, mut due, mut number) = match row {
            Some(r) => (Some(r.period), Some(r.due), r.number),
            None => (None, None, None),
        };

        if period.is_none() {
            period = first_value("assessment period", page, &PERIOD_LINES)
                .or_else(|| first_value("assessment period", &flat_page, &PERIOD_FLAT));
        }

        if due.is_none() {
            due = first_value("due date", page, &DUE_LINES)
                .or_else(|| first_value("due date", &flat_page, &DUE_FLAT))
                .or_else(|| due_from_remaining_dates(&flat, period.as_deref()));
        }

        if number.is_none() {
            number = first_value("document number", page, &NUMBER_LINES)
                .or_else(|| first_value("document number", &flat_page, &NUMBER_FLAT));
        }

        Schedule {
            assessment_period: date_field(
                period,
                "Período de apuração não encontrado.",
                "Período de apuração com formato inválido.",
            ),
            due_date: date_field(
                due,
                "Data de vencimento não encontrada.",
                "Data de vencimento com formato inválido.",
            ),
            document_number: match number {
                None => FieldValue::not_found("Número do documento não encontrado."),
                Some(n) if !DOCUMENT_NUMBER_FULL.is_match(&n) => {
                    FieldValue::malformed(n, "Número do documento com formato inválido.")
                }
                Some(n) => FieldValue::found(n),
            },
        }
    }
}

fn date_field(value: Option<String>, missing: &str, invalid: &str) -> FieldValue {
    match value {
        None => FieldValue::not_found(missing),
        Some(d) if !validate_br_date(&d) => FieldValue::malformed(d, invalid),
        Some(d) => FieldValue::found(d),
    }
}

fn capture(re: &regex::Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].to_string())
}

fn label_index(page: &PageInput<'_>) -> Option<usize> {
    page.find_line(PERIOD_LABEL).map(|(idx, _)| idx)
}

fn row_from(line: &str) -> Option<Row> {
    let caps = SCHEDULE_ROW.captures(line)?;
    Some(Row {
        period: caps[1].to_string(),
        due: caps[2].to_string(),
        number: Some(caps[3].to_string()),
    })
}

fn row_below_label(page: &PageInput<'_>) -> Option<Row> {
    let idx = label_index(page)?;
    row_from(page.lines.get(idx + 1)?)
}

fn row_on_label_line(page: &PageInput<'_>) -> Option<Row> {
    let idx = label_index(page)?;
    row_from(&page.lines[idx])
}

/// First of the three lines below the label holding at least two dates.
fn dates_below_label(page: &PageInput<'_>) -> Option<Row> {
    let idx = label_index(page)?;
    page.window(idx + 1, idx + 4).iter().find_map(|line| {
        let dates = find_dates(line);
        if dates.len() < 2 {
            return None;
        }
        Some(Row {
            period: dates[0].to_string(),
            due: dates[1].to_string(),
            number: DOCUMENT_NUMBER.find(line).map(|m| m.as_str().to_string()),
        })
    })
}

fn label_line_dates(page: &PageInput<'_>) -> Vec<String> {
    page.lines
        .iter()
        .filter(|line| line.contains(PERIOD_LABEL))
        .map(|line| find_dates(line))
        .find(|dates| !dates.is_empty())
        .map(|dates| dates.into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

fn label_line_period(page: &PageInput<'_>) -> Option<String> {
    label_line_dates(page).into_iter().next()
}

fn label_line_due(page: &PageInput<'_>) -> Option<String> {
    label_line_dates(page).into_iter().nth(1)
}

fn vencimento_line(page: &PageInput<'_>) -> Option<String> {
    page.lines
        .iter()
        .filter(|line| line.contains("Vencimento"))
        .find_map(|line| DATE.find(line).map(|m| m.as_str().to_string()))
}

fn number_line(page: &PageInput<'_>) -> Option<String> {
    page.lines.iter().find_map(|line| {
        DOCUMENT_NUMBER_LABELED
            .captures(line)
            .map(|c| c[1].to_string())
            .or_else(|| DOCUMENT_NUMBER.find(line).map(|m| m.as_str().to_string()))
    })
}

/// Last resort: the second date on the page, or the only date when it is not
/// the period itself.
fn due_from_remaining_dates(flat: &str, period: Option<&str>) -> Option<String> {
    let dates = find_dates(flat);
    match dates.as_slice() {
        [_, second, ..] => Some(second.to_string()),
        [only] if period.is_some_and(|p| p != *only) => Some(only.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FieldStatus;
    use pretty_assertions::assert_eq;

    fn extract(lines: &[&str]) -> Schedule {
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        let text = lines.join("\n");
        ScheduleExtractor::new().extract(&PageInput::new(&lines, &text))
    }

    #[test]
    fn test_row_below_label() {
        let s = extract(&[
            "Período de Apuração Data de Vencimento Número do Documento",
            "30/09/2025 | 20/10/2025 | 07.01.25275.0746065-9",
        ]);
        assert_eq!(s.assessment_period, FieldValue::found("30/09/2025"));
        assert_eq!(s.due_date, FieldValue::found("20/10/2025"));
        assert_eq!(s.document_number, FieldValue::found("07.01.25275.0746065-9"));
    }

    #[test]
    fn test_row_on_label_line() {
        let s = extract(&["Período de Apuração 30/09/2025 20/10/2025 07.01.25275.0746065-9"]);
        assert_eq!(s.due_date.as_deref(), Some("20/10/2025"));
        assert_eq!(s.document_number.as_deref(), Some("07.01.25275.0746065-9"));
    }

    #[test]
    fn test_dates_a_few_lines_below() {
        let s = extract(&[
            "Período de Apuração",
            "Data de Vencimento",
            "30/09/2025 20/10/2025",
            "Número: 07.01.25275.0746065-9",
        ]);
        assert_eq!(s.assessment_period.as_deref(), Some("30/09/2025"));
        assert_eq!(s.due_date.as_deref(), Some("20/10/2025"));
        assert_eq!(s.document_number.as_deref(), Some("07.01.25275.0746065-9"));
    }

    #[test]
    fn test_independent_fallbacks() {
        let s = extract(&[
            "Pague até: Vencimento 20/10/2025",
            "Período 30/09/2025",
            "Documento 07.01.25275.0746065-9",
        ]);
        assert_eq!(s.assessment_period.as_deref(), Some("30/09/2025"));
        assert_eq!(s.due_date.as_deref(), Some("20/10/2025"));
        assert_eq!(s.document_number.as_deref(), Some("07.01.25275.0746065-9"));
    }

    #[test]
    fn test_invalid_date_is_malformed() {
        let s = extract(&["Período de Apuração", "31/02/2025 | 20/10/2025 | 07.01.25275.0746065-9"]);
        assert_eq!(s.assessment_period.status, FieldStatus::Malformed);
        assert_eq!(s.assessment_period.as_deref(), Some("31/02/2025"));
        assert_eq!(s.due_date.status, FieldStatus::Found);
    }

    #[test]
    fn test_loose_number_is_malformed() {
        let s = extract(&["Período de Apuração", "30/09/2025 20/10/2025 0701"]);
        assert_eq!(s.document_number.status, FieldStatus::Malformed);
        assert_eq!(
            s.document_number.error.as_deref(),
            Some("Número do documento com formato inválido.")
        );
    }

    #[test]
    fn test_nothing_found() {
        let s = extract(&["sem informação"]);
        assert_eq!(s.assessment_period.error.as_deref(), Some("Período de apuração não encontrado."));
        assert_eq!(s.due_date.error.as_deref(), Some("Data de vencimento não encontrada."));
        assert_eq!(s.document_number.error.as_deref(), Some("Número do documento não encontrado."));
    }

    #[test]
    fn test_due_from_remaining_dates() {
        assert_eq!(
            due_from_remaining_dates("01/09/2025 x 20/10/2025", Some("01/09/2025")),
            Some("20/10/2025".to_string())
        );
        assert_eq!(
            due_from_remaining_dates("20/10/2025", Some("30/09/2025")),
            Some("20/10/2025".to_string())
        );
        assert_eq!(due_from_remaining_dates("30/09/2025", Some("30/09/2025")), None);
        assert_eq!(due_from_remaining_dates("30/09/2025", None), None);
    }
}
