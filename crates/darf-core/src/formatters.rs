//! String cleanup helpers used when building payment rows.
//!
//! All helpers map empty input to an empty string.

use chrono::{Datelike, Duration, NaiveDate};

const DATE_FORMAT: &str = "%d/%m/%Y";

/// Keep only ASCII digits.
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Subtract one day from a `dd/mm/yyyy` date. Returns "" if the date is invalid.
pub fn previous_day(date: &str) -> String {
    match NaiveDate::parse_from_str(date.trim(), DATE_FORMAT) {
        Ok(d) => (d - Duration::days(1)).format(DATE_FORMAT).to_string(),
        Err(_) => String::new(),
    }
}

/// Month before `today` as `MM/YYYY`.
pub fn previous_month(today: NaiveDate) -> String {
    let (month, year) = if today.month() == 1 {
        (12, today.year() - 1)
    } else {
        (today.month() - 1, today.year())
    };
    format!("{:02}/{}", month, year)
}

/// Strip thousands and decimal separators: "1.386,00" -> "138600".
pub fn clean_amount(amount: &str) -> String {
    amount.replace(['.', ','], "")
}

/// Strip CNPJ punctuation: "29.979.036/0001-40" -> "29979036000140".
pub fn clean_cnpj(cnpj: &str) -> String {
    cnpj.replace(['.', '/', '-'], "")
}

/// "11/2025" -> "112025".
pub fn clean_month_year(month_year: &str) -> String {
    month_year.replace('/', "")
}

/// "19/10/2025" -> "19102025".
pub fn clean_date(date: &str) -> String {
    date.replace('/', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_previous_day() {
        assert_eq!(previous_day("01/01/2025"), "31/12/2024");
        assert_eq!(previous_day("15/03/2025"), "14/03/2025");
        assert_eq!(previous_day("01/03/2024"), "29/02/2024");
        assert_eq!(previous_day(" 20/10/2025 "), "19/10/2025");
    }

    #[test]
    fn test_previous_day_invalid() {
        assert_eq!(previous_day(""), "");
        assert_eq!(previous_day("31/02/2025"), "");
        assert_eq!(previous_day("2025-01-01"), "");
    }

    #[test]
    fn test_previous_month() {
        let jan = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let nov = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        assert_eq!(previous_month(jan), "12/2024");
        assert_eq!(previous_month(nov), "10/2025");
    }

    #[test]
    fn test_cleaners() {
        assert_eq!(clean_amount("1.386,00"), "138600");
        assert_eq!(clean_cnpj("29.979.036/0001-40"), "29979036000140");
        assert_eq!(clean_month_year("11/2025"), "112025");
        assert_eq!(clean_date("19/10/2025"), "19102025");
        assert_eq!(digits_only("85810000013-8 86000000000"), "858100000138860000000000");
        assert_eq!(clean_amount(""), "");
    }
}
