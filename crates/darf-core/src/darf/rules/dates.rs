//! Brazilian date validation (dd/mm/yyyy).

use chrono::NaiveDate;

use super::patterns::DATE;

/// Parse a strict `dd/mm/yyyy` date.
pub fn parse_br_date(date: &str) -> Option<NaiveDate> {
    let bytes = date.as_bytes();
    if bytes.len() != 10 || bytes[2] != b'/' || bytes[5] != b'/' {
        return None;
    }
    NaiveDate::parse_from_str(date, "%d/%m/%Y").ok()
}

/// Whether the string is a real calendar date in `dd/mm/yyyy` form.
pub fn validate_br_date(date: &str) -> bool {
    parse_br_date(date).is_some()
}

/// All `dd/mm/yyyy`-shaped tokens in order of appearance (not validated).
pub fn find_dates(text: &str) -> Vec<&str> {
    DATE.find_iter(text).map(|m| m.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_br_date() {
        assert!(validate_br_date("30/09/2025"));
        assert!(validate_br_date("29/02/2024"));
        assert!(!validate_br_date("29/02/2025"));
        assert!(!validate_br_date("32/01/2025"));
        assert!(!validate_br_date("1/01/2025"));
        assert!(!validate_br_date("01-01-2025"));
    }

    #[test]
    fn test_find_dates() {
        let line = "30/09/2025 | 20/10/2025 | 07.01.25275.0746065-9";
        assert_eq!(find_dates(line), vec!["30/09/2025", "20/10/2025"]);
        assert!(find_dates("sem datas").is_empty());
    }
}
