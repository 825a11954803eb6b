//! CNPJ (Brazilian company registration number) validation.

use crate::formatters::digits_only;

const DV1_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const DV2_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Strip everything but digits.
pub fn normalize_cnpj(cnpj: &str) -> String {
    digits_only(cnpj)
}

/// Validate a CNPJ using its two modulo-11 check digits.
///
/// Accepts formatted or bare input. Sequences of a single repeated digit
/// are rejected even when their check digits happen to match.
pub fn validate_cnpj(cnpj: &str) -> bool {
    let digits: Vec<u32> = cnpj.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 14 {
        return false;
    }

    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    let dv1 = check_digit(&digits[..12], &DV1_WEIGHTS);
    let mut base = digits[..12].to_vec();
    base.push(dv1);
    let dv2 = check_digit(&base, &DV2_WEIGHTS);

    digits[12] == dv1 && digits[13] == dv2
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights.iter()).map(|(d, w)| d * w).sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

/// Format 14 digits as XX.XXX.XXX/XXXX-XX. Other input is returned unchanged.
pub fn format_cnpj(cnpj: &str) -> String {
    let digits = normalize_cnpj(cnpj);

    if digits.len() != 14 {
        return cnpj.to_string();
    }

    format!(
        "{}.{}.{}/{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..14]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cnpj_valid() {
        assert!(validate_cnpj("18.715.565/0001-10"));
        assert!(validate_cnpj("18715565000110"));
        assert!(validate_cnpj("29.979.036/0001-40"));
        assert!(validate_cnpj("00.957.404/0001-78"));
    }

    #[test]
    fn test_validate_cnpj_invalid() {
        assert!(!validate_cnpj("18.715.565/0001-11")); // Wrong DV2
        assert!(!validate_cnpj("18.715.565/0001-00")); // Wrong DV1
        assert!(!validate_cnpj("1871556500011")); // Too short
        assert!(!validate_cnpj(""));
    }

    #[test]
    fn test_validate_cnpj_repeated_digits() {
        assert!(!validate_cnpj("11.111.111/1111-11"));
        assert!(!validate_cnpj("00000000000000"));
    }

    #[test]
    fn test_format_cnpj() {
        assert_eq!(format_cnpj("18715565000110"), "18.715.565/0001-10");
        assert_eq!(format_cnpj("123"), "123");
    }
}
