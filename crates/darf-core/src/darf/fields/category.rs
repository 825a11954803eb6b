//! Category code (4 digits) and its description (denominação).
//!
//! The code sits in the "Composição do Documento de Arrecadação" table. Years
//! printed in dates are the main source of false positives, so every pass
//! screens codes starting with 19/20 against their surroundings.

use super::{first_value, FieldExtractor};
use crate::darf::rules::patterns::{
    AMOUNT, AMOUNT_PREFIX, ANY_UPPER, CODE_AT_START, CODE_DESCRIPTION_AMOUNT, CODE_WITH_DESCRIPTION,
    COMPOSITION_CODE, COMPOSITION_WORD, DATE_PREFIX_BEFORE, FOUR_DIGITS, ISOLATED_CODE,
    KEYWORD_CODE, NUMERIC_PUNCT_LINE, ONLY_DIGITS, PERIOD_DUE_SUFFIX, PERIOD_REFERENCE, PIPES,
    SPACE_THEN_UPPER, STARTS_UPPER, TOTAL_MARKER, TOTAL_OR_NUMBER, UPPER_3, UPPER_5,
};
use crate::darf::rules::{
    chars_after, chars_before, collapse_whitespace, find_dates, looks_like_year, strip_pipes,
    truncate_chars, PageInput, Strategy,
};
use crate::models::record::FieldValue;

/// Lines scanned below the composition header.
const BLOCK_LINES: usize = 15;
/// Continuation lines appended to a description.
const CONTINUATION_LINES: usize = 5;
/// Longest description taken from free text.
const MAX_TEXT_DESCRIPTION: usize = 250;

/// Fields produced by [`CategoryExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFields {
    pub code: FieldValue,
    pub description: FieldValue,
}

#[derive(Debug, Default)]
pub struct CategoryExtractor;

impl CategoryExtractor {
    pub fn new() -> Self {
        Self
    }
}

type Found = (String, Option<String>);

const LINE_STRATEGIES: [(&str, Strategy<Found>); 2] = [
    ("composition block", composition_block),
    ("line scan", line_scan),
];

const TEXT_STRATEGIES: [(&str, Strategy<Found>); 5] = [
    ("text composition label", text_composition_label),
    ("text code keyword", text_code_keyword),
    ("text after composition", text_after_composition),
    ("text code description amount", text_code_description_amount),
    ("text nearest amount", text_nearest_amount),
];

impl FieldExtractor for CategoryExtractor {
    type Output = CategoryFields;

    fn extract(&self, page: &PageInput<'_>) -> CategoryFields {
        let flat = page.flat_text();
        let flat_page = PageInput::new(page.lines, &flat);

        let found = first_value("category code", page, &LINE_STRATEGIES)
            .or_else(|| first_value("category code", &flat_page, &TEXT_STRATEGIES));

        let (code, description) = match found {
            Some((code, description)) => (Some(code), description),
            None => (None, None),
        };

        CategoryFields {
            code: match code {
                Some(c) => FieldValue::found(c),
                None => FieldValue::not_found("Código não encontrado na composição do documento."),
            },
            description: match description.filter(|d| d.trim().chars().count() >= 3) {
                Some(d) => FieldValue::found(d),
                None => FieldValue::not_found("Denominação não encontrada ou vazia."),
            },
        }
    }
}

/// Whether a year-like code should be discarded given the text right before
/// and right after it.
fn rejects_year(code: &str, before: &str, after: &str) -> bool {
    if !looks_like_year(code) {
        return false;
    }
    let after = after.trim_start();
    before.ends_with('/')
        || after.starts_with(|c: char| c.is_ascii_digit() || c == '/')
        || !STARTS_UPPER.is_match(after)
}

/// Text before the first amount.
fn before_amount(text: &str) -> &str {
    match AMOUNT.find(text) {
        Some(m) => text[..m.start()].trim(),
        None => text.trim(),
    }
}

/// Join the first description fragment with the lines that continue it.
fn assemble_description(first: &str, lines: &[String], from: usize) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if !first.is_empty() {
        parts.push(first.to_string());
    }

    for line in lines.iter().skip(from).take(CONTINUATION_LINES) {
        let clean = strip_pipes(line);
        if AMOUNT.is_match(&clean)
            || TOTAL_MARKER.is_match(&clean)
            || ONLY_DIGITS.is_match(&clean)
            || clean.chars().count() < 3
        {
            break;
        }
        if !NUMERIC_PUNCT_LINE.is_match(&clean) && !PERIOD_REFERENCE.is_match(&clean) {
            parts.push(clean);
        }
    }

    join_parts(&parts)
}

fn join_parts(parts: &[String]) -> Option<String> {
    if parts.is_empty() {
        return None;
    }
    Some(collapse_whitespace(&parts.join(" ")).trim().to_string())
}

/// Clean a description cut out of free text.
fn clean_text_description(raw: &str) -> String {
    let stripped = PERIOD_DUE_SUFFIX.replace(raw.trim(), "");
    collapse_whitespace(truncate_chars(&stripped, MAX_TEXT_DESCRIPTION))
        .trim()
        .to_string()
}

fn composition_anchor(lines: &[String]) -> Option<usize> {
    let mut fallback = None;
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if lower.contains("composição") {
            if lower.contains("arrecadação") {
                return Some(i);
            }
            fallback.get_or_insert(i);
        }
    }
    fallback
}

/// Code at the start of one of the lines below the composition header.
fn composition_block(page: &PageInput<'_>) -> Option<Found> {
    let idx = composition_anchor(page.lines)?;

    for j in idx + 1..(idx + 1 + BLOCK_LINES).min(page.lines.len()) {
        let clean = strip_pipes(&page.lines[j]);
        let Some(caps) = CODE_AT_START.captures(&clean) else {
            continue;
        };
        let code = &caps[1];
        let rest = caps[2].trim();

        if rejects_year(code, "", rest) {
            continue;
        }

        let rest = collapse_whitespace(rest);
        let description = assemble_description(before_amount(&rest), page.lines, j + 1);
        return Some((code.to_string(), description));
    }

    None
}

/// Line by line: a code followed by an uppercase description near an amount,
/// or a code alone on its line with an amount shortly after.
fn line_scan(page: &PageInput<'_>) -> Option<Found> {
    let lines = page.lines;

    for j in 0..lines.len() {
        let clean = strip_pipes(&lines[j]);

        if let Some(caps) = CODE_WITH_DESCRIPTION.captures(&clean) {
            let m = caps.get(1)?;
            let code = m.as_str();

            if looks_like_year(code) {
                let previous = if j > 0 { lines[j - 1].as_str() } else { "" };
                let next = lines.get(j + 1).map(String::as_str).unwrap_or("");
                let context = format!("{} {} {}", previous, clean, next);
                let in_date = find_dates(&context).iter().any(|d| d.ends_with(code));
                if in_date
                    || previous.trim_end().ends_with(code)
                    || clean[..m.start()].ends_with('/')
                {
                    continue;
                }
            }

            let near_amount = page
                .window(j.saturating_sub(2), j + 5)
                .iter()
                .any(|line| AMOUNT.is_match(line));
            if near_amount {
                let description = assemble_description(before_amount(&clean[m.end()..]), lines, j + 1);
                return Some((code.to_string(), description));
            }
        }

        if let Some(found) = isolated_code(page, j, &clean) {
            return Some(found);
        }
    }

    None
}

fn isolated_code(page: &PageInput<'_>, j: usize, clean: &str) -> Option<Found> {
    let caps = ISOLATED_CODE.captures(clean)?;
    let code = caps.get(1).or_else(|| caps.get(2))?.as_str();
    if looks_like_year(code) {
        return None;
    }

    let lines = page.lines;
    for k in j + 1..(j + 6).min(lines.len()) {
        if !AMOUNT.is_match(&lines[k]) {
            continue;
        }

        let has_description = lines[j.saturating_sub(2)..k]
            .iter()
            .any(|line| UPPER_5.is_match(&strip_pipes(line)));

        if has_description || j + 1 < k {
            let parts: Vec<String> = lines[j + 1..k]
                .iter()
                .map(|line| strip_pipes(line))
                .filter(|line| {
                    !line.is_empty()
                        && !AMOUNT.is_match(line)
                        && !TOTAL_OR_NUMBER.is_match(line)
                        && ANY_UPPER.is_match(line)
                })
                .collect();
            return Some((code.to_string(), join_parts(&parts)));
        }
    }

    None
}

/// Description following the first occurrence of `code` in the flat text.
fn description_after_code(flat: &str, code: &str) -> Option<String> {
    let pos = flat.find(code)?;
    let context = chars_after(flat, pos + code.len(), 400);
    let context = collapse_whitespace(&PIPES.replace_all(context, " "));
    let raw = lazy_description(&context)?;
    Some(clean_text_description(raw))
}

fn is_upper(c: char) -> bool {
    c.is_ascii_uppercase() || "ÁÀÂÃÉÈÊÍÌÎÓÒÔÕÚÙÛÇ".contains(c)
}

/// Letter of the description alphabet in either case.
fn is_letter(c: char) -> bool {
    if is_upper(c) {
        return true;
    }
    let mut upper = c.to_uppercase();
    matches!((upper.next(), upper.next()), (Some(u), None) if u != c && is_upper(u))
}

fn is_description_char(c: char) -> bool {
    is_letter(c) || c.is_whitespace() || c.is_ascii_digit() || c == '-' || c == '/'
}

/// Whether a description may end right before `rest`.
fn ends_description(rest: &str) -> bool {
    rest.is_empty()
        || AMOUNT_PREFIX.is_match(rest)
        || rest
            .get(..5)
            .is_some_and(|head| head.eq_ignore_ascii_case("total"))
}

/// Shortest run of at least six description characters, starting with a
/// letter, that ends right before an amount, a "Total(s)" marker or the end
/// of the text. The leftmost such run wins.
fn lazy_description(context: &str) -> Option<&str> {
    let chars: Vec<(usize, char)> = context.char_indices().collect();
    let offset = |k: usize| chars.get(k).map(|&(i, _)| i).unwrap_or(context.len());

    for (s, &(start, c)) in chars.iter().enumerate() {
        if !is_letter(c) {
            continue;
        }
        let mut k = s + 1;
        let mut body = 0;
        loop {
            let end = offset(k);
            if body >= 5 && ends_description(&context[end..]) {
                return Some(&context[start..end]);
            }
            match chars.get(k) {
                Some(&(_, ch)) if is_description_char(ch) => {
                    body += 1;
                    k += 1;
                }
                _ => break,
            }
        }
    }

    None
}

fn text_composition_label(page: &PageInput<'_>) -> Option<Found> {
    let flat = page.text;
    let caps = COMPOSITION_CODE.captures(flat)?;
    let m = caps.get(1)?;
    let code = m.as_str();
    if rejects_year(code, chars_before(flat, m.start(), 1), chars_after(flat, m.end(), 50)) {
        return None;
    }
    Some((code.to_string(), description_after_code(flat, code)))
}

fn text_code_keyword(page: &PageInput<'_>) -> Option<Found> {
    let flat = page.text;
    let caps = KEYWORD_CODE.captures(flat)?;
    let m = caps.get(1)?;
    let code = m.as_str();
    if rejects_year(code, chars_before(flat, m.start(), 1), chars_after(flat, m.end(), 50)) {
        return None;
    }
    Some((code.to_string(), description_after_code(flat, code)))
}

/// First plausible 4-digit token within 500 characters after "composição".
fn text_after_composition(page: &PageInput<'_>) -> Option<Found> {
    let flat = page.text;
    let pos = COMPOSITION_WORD.find(flat)?.start();
    let window = chars_after(flat, pos, 500);

    let code = FOUR_DIGITS.find_iter(window).find_map(|m| {
        let code = m.as_str();
        if looks_like_year(code) {
            let before = chars_before(window, m.start(), 10);
            let after = chars_after(window, m.end(), 10);
            if before.contains('/') || after.contains('/') || !SPACE_THEN_UPPER.is_match(after) {
                return None;
            }
        }
        Some(code)
    })?;

    Some((code.to_string(), description_after_code(flat, code)))
}

fn text_code_description_amount(page: &PageInput<'_>) -> Option<Found> {
    let flat = page.text;
    let caps = CODE_DESCRIPTION_AMOUNT.captures(flat)?;
    let m = caps.get(1)?;
    let code = m.as_str();

    if looks_like_year(code) && DATE_PREFIX_BEFORE.is_match(chars_before(flat, m.start(), 20)) {
        return None;
    }

    Some((code.to_string(), Some(clean_text_description(&caps[2]))))
}

/// The 4-digit token closest to a following amount (under 200 characters),
/// with uppercase text in between.
fn text_nearest_amount(page: &PageInput<'_>) -> Option<Found> {
    let flat = page.text;
    let amounts: Vec<usize> = AMOUNT.find_iter(flat).map(|m| m.start()).collect();
    let mut best: Option<(&str, usize, &str)> = None;

    for m in FOUR_DIGITS.find_iter(flat) {
        let code = m.as_str();
        if looks_like_year(code) {
            let before = chars_before(flat, m.start(), 10);
            let after = chars_after(flat, m.end(), 10);
            if before.contains('/') || after.contains('/') {
                continue;
            }
        }

        let code_end = m.end();
        for &amount_start in amounts.iter().filter(|&&a| a > code_end) {
            // a char is at most 4 bytes
            if amount_start - code_end >= 800 {
                break;
            }
            let between = &flat[code_end..amount_start];
            let distance = between.chars().count();
            let closer = best.is_none_or(|(_, d, _)| distance < d);
            if distance < 200 && closer && UPPER_3.is_match(between) {
                best = Some((code, distance, between));
                break;
            }
        }
    }

    best.map(|(code, _, between)| (code.to_string(), Some(clean_text_description(between))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FieldStatus;
    use pretty_assertions::assert_eq;

    fn extract(lines: &[&str]) -> CategoryFields {
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        let text = lines.join("\n");
        CategoryExtractor::new().extract(&PageInput::new(&lines, &text))
    }

    fn flat(text: &str) -> (Vec<String>, String) {
        (Vec::new(), collapse_whitespace(text))
    }

    #[test]
    fn test_composition_block() {
        let c = extract(&[
            "Composição do Documento de Arrecadação",
            "Código Denominação Principal Multa Juros Total",
            "PA 09/2025 Vencimento 20/10/2025",
            "1082 | CP DESCONTADA SEGURADO | 1.386,00 | 1.386,00",
        ]);
        assert_eq!(c.code, FieldValue::found("1082"));
        assert_eq!(c.description, FieldValue::found("CP DESCONTADA SEGURADO"));
    }

    #[test]
    fn test_description_spans_lines() {
        let c = extract(&[
            "Composição do Documento de Arrecadação",
            "1138 CONTRIBUICAO PREVIDENCIARIA",
            "PATRONAL GILRAT",
            "PA 09/2025",
            "2.500,00",
        ]);
        assert_eq!(c.code.as_deref(), Some("1138"));
        assert_eq!(
            c.description.as_deref(),
            Some("CONTRIBUICAO PREVIDENCIARIA PATRONAL GILRAT")
        );
    }

    #[test]
    fn test_year_after_slash_is_rejected() {
        let c = extract(&["Emitido em 30/09/2025 VALOR DEVIDO 100,00"]);
        assert_eq!(c.code.status, FieldStatus::NotFound);
        assert_eq!(c.description.status, FieldStatus::NotFound);
    }

    #[test]
    fn test_year_in_block_is_skipped() {
        let c = extract(&[
            "Composição do Documento de Arrecadação",
            "2025 30/09 competência",
            "1082 CP DESCONTADA SEGURADO 10,00",
        ]);
        assert_eq!(c.code.as_deref(), Some("1082"));
    }

    #[test]
    fn test_code_near_amount_without_header() {
        let c = extract(&[
            "Emitido em 30/09/2025 VALOR DEVIDO 100,00",
            "1082 CP DESCONTADA SEGURADO 1.386,00",
        ]);
        assert_eq!(c.code.as_deref(), Some("1082"));
        assert_eq!(c.description.as_deref(), Some("CP DESCONTADA SEGURADO"));
    }

    #[test]
    fn test_isolated_code_line() {
        let c = extract(&["Receita", "1646", "CONTRIBUICAO RISCOS AMBIENTAIS", "320,15"]);
        assert_eq!(c.code.as_deref(), Some("1646"));
        assert_eq!(c.description.as_deref(), Some("CONTRIBUICAO RISCOS AMBIENTAIS"));
    }

    #[test]
    fn test_text_code_description_amount() {
        let (lines, text) = flat("xx 1099 CP SEGURADO CONTRIBUINTE 55,00 yy");
        let page = PageInput::new(&lines, &text);
        let (code, description) = text_code_description_amount(&page).unwrap();
        assert_eq!(code, "1099");
        assert_eq!(description.as_deref(), Some("CP SEGURADO CONTRIBUINTE"));
    }

    #[test]
    fn test_text_nearest_amount_picks_closest() {
        let (lines, text) = flat("1234 ABC 99,00 and 5678 XYZ 10,00");
        let page = PageInput::new(&lines, &text);
        let (code, description) = text_nearest_amount(&page).unwrap();
        assert_eq!(code, "1234");
        assert_eq!(description.as_deref(), Some("ABC"));
    }

    #[test]
    fn test_lazy_description_stops_before_amount() {
        assert_eq!(lazy_description(" CP DESCONTADA 1.386,00 x"), Some("CP DESCONTADA "));
        assert_eq!(lazy_description(" abc 1"), None);
        assert_eq!(lazy_description(" RETENCAO Total 5,00"), Some("RETENCAO "));
    }

    #[test]
    fn test_rejected_year_falls_through_to_later_strategies() {
        let (lines, text) =
            flat("Composição do Documento de Arrecadação 2025/09 xx 1082 CP DESCONTADA SEGURADO 1.386,00");
        let page = PageInput::new(&lines, &text);
        assert_eq!(text_composition_label(&page), None);

        let c = CategoryExtractor::new().extract(&page);
        assert_eq!(c.code.as_deref(), Some("1082"));
        assert!(c.description.as_deref().unwrap().starts_with("CP DESCONTADA"));
    }

    #[test]
    fn test_code_keyword_skips_years() {
        let (lines, text) = flat("Código de Receita 2025 - 10,00");
        assert_eq!(text_code_keyword(&PageInput::new(&lines, &text)), None);

        let (lines, text) = flat("Código de Receita 1082 RETENÇÃO NA FONTE");
        let (code, _) = text_code_keyword(&PageInput::new(&lines, &text)).unwrap();
        assert_eq!(code, "1082");
    }

    #[test]
    fn test_description_drops_period_and_due_suffix() {
        assert_eq!(
            clean_text_description("CP DESCONTADA SEGURADO PA 09/2025 Vencimento 20/10/2025"),
            "CP DESCONTADA SEGURADO"
        );
        assert_eq!(
            clean_text_description("CP DESCONTADA SEGURADO PA 09/2025 Vencimento 10/2025"),
            "CP DESCONTADA SEGURADO"
        );
    }

    #[test]
    fn test_rejects_year() {
        assert!(rejects_year("2025", "09/", " CP"));
        assert!(rejects_year("2025", "", " 10,00"));
        assert!(rejects_year("2024", "", " competência"));
        assert!(!rejects_year("2025", "", " CP DESCONTADA"));
        assert!(!rejects_year("1082", "/", "10"));
    }
}
