//! CNPJ and legal name (razão social).

use super::FieldExtractor;
use crate::darf::rules::patterns::{
    CNPJ, EDGE_PIPES, LEGAL_NAME_LABEL, NUMERIC_PUNCT_LINE, PIPES, UPPERCASE_RUN,
};
use crate::darf::rules::{chars_after, first_success, strip_edge_artifacts, validate_cnpj, PageInput, Strategy};
use crate::models::record::FieldValue;

const CNPJ_NOT_FOUND: &str = "CNPJ não encontrado no texto.";
const CNPJ_INVALID: &str = "CNPJ encontrado, porém inválido pelos dígitos verificadores.";
const NAME_NOT_FOUND: &str = "Razão social não encontrada na linha do CNPJ.";

/// Fields produced by [`IdentityExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub tax_id: FieldValue,
    pub legal_name: FieldValue,
}

/// Extracts the taxpayer CNPJ and the legal name printed next to it.
#[derive(Debug)]
pub struct IdentityExtractor {
    validate: bool,
}

impl IdentityExtractor {
    pub fn new() -> Self {
        Self { validate: true }
    }

    /// Set whether to validate CNPJ check digits.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

impl Default for IdentityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

type Found = (String, Option<String>);

const STRATEGIES: [(&str, Strategy<Found>); 2] = [
    ("cnpj line", from_lines),
    ("full text", from_text),
];

impl FieldExtractor for IdentityExtractor {
    type Output = Identity;

    fn extract(&self, page: &PageInput<'_>) -> Identity {
        let found = first_success("cnpj", page, &STRATEGIES).map(|c| c.value);

        let (cnpj, name) = match found {
            Some((cnpj, name)) => (Some(cnpj), name),
            None => (None, None),
        };

        let tax_id = match cnpj {
            None => FieldValue::not_found(CNPJ_NOT_FOUND),
            Some(c) if self.validate && !validate_cnpj(&c) => FieldValue::malformed(c, CNPJ_INVALID),
            Some(c) => FieldValue::found(c),
        };

        let legal_name = match name.filter(|n| n.chars().count() >= 3) {
            Some(n) => FieldValue::found(n),
            None => FieldValue::not_found(NAME_NOT_FOUND),
        };

        Identity { tax_id, legal_name }
    }
}

fn from_lines(page: &PageInput<'_>) -> Option<Found> {
    let (idx, m) = page
        .lines
        .iter()
        .enumerate()
        .find_map(|(idx, line)| CNPJ.find(line).map(|m| (idx, m)))?;

    let line = &page.lines[idx];
    let cnpj = m.as_str().to_string();

    let mut name = Some(strip_edge_artifacts(&line[m.end()..])).filter(|n| !n.is_empty());

    if name.is_none() {
        name = page
            .lines
            .get(idx + 1)
            .map(|next| strip_edge_artifacts(next))
            .filter(|next| next.chars().count() > 5 && !NUMERIC_PUNCT_LINE.is_match(next));
    }

    if name.as_ref().is_none_or(|n| n.chars().count() < 5) {
        if let Some(labeled) = labeled_name(page, idx) {
            name = Some(labeled);
        }
    }

    Some((cnpj, name))
}

/// Text after a "Razão Social" label within three lines before and four after.
fn labeled_name(page: &PageInput<'_>, idx: usize) -> Option<String> {
    let start = idx.saturating_sub(3);
    (start..(idx + 5).min(page.lines.len()))
        .filter(|&j| j != idx)
        .map(|j| page.lines[j].as_str())
        .filter(|line| line.contains("Razão Social") || line.contains("Receita Social"))
        .find_map(|line| {
            let after = LEGAL_NAME_LABEL.split(line).nth(1)?;
            let candidate = EDGE_PIPES.replace_all(after.trim(), "").trim().to_string();
            (candidate.chars().count() > 5).then_some(candidate)
        })
}

fn from_text(page: &PageInput<'_>) -> Option<Found> {
    let m = CNPJ.find(page.text)?;
    let context = PIPES.replace_all(chars_after(page.text, m.end(), 200), " ");

    let name = UPPERCASE_RUN
        .find(&context)
        .map(|run| run.as_str().trim().to_string())
        .filter(|n| (5..=100).contains(&n.chars().count()));

    Some((m.as_str().to_string(), name))
}
