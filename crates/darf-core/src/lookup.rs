//! Code→category and CNPJ→org-unit lookups.
//!
//! The extraction core only reads these tables. Persisting edits is left to
//! the caller (the CLI stores them inside the JSON config file).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DarfError;
use crate::formatters::digits_only;

/// Output sheet a category code is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Employee contribution withheld from payroll.
    #[serde(rename = "servidor")]
    Servidor,
    /// Employer contribution (patronal / GILRAT).
    #[serde(rename = "patronal-gilrat")]
    PatronalGilrat,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Servidor => "servidor",
            Category::PatronalGilrat => "patronal-gilrat",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DarfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "servidor" => Ok(Category::Servidor),
            "patronal-gilrat" => Ok(Category::PatronalGilrat),
            other => Err(DarfError::Config(format!(
                "unknown category '{}', expected 'servidor' or 'patronal-gilrat'",
                other
            ))),
        }
    }
}

/// Resolves a 4-digit category code.
pub trait CategoryLookup {
    fn get_category(&self, code: &str) -> Option<Category>;
}

/// Resolves the org unit (UO Contribuinte) of a CNPJ.
pub trait OrgUnitLookup {
    fn get_org_unit(&self, cnpj: &str) -> Option<String>;
}

/// In-memory lookup tables.
///
/// Codes are stored trimmed; CNPJs are stored as 14 bare digits so that
/// formatted and unformatted inputs resolve to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupTables {
    pub categories: BTreeMap<String, Category>,
    pub org_units: BTreeMap<String, String>,
}

const DEFAULT_CATEGORIES: &[(&str, Category)] = &[
    ("1082", Category::Servidor),
    ("1099", Category::Servidor),
    ("1138", Category::PatronalGilrat),
    ("1646", Category::PatronalGilrat),
];

const DEFAULT_ORG_UNITS: &[(&str, &str)] = &[
    ("18.715.565/0001-10", "1071"),
    ("16.745.465/0001-01", "1081"),
    ("07.256.298/0001-44", "1101"),
    ("16.907.746/0001-13", "1191"),
    ("19.377.514/0001-99", "1221"),
    ("18.715.573/0001-67", "1231"),
    ("19.138.890/0001-20", "1271"),
    ("18.715.581/0001-03", "1301"),
    ("00.957.404/0001-78", "1371"),
    ("05.487.631/0001-09", "1451"),
    ("05.465.167/0001-41", "1481"),
    ("05.475.103/0001-21", "1491"),
    ("05.461.142/0001-70", "1501"),
    ("18.715.532/0001-70", "1511"),
    ("05.585.681/0001-10", "1521"),
    ("08.715.327/0001-51", "1541"),
    ("13.235.618/0001-82", "1631"),
    ("50.629.390/0001-31", "1711"),
    ("50.941.185/0001-07", "1721"),
];

impl Default for LookupTables {
    fn default() -> Self {
        let mut tables = Self::empty();
        for (code, category) in DEFAULT_CATEGORIES {
            tables.categories.insert(code.to_string(), *category);
        }
        for (cnpj, unit) in DEFAULT_ORG_UNITS {
            tables.org_units.insert(digits_only(cnpj), unit.to_string());
        }
        tables
    }
}

impl LookupTables {
    /// Tables with no entries.
    pub fn empty() -> Self {
        Self {
            categories: BTreeMap::new(),
            org_units: BTreeMap::new(),
        }
    }

    /// Register a category code. Fails on a malformed or duplicate code.
    pub fn add_category(&mut self, code: &str, category: Category) -> Result<(), DarfError> {
        let code = code.trim();
        if code.len() != 4 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(DarfError::Config(format!(
                "category code must have exactly 4 digits: '{}'",
                code
            )));
        }
        if self.categories.contains_key(code) {
            return Err(DarfError::Config(format!("category code {} already exists", code)));
        }
        self.categories.insert(code.to_string(), category);
        Ok(())
    }

    /// Remove a category code, returning its previous category.
    pub fn remove_category(&mut self, code: &str) -> Option<Category> {
        self.categories.remove(code.trim())
    }

    /// Register the org unit of a CNPJ. Fails unless the CNPJ has 14 digits.
    pub fn add_org_unit(&mut self, cnpj: &str, unit: &str) -> Result<(), DarfError> {
        let key = digits_only(cnpj);
        if key.len() != 14 {
            return Err(DarfError::Config(format!("CNPJ must have 14 digits: '{}'", cnpj)));
        }
        let unit = unit.trim();
        if unit.is_empty() {
            return Err(DarfError::Config("org unit cannot be empty".to_string()));
        }
        self.org_units.insert(key, unit.to_string());
        Ok(())
    }

    pub fn remove_org_unit(&mut self, cnpj: &str) -> Option<String> {
        self.org_units.remove(&digits_only(cnpj))
    }
}

impl CategoryLookup for LookupTables {
    fn get_category(&self, code: &str) -> Option<Category> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        self.categories.get(code).copied()
    }
}

impl OrgUnitLookup for LookupTables {
    fn get_org_unit(&self, cnpj: &str) -> Option<String> {
        let key = digits_only(cnpj);
        if key.len() != 14 {
            return None;
        }
        self.org_units.get(&key).cloned()
    }
}
