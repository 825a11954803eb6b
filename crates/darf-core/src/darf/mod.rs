//! DARF field extraction.

pub mod fields;
mod parser;
pub mod rules;

pub use fields::FieldExtractor;
pub use parser::{DarfParser, RecordParser};
