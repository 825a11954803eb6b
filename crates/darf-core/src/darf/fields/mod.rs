//! Field extractors. Each one runs an ordered fallback chain over the page
//! lines first and the full page text last.

pub mod barcode;
pub mod category;
pub mod identity;
pub mod schedule;
pub mod total;

pub use barcode::BarcodeExtractor;
pub use category::{CategoryExtractor, CategoryFields};
pub use identity::{Identity, IdentityExtractor};
pub use schedule::{Schedule, ScheduleExtractor};
pub use total::TotalAmountExtractor;

use crate::darf::rules::{first_success, PageInput, Strategy};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The fields this extractor produces.
    type Output;

    /// Extract from one page. Never fails: absence is reported in the output.
    fn extract(&self, page: &PageInput<'_>) -> Self::Output;
}

/// Value of the first matching strategy.
pub(crate) fn first_value<T>(
    field: &str,
    page: &PageInput<'_>,
    strategies: &[(&'static str, Strategy<T>)],
) -> Option<T> {
    first_success(field, page, strategies).map(|c| c.value)
}
