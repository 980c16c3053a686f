//! Taxes module - tax obligations, the filtered tax list and the due-soon
//! window.

mod taxes_filter;
mod taxes_model;

pub use taxes_filter::{TaxFilters, TaxView, UPCOMING_WINDOW_MONTHS};
pub use taxes_model::{Tax, TaxStatus};
