//! Filter and sort inputs for the currency list, and the pipeline they drive.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::fx_model::CurrencyRate;
use crate::pipeline::FilterSortPipeline;
use crate::reactive::{DerivedView, GraphError, Observable, Signal};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurrencySortOrder {
    #[default]
    CodeAsc,
    CodeDesc,
    RateAsc,
    RateDesc,
}

/// Snapshot of every active currency criterion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyCriteria {
    pub code: Option<String>,
    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
    pub search: Option<String>,
    pub sort_order: CurrencySortOrder,
}

/// Case-insensitive substring match on the code.
pub fn matches_code(filter: &Option<String>, rate: &CurrencyRate) -> bool {
    match filter {
        Some(needle) => rate.code.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

pub fn above_min(min: &Option<f64>, rate: &CurrencyRate) -> bool {
    min.map_or(true, |min| rate.rate >= min)
}

pub fn below_max(max: &Option<f64>, rate: &CurrencyRate) -> bool {
    max.map_or(true, |max| rate.rate <= max)
}

/// Case-insensitive match against the code or the display name.
pub fn matches_search(query: &Option<String>, rate: &CurrencyRate) -> bool {
    match query {
        Some(query) => {
            let query = query.to_lowercase();
            rate.code.to_lowercase().contains(&query) || rate.name.to_lowercase().contains(&query)
        }
        None => true,
    }
}

/// Total order for `order`. Equal rates fall back to code ascending.
pub fn compare(order: &CurrencySortOrder, a: &CurrencyRate, b: &CurrencyRate) -> Ordering {
    match order {
        CurrencySortOrder::CodeAsc => a.code.cmp(&b.code),
        CurrencySortOrder::CodeDesc => b.code.cmp(&a.code),
        CurrencySortOrder::RateAsc => a.rate.total_cmp(&b.rate).then_with(|| a.code.cmp(&b.code)),
        CurrencySortOrder::RateDesc => b.rate.total_cmp(&a.rate).then_with(|| a.code.cmp(&b.code)),
    }
}

fn text_input(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn bound_input(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// The independent inputs of the currency list.
///
/// Setters normalize their input: blank text and non-finite bounds mean "no
/// constraint".
#[derive(Clone, Debug)]
pub struct CurrencyFilters {
    pub code: Observable<Option<String>>,
    pub min_rate: Observable<Option<f64>>,
    pub max_rate: Observable<Option<f64>>,
    pub search: Observable<Option<String>>,
    pub sort_order: Observable<CurrencySortOrder>,
}

impl Default for CurrencyFilters {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrencyFilters {
    pub fn new() -> Self {
        Self {
            code: Observable::new(None),
            min_rate: Observable::new(None),
            max_rate: Observable::new(None),
            search: Observable::new(None),
            sort_order: Observable::new(CurrencySortOrder::default()),
        }
    }

    pub fn set_code(&self, code: Option<String>) {
        self.code.set(text_input(code));
    }

    pub fn set_min_rate(&self, min: Option<f64>) {
        self.min_rate.set(bound_input(min));
    }

    pub fn set_max_rate(&self, max: Option<f64>) {
        self.max_rate.set(bound_input(max));
    }

    pub fn set_search(&self, query: Option<String>) {
        self.search.set(text_input(query));
    }

    pub fn set_sort_order(&self, order: CurrencySortOrder) {
        self.sort_order.set(order);
    }

    /// Clears every criterion and restores the default order.
    pub fn reset(&self) {
        self.code.set(None);
        self.min_rate.set(None);
        self.max_rate.set(None);
        self.search.set(None);
        self.sort_order.set(CurrencySortOrder::default());
    }

    pub fn criteria(&self) -> CurrencyCriteria {
        CurrencyCriteria {
            code: self.code.get(),
            min_rate: self.min_rate.get(),
            max_rate: self.max_rate.get(),
            search: self.search.get(),
            sort_order: self.sort_order.get(),
        }
    }

    /// Builds the filtered, sorted view over `base`.
    ///
    /// Stage order: code, min, max, search, then sort.
    pub fn pipeline<S>(&self, base: &S) -> Result<DerivedView<Arc<[CurrencyRate]>>, GraphError>
    where
        S: Signal<Arc<[CurrencyRate]>> + Clone + 'static,
    {
        FilterSortPipeline::over(base)
            .filter(&self.code, matches_code)
            .filter(&self.min_rate, above_min)
            .filter(&self.max_rate, below_max)
            .filter(&self.search, matches_search)
            .sort_by(&self.sort_order, compare)
            .build()
    }
}
