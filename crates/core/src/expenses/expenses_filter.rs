use std::cmp::Ordering;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::expenses_model::Expense;
use crate::pipeline::FilterSortPipeline;
use crate::reactive::{DerivedView, GraphError, Observable, Signal};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseSortOrder {
    #[default]
    DateDesc,
    DateAsc,
    AmountDesc,
    AmountAsc,
    TitleAsc,
    TitleDesc,
}

/// Inclusive date bounds. Only applied when both ends are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

fn in_category(category: &Option<i64>, expense: &Expense) -> bool {
    match category {
        Some(id) => expense.category_id == Some(*id),
        None => true,
    }
}

fn in_range(range: &DateRange, expense: &Expense) -> bool {
    match (range.start, range.end) {
        (Some(start), Some(end)) => expense
            .expense_date
            .is_some_and(|date| date >= start && date <= end),
        _ => true,
    }
}

fn matches_search(query: &Option<String>, expense: &Expense) -> bool {
    match query {
        Some(query) => expense.mentions(&query.to_lowercase()),
        None => true,
    }
}

/// Missing values sort after present ones in either direction.
fn present_first<T>(a: Option<T>, b: Option<T>, cmp: impl FnOnce(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn title_key(expense: &Expense) -> Option<String> {
    let title = expense.title.trim();
    (!title.is_empty()).then(|| title.to_lowercase())
}

fn compare(order: &ExpenseSortOrder, a: &Expense, b: &Expense) -> Ordering {
    let primary = match order {
        ExpenseSortOrder::DateDesc => {
            present_first(a.expense_date, b.expense_date, |x, y| y.cmp(&x))
        }
        ExpenseSortOrder::DateAsc => {
            present_first(a.expense_date, b.expense_date, |x, y| x.cmp(&y))
        }
        ExpenseSortOrder::AmountDesc => b.amount.total_cmp(&a.amount),
        ExpenseSortOrder::AmountAsc => a.amount.total_cmp(&b.amount),
        ExpenseSortOrder::TitleAsc => present_first(title_key(a), title_key(b), |x, y| x.cmp(&y)),
        ExpenseSortOrder::TitleDesc => present_first(title_key(a), title_key(b), |x, y| y.cmp(&x)),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Filtered expenses and the sum of their amounts.
#[derive(Clone, Debug)]
pub struct ExpenseView {
    pub items: DerivedView<Arc<[Expense]>>,
    pub total: DerivedView<f64>,
}

/// The independent inputs of the expense list.
#[derive(Clone, Debug)]
pub struct ExpenseFilters {
    pub category: Observable<Option<i64>>,
    pub date_range: Observable<DateRange>,
    pub search: Observable<Option<String>>,
    pub sort_order: Observable<ExpenseSortOrder>,
}

impl Default for ExpenseFilters {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpenseFilters {
    pub fn new() -> Self {
        Self {
            category: Observable::new(None),
            date_range: Observable::new(DateRange::default()),
            search: Observable::new(None),
            sort_order: Observable::new(ExpenseSortOrder::default()),
        }
    }

    pub fn set_category(&self, category_id: Option<i64>) {
        self.category.set(category_id);
    }

    pub fn set_start_date(&self, start: Option<NaiveDate>) {
        self.date_range.update(|range| range.start = start);
    }

    pub fn set_end_date(&self, end: Option<NaiveDate>) {
        self.date_range.update(|range| range.end = end);
    }

    pub fn set_search(&self, query: Option<String>) {
        self.search.set(query.filter(|q| !q.trim().is_empty()));
    }

    pub fn set_sort_order(&self, order: ExpenseSortOrder) {
        self.sort_order.set(order);
    }

    pub fn reset(&self) {
        self.category.set(None);
        self.date_range.set(DateRange::default());
        self.search.set(None);
        self.sort_order.set(ExpenseSortOrder::default());
    }

    /// Builds the filtered list over `base` and its running total.
    ///
    /// Stage order: category, date range, search, then sort.
    pub fn view<S>(&self, base: &S) -> Result<ExpenseView, GraphError>
    where
        S: Signal<Arc<[Expense]>> + Clone + 'static,
    {
        let items = FilterSortPipeline::over(base)
            .filter(&self.category, in_category)
            .filter(&self.date_range, in_range)
            .filter(&self.search, matches_search)
            .sort_by(&self.sort_order, compare)
            .build()?;
        let total = DerivedView::map(&items, |expenses: Arc<[Expense]>| {
            expenses.iter().map(|e| e.amount).sum::<f64>()
        });
        Ok(ExpenseView { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn base() -> Observable<Arc<[Expense]>> {
        Observable::new(Arc::from(vec![
            Expense::new(1, "Rent", 900.0).with_category(1).with_date(day(1)),
            Expense::new(2, "groceries", 120.5)
                .with_category(2)
                .with_date(day(3))
                .with_description("weekly market"),
            Expense::new(3, "Coffee", 4.5).with_category(2).with_date(day(3)),
            Expense::new(4, "", 30.0).with_category(3),
            Expense::new(5, "Books", 45.0).with_description("Market stall"),
        ]))
    }

    fn ids(view: &ExpenseView) -> Vec<i64> {
        view.items.get().iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_default_sort_is_newest_first_with_undated_last() {
        let filters = ExpenseFilters::new();
        let view = filters.view(&base()).unwrap();
        assert_eq!(ids(&view), vec![2, 3, 1, 4, 5]);
        assert_eq!(view.total.get(), 1100.0);
    }

    #[test]
    fn test_date_range_needs_both_ends() {
        let filters = ExpenseFilters::new();
        let view = filters.view(&base()).unwrap();

        filters.set_start_date(Some(day(2)));
        assert_eq!(view.items.get().len(), 5);

        filters.set_end_date(Some(day(3)));
        assert_eq!(ids(&view), vec![2, 3]);
        assert_eq!(view.total.get(), 125.0);
    }

    #[test]
    fn test_search_covers_title_and_description() {
        let filters = ExpenseFilters::new();
        let view = filters.view(&base()).unwrap();
        filters.set_search(Some("MARKET".to_string()));
        assert_eq!(ids(&view), vec![2, 5]);
    }

    #[test]
    fn test_category_and_title_sort() {
        let filters = ExpenseFilters::new();
        let view = filters.view(&base()).unwrap();
        filters.set_sort_order(ExpenseSortOrder::TitleAsc);
        assert_eq!(ids(&view), vec![5, 3, 2, 1, 4]);

        filters.set_category(Some(2));
        filters.set_sort_order(ExpenseSortOrder::AmountDesc);
        assert_eq!(ids(&view), vec![2, 3]);

        filters.reset();
        assert_eq!(ids(&view), vec![2, 3, 1, 4, 5]);
    }
}
