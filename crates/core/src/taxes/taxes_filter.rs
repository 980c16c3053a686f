use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate};

use super::taxes_model::{Tax, TaxStatus};
use crate::pipeline::FilterSortPipeline;
use crate::reactive::{DerivedView, GraphError, Observable, Signal, Source};

/// How far ahead of `today` a tax counts as upcoming.
pub const UPCOMING_WINDOW_MONTHS: u32 = 3;

fn has_status(status: &Option<TaxStatus>, tax: &Tax) -> bool {
    match status {
        Some(status) => tax.status == *status,
        None => true,
    }
}

fn has_type(tax_type: &Option<String>, tax: &Tax) -> bool {
    match tax_type {
        Some(tax_type) => tax.tax_type.eq_ignore_ascii_case(tax_type),
        None => true,
    }
}

fn latest_due_first(_status: &Option<TaxStatus>, a: &Tax, b: &Tax) -> Ordering {
    b.due_date.cmp(&a.due_date).then_with(|| a.id.cmp(&b.id))
}

/// Last day of the upcoming window. Month arithmetic clamps to the end of a
/// shorter month.
fn window_end(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_months(Months::new(UPCOMING_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MAX)
}

/// First and last day of the calendar month containing `today`.
fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.with_day(1).unwrap_or(today);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (start, end)
}

fn due_soon(taxes: &[Tax], today: NaiveDate) -> Arc<[Tax]> {
    let end = window_end(today);
    let mut due: Vec<Tax> = taxes
        .iter()
        .filter(|t| t.due_date >= today && t.due_date <= end && t.is_outstanding_on(today))
        .cloned()
        .collect();
    due.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
    Arc::from(due)
}

fn due_this_month(taxes: &[Tax], today: NaiveDate) -> f64 {
    let (start, end) = month_bounds(today);
    taxes
        .iter()
        .filter(|t| t.due_date >= start && t.due_date <= end)
        .map(|t| t.amount)
        .sum()
}

/// The tax screens: the filtered list, what falls due soon and this month's
/// total.
#[derive(Clone, Debug)]
pub struct TaxView {
    /// Taxes passing the status and type filters, latest due date first.
    pub items: DerivedView<Arc<[Tax]>>,
    /// Outstanding taxes due between `today` and the end of the window,
    /// soonest first. Ignores the status and type filters.
    pub upcoming: DerivedView<Arc<[Tax]>>,
    /// Sum of every tax due in the calendar month of `today`.
    pub period_total: DerivedView<f64>,
}

/// The independent inputs of the tax screens. `None` on a filter means all.
#[derive(Clone, Debug)]
pub struct TaxFilters {
    pub status: Observable<Option<TaxStatus>>,
    pub tax_type: Observable<Option<String>>,
    pub today: Observable<NaiveDate>,
}

impl TaxFilters {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            status: Observable::new(None),
            tax_type: Observable::new(None),
            today: Observable::new(today),
        }
    }

    pub fn set_status(&self, status: Option<TaxStatus>) {
        self.status.set(status);
    }

    /// A blank type clears the filter.
    pub fn set_tax_type(&self, tax_type: Option<String>) {
        self.tax_type
            .set(tax_type.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()));
    }

    pub fn set_today(&self, today: NaiveDate) {
        self.today.set(today);
    }

    pub fn reset(&self) {
        self.status.set(None);
        self.tax_type.set(None);
    }

    /// Builds the three tax views over `base`.
    pub fn view<S>(&self, base: &S) -> Result<TaxView, GraphError>
    where
        S: Signal<Arc<[Tax]>> + Clone + 'static,
    {
        let items = FilterSortPipeline::over(base)
            .filter(&self.status, has_status)
            .filter(&self.tax_type, has_type)
            // Fixed order; the status input only triggers the re-sort.
            .sort_by(&self.status, latest_due_first)
            .build()?;

        let sources = vec![base.as_source(), self.today.as_source()];
        let (taxes, today) = (base.clone(), self.today.clone());
        let upcoming = DerivedView::new(sources.clone(), move || {
            due_soon(&taxes.get(), today.get())
        })?;

        let (taxes, today) = (base.clone(), self.today.clone());
        let period_total = DerivedView::new(sources, move || {
            due_this_month(&taxes.get(), today.get())
        })?;

        Ok(TaxView {
            items,
            upcoming,
            period_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn base() -> Observable<Arc<[Tax]>> {
        Observable::new(Arc::from(vec![
            Tax::new(1, "USN Q1", "USN", 300.0, day(4, 25)).paid_on(day(4, 20)),
            Tax::new(2, "NDFL May", "NDFL", 130.0, day(5, 10)).with_status(TaxStatus::Overdue),
            Tax::new(3, "USN Q2", "USN", 450.0, day(5, 28)),
            Tax::new(4, "Insurance", "INSURANCE", 90.0, day(6, 1)).paid_on(day(5, 14)),
            Tax::new(5, "Patent", "PATENT", 600.0, day(8, 15)),
            Tax::new(6, "Property", "PROPERTY", 1200.0, day(8, 16)),
        ]))
    }

    fn ids(view: &DerivedView<Arc<[Tax]>>) -> Vec<i64> {
        view.get().iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_unset_filters_show_everything_latest_due_first() {
        let filters = TaxFilters::new(day(5, 15));
        let view = filters.view(&base()).unwrap();
        assert_eq!(ids(&view.items), vec![6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_status_and_type_filters_combine() {
        let filters = TaxFilters::new(day(5, 15));
        let view = filters.view(&base()).unwrap();

        filters.set_status(Some(TaxStatus::Upcoming));
        assert_eq!(ids(&view.items), vec![6, 5, 3]);

        filters.set_tax_type(Some("usn".to_string()));
        assert_eq!(ids(&view.items), vec![3]);

        filters.set_status(None);
        assert_eq!(ids(&view.items), vec![3, 1]);

        filters.set_tax_type(Some("  ".to_string()));
        assert_eq!(filters.tax_type.get(), None);
        assert_eq!(view.items.get().len(), 6);
    }

    #[test]
    fn test_upcoming_covers_three_months_of_unpaid_taxes() {
        let filters = TaxFilters::new(day(5, 15));
        let view = filters.view(&base()).unwrap();
        // 2 is already past due, 4 was paid, 6 falls one day outside the window.
        assert_eq!(ids(&view.upcoming), vec![3, 5]);

        filters.set_status(Some(TaxStatus::Paid));
        assert_eq!(ids(&view.upcoming), vec![3, 5]);
    }

    #[test]
    fn test_payment_after_today_still_counts_as_upcoming() {
        let taxes = Observable::new(Arc::from(vec![
            Tax::new(1, "USN Q2", "USN", 450.0, day(5, 28)).paid_on(day(5, 20)),
        ]));
        let filters = TaxFilters::new(day(5, 15));
        let view = filters.view(&taxes).unwrap();
        assert_eq!(ids(&view.upcoming), vec![1]);

        filters.set_today(day(5, 20));
        assert!(view.upcoming.get().is_empty());
    }

    #[test]
    fn test_window_end_clamps_to_short_month() {
        assert_eq!(window_end(day(11, 30)), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(month_bounds(day(2, 10)), (day(2, 1), day(2, 29)));
    }

    #[test]
    fn test_period_total_follows_today() {
        let filters = TaxFilters::new(day(5, 15));
        let taxes = base();
        let view = filters.view(&taxes).unwrap();
        assert_eq!(view.period_total.get(), 580.0);

        filters.set_status(Some(TaxStatus::Paid));
        assert_eq!(view.period_total.get(), 580.0);

        filters.set_today(day(8, 1));
        assert_eq!(view.period_total.get(), 1800.0);

        taxes.update(|all| {
            let mut rows = all.to_vec();
            rows.push(Tax::new(7, "Land", "LAND", 50.0, day(8, 31)));
            *all = Arc::from(rows);
        });
        assert_eq!(view.period_total.get(), 1850.0);
    }

    #[test]
    fn test_changing_today_publishes_each_view_once() {
        let filters = TaxFilters::new(day(5, 15));
        let view = filters.view(&base()).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = view
            .upcoming
            .subscribe(move |taxes| sink.borrow_mut().push(taxes.len()));

        filters.set_today(day(6, 1));
        assert_eq!(*seen.borrow(), vec![2, 2]);
        assert_eq!(view.upcoming.version(), 1);
    }
}
