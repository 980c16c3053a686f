//! Expenses module - expense records and the filtered expense list.

mod expenses_filter;
mod expenses_model;

pub use expenses_filter::{DateRange, ExpenseFilters, ExpenseSortOrder, ExpenseView};
pub use expenses_model::Expense;
