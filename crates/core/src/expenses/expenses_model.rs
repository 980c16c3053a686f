use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A recorded expense. Persistence lives with the embedding application; the
/// filtered list only reads these.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub category_id: Option<i64>,
    pub expense_date: Option<NaiveDate>,
}

impl Expense {
    pub fn new(id: i64, title: impl Into<String>, amount: f64) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            amount,
            category_id: None,
            expense_date: None,
        }
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.expense_date = Some(date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Case-insensitive match on the title or description.
    pub fn mentions(&self, query_lower: &str) -> bool {
        self.title.to_lowercase().contains(query_lower)
            || self
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(query_lower))
    }
}
