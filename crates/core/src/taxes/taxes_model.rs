use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxStatus {
    #[default]
    Upcoming,
    Paid,
    Overdue,
}

/// A tax obligation with a due date. Like expenses, rows are owned by the
/// embedding application.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tax {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Free-form regime code, e.g. `USN` or `NDFL`.
    pub tax_type: String,
    pub amount: f64,
    pub status: TaxStatus,
    pub due_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
}

impl Tax {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        tax_type: impl Into<String>,
        amount: f64,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            tax_type: tax_type.into(),
            amount,
            status: TaxStatus::default(),
            due_date,
            payment_date: None,
        }
    }

    pub fn with_status(mut self, status: TaxStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the tax paid on `date`.
    pub fn paid_on(mut self, date: NaiveDate) -> Self {
        self.status = TaxStatus::Paid;
        self.payment_date = Some(date);
        self
    }

    /// True unless a payment was made on or before `date`.
    pub fn is_outstanding_on(&self, date: NaiveDate) -> bool {
        !self.payment_date.is_some_and(|paid| paid <= date)
    }
}
