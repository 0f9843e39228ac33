//! Command structs for engine write operations.
//!
//! These types group parameters for the mutating calls
//! (record/update/delete transaction, set budget), keeping call sites
//! readable and making the set of updatable fields explicit.

use chrono::NaiveDate;

use crate::{Money, TransactionKind};

/// Create a transaction, updating the budget accumulator of its category.
#[derive(Clone, Debug)]
pub struct RecordTransactionCmd {
    pub user_id: i64,
    pub account_id: i64,
    /// Optional; a category-less transaction performs no accumulation.
    pub category_id: Option<i64>,
    pub kind: TransactionKind,
    /// Must be strictly positive.
    pub amount: Money,
    pub date: NaiveDate,
    pub description: Option<String>,
}

impl RecordTransactionCmd {
    #[must_use]
    pub fn new(
        user_id: i64,
        account_id: i64,
        kind: TransactionKind,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            account_id,
            category_id: None,
            kind,
            amount,
            date,
            description: None,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Update an existing transaction.
///
/// Only the fields listed here can change; account, category and type are
/// immutable once recorded. Every `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default)]
pub struct UpdateTransactionCmd {
    pub amount: Option<Money>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.amount.is_none() && self.date.is_none() && self.description.is_none()
    }
}

/// Create or replace the spending cap for an owned category.
#[derive(Clone, Debug)]
pub struct SetBudgetCmd {
    pub user_id: i64,
    pub category_id: i64,
    /// Cap in cents; 0 disables the cap.
    pub budget_amount: Money,
}

/// Update an existing account. `None` fields keep their stored value.
#[derive(Clone, Debug, Default)]
pub struct UpdateAccountCmd {
    pub account_name: Option<String>,
    pub account_balance: Option<Money>,
}

/// Update an existing category. `None` fields keep their stored value.
#[derive(Clone, Debug, Default)]
pub struct UpdateCategoryCmd {
    pub name: Option<String>,
    pub sort_order: Option<i32>,
    pub description: Option<String>,
}
