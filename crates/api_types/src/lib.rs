use serde::{Deserialize, Serialize};

/// Direction of a transaction or category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Income,
    Expense,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RegisterUser {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i64,
        pub name: String,
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserCreated {
        pub user: UserView,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub account_name: String,
        /// Decimal string ("12.34"); `.` or `,` as separator.
        pub account_balance: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountUpdate {
        pub account_name: Option<String>,
        /// Decimal string ("12.34"); `.` or `,` as separator.
        pub account_balance: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: i64,
        pub account_name: String,
        /// Balance in integer cents, if the owner tracks one.
        pub account_balance_cents: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountsResponse {
        pub accounts: Vec<AccountView>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        #[serde(rename = "type")]
        pub kind: EntryKind,
        pub sort_order: Option<i32>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub sort_order: Option<i32>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: i64,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: EntryKind,
        pub sort_order: i32,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoriesResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod budget {
    use super::*;

    /// Create-or-replace body for `PUT /budgets`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetSet {
        pub category_id: i64,
        /// Cap as a decimal string; "0" disables the cap.
        pub budget_amount: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: i64,
        pub category_id: i64,
        /// Cap in integer cents; 0 = unlimited.
        pub budget_amount_cents: i64,
        /// Accumulated spend in integer cents.
        pub total_amount_cents: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetsResponse {
        pub budgets: Vec<BudgetView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub account_id: i64,
        pub category_id: Option<i64>,
        #[serde(rename = "type")]
        pub kind: EntryKind,
        /// Decimal string ("12.34"); must be > 0.
        pub amount: String,
        /// Calendar date, ISO `YYYY-MM-DD`.
        pub date: String,
        pub description: Option<String>,
    }

    /// Patch body for `PATCH /transactions/:id`. Absent fields keep their
    /// stored value; account, category and type cannot change.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub amount: Option<String>,
        pub date: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i64,
        pub account_id: i64,
        pub category_id: Option<i64>,
        #[serde(rename = "type")]
        pub kind: EntryKind,
        /// Amount in integer cents.
        pub amount_cents: i64,
        /// Calendar date, ISO `YYYY-MM-DD`.
        pub date: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionsResponse {
        pub transactions: Vec<TransactionView>,
    }
}
