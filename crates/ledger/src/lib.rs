pub use accounts::Account;
pub use budgets::Budget;
pub use categories::{Category, CategoryKind};
pub use commands::{
    RecordTransactionCmd, SetBudgetCmd, UpdateAccountCmd, UpdateCategoryCmd, UpdateTransactionCmd,
};
pub use error::LedgerError;
pub use money::Money;
pub use ops::{Engine, EngineBuilder};
pub use transactions::{Transaction, TransactionKind};
pub use users::User;

pub mod accounts;
pub mod budgets;
pub mod categories;
mod commands;
mod error;
mod money;
mod ops;
pub mod transactions;
pub mod users;

type ResultLedger<T> = Result<T, LedgerError>;
