use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sea_orm::DatabaseConnection;

use crate::{LedgerError, ResultLedger};

mod accounts;
mod budgets;
mod categories;
mod transactions;
mod users;

/// Run a block inside a DB transaction, committing on success. On error the
/// transaction is dropped, which rolls it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Per-(user, category) mutual exclusion for the budget accumulator.
///
/// Every read-modify-write of `budgets.total_amount` holds the key's guard
/// across the whole DB transaction, so concurrent operations on the same
/// pair serialize while unrelated pairs proceed independently.
#[derive(Debug, Default)]
struct BudgetLocks {
    inner: Mutex<HashMap<(i64, i64), Arc<tokio::sync::Mutex<()>>>>,
}

impl BudgetLocks {
    fn lock_for(&self, user_id: i64, category_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut table = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        table
            .entry((user_id, category_id))
            .or_default()
            .clone()
    }
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    budget_locks: BudgetLocks,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(super) fn budget_guard(
        &self,
        user_id: i64,
        category_id: i64,
    ) -> Arc<tokio::sync::Mutex<()>> {
        self.budget_locks.lock_for(user_id, category_id)
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultLedger<String> {
    use unicode_normalization::UnicodeNormalization;

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidArgument(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.nfc().collect())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
            budget_locks: BudgetLocks::default(),
        }
    }
}
