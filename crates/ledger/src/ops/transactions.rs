use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    LedgerError, RecordTransactionCmd, ResultLedger, Transaction, UpdateTransactionCmd, categories,
    transactions,
};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Records a transaction.
    ///
    /// For a categorized transaction the call is one critical section per
    /// (user, category) pair: the budget row is read (or created), the cap
    /// checked, and the transaction plus the new accumulated total persisted
    /// as a single DB transaction. Either both rows are visible afterwards
    /// or neither is.
    pub async fn record_transaction(
        &self,
        cmd: RecordTransactionCmd,
    ) -> ResultLedger<Transaction> {
        if !cmd.amount.is_positive() {
            return Err(LedgerError::InvalidArgument(
                "amount must be > 0".to_string(),
            ));
        }
        let description = normalize_optional_text(cmd.description.as_deref());

        let Some(category_id) = cmd.category_id else {
            // No category, no accumulation: plain ownership-checked insert.
            return with_tx!(self, |db_tx| {
                self.require_account(&db_tx, cmd.user_id, cmd.account_id)
                    .await?;
                let model = self.insert_transaction(&db_tx, &cmd, description).await?;
                Transaction::try_from(model)
            });
        };

        let guard = self.budget_guard(cmd.user_id, category_id);
        let _held = guard.lock().await;

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, cmd.user_id, cmd.account_id)
                .await?;
            let category = self
                .require_category(&db_tx, cmd.user_id, category_id)
                .await?;

            let budget = self
                .budget_row_or_default(&db_tx, cmd.user_id, category_id)
                .await?;
            let candidate_total = budget.total_amount + cmd.amount.cents();
            if budget.budget_amount > 0 && candidate_total > budget.budget_amount {
                return Err(LedgerError::BudgetExceeded(category.name));
            }

            let model = self.insert_transaction(&db_tx, &cmd, description).await?;
            self.write_total(&db_tx, budget.id, candidate_total).await?;
            Transaction::try_from(model)
        })
    }

    /// Updates amount, date and/or description of an owned transaction.
    ///
    /// An amount change re-aims the budget accumulator by the delta
    /// (`total - old + new`) and re-checks the cap against the adjusted
    /// total. Account, category and type never change here.
    pub async fn update_transaction(
        &self,
        user_id: i64,
        transaction_id: i64,
        cmd: UpdateTransactionCmd,
    ) -> ResultLedger<Transaction> {
        if cmd.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "no fields to update".to_string(),
            ));
        }
        if let Some(amount) = cmd.amount
            && !amount.is_positive()
        {
            return Err(LedgerError::InvalidArgument(
                "amount must be > 0".to_string(),
            ));
        }

        // The category is immutable through updates, so it is safe to read
        // the lock key before taking the guard.
        let head = self.require_transaction_row(&self.database, user_id, transaction_id).await?;

        let Some(category_id) = head.category_id else {
            return with_tx!(self, |db_tx| {
                let model = self
                    .require_transaction_row(&db_tx, user_id, transaction_id)
                    .await?;
                let model = self.apply_patch(&db_tx, model, &cmd).await?;
                Transaction::try_from(model)
            });
        };

        let guard = self.budget_guard(user_id, category_id);
        let _held = guard.lock().await;

        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction_row(&db_tx, user_id, transaction_id)
                .await?;

            if let Some(new_amount) = cmd.amount
                && new_amount.cents() != model.amount
                && let Some(budget) = self.budget_row(&db_tx, user_id, category_id).await?
            {
                let new_total = budget.total_amount - model.amount + new_amount.cents();
                if budget.budget_amount > 0 && new_total > budget.budget_amount {
                    let name = self.category_label(&db_tx, category_id).await?;
                    return Err(LedgerError::BudgetExceeded(name));
                }
                self.write_total(&db_tx, budget.id, new_total).await?;
            }

            let model = self.apply_patch(&db_tx, model, &cmd).await?;
            Transaction::try_from(model)
        })
    }

    /// Deletes an owned transaction, reversing its budget accumulation.
    ///
    /// A missing budget row (the transaction predates budget tracking) skips
    /// the adjustment but still deletes the row. The total is not clamped: a
    /// negative result is stored as-is and logged, since it signals an
    /// accumulator breach somewhere upstream.
    pub async fn delete_transaction(
        &self,
        user_id: i64,
        transaction_id: i64,
    ) -> ResultLedger<()> {
        let head = self.require_transaction_row(&self.database, user_id, transaction_id).await?;

        let Some(category_id) = head.category_id else {
            return with_tx!(self, |db_tx| {
                let model = self
                    .require_transaction_row(&db_tx, user_id, transaction_id)
                    .await?;
                let active: transactions::ActiveModel = model.into();
                active.delete(&db_tx).await?;
                Ok(())
            });
        };

        let guard = self.budget_guard(user_id, category_id);
        let _held = guard.lock().await;

        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction_row(&db_tx, user_id, transaction_id)
                .await?;

            if let Some(budget) = self.budget_row(&db_tx, user_id, category_id).await? {
                let new_total = budget.total_amount - model.amount;
                if new_total < 0 {
                    tracing::warn!(
                        user_id,
                        category_id,
                        new_total,
                        "budget total went negative after transaction delete"
                    );
                }
                self.write_total(&db_tx, budget.id, new_total).await?;
            }

            let active: transactions::ActiveModel = model.into();
            active.delete(&db_tx).await?;
            Ok(())
        })
    }

    /// Lists the caller's transactions, newest date first.
    pub async fn transactions(
        &self,
        user_id: i64,
        limit: Option<u64>,
    ) -> ResultLedger<Vec<Transaction>> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::Id);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let models = query.all(&self.database).await?;
        models.into_iter().map(Transaction::try_from).collect()
    }

    /// Returns one owned transaction.
    pub async fn transaction(
        &self,
        user_id: i64,
        transaction_id: i64,
    ) -> ResultLedger<Transaction> {
        let model = self.require_transaction_row(&self.database, user_id, transaction_id).await?;
        Transaction::try_from(model)
    }

    async fn insert_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &RecordTransactionCmd,
        description: Option<String>,
    ) -> ResultLedger<transactions::Model> {
        let now = Utc::now();
        transactions::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(cmd.user_id),
            account_id: ActiveValue::Set(cmd.account_id),
            category_id: ActiveValue::Set(cmd.category_id),
            kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
            amount: ActiveValue::Set(cmd.amount.cents()),
            date: ActiveValue::Set(cmd.date),
            description: ActiveValue::Set(description),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(db_tx)
        .await
        .map_err(Into::into)
    }

    async fn apply_patch(
        &self,
        db_tx: &DatabaseTransaction,
        model: transactions::Model,
        cmd: &UpdateTransactionCmd,
    ) -> ResultLedger<transactions::Model> {
        let mut active: transactions::ActiveModel = model.into();
        if let Some(amount) = cmd.amount {
            active.amount = ActiveValue::Set(amount.cents());
        }
        if let Some(date) = cmd.date {
            active.date = ActiveValue::Set(date);
        }
        if let Some(description) = cmd.description.as_deref() {
            active.description = ActiveValue::Set(normalize_optional_text(Some(description)));
        }
        active.updated_at = ActiveValue::Set(Utc::now());
        active.update(db_tx).await.map_err(Into::into)
    }

    async fn require_transaction_row<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        transaction_id: i64,
    ) -> ResultLedger<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::NotFound("transaction not exists".to_string()))
    }

    async fn category_label(
        &self,
        db_tx: &DatabaseTransaction,
        category_id: i64,
    ) -> ResultLedger<String> {
        let name = categories::Entity::find_by_id(category_id)
            .one(db_tx)
            .await?
            .map(|model| model.name);
        Ok(name.unwrap_or_else(|| format!("category {category_id}")))
    }
}
