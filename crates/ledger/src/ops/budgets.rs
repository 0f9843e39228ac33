use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, Statement,
    TransactionTrait, prelude::*,
};

use crate::{Budget, LedgerError, ResultLedger, SetBudgetCmd, budgets};

use super::{Engine, with_tx};

impl Engine {
    /// Creates or replaces the spending cap for an owned live category.
    ///
    /// Creating a budget row late (after transactions already exist for the
    /// pair) backfills `total_amount` from the stored transactions, so the
    /// cap is checked against reality from the first record call onwards.
    /// Updating never touches the accumulated total.
    ///
    /// Returns the budget and whether a new row was created.
    pub async fn set_budget(&self, cmd: SetBudgetCmd) -> ResultLedger<(Budget, bool)> {
        if cmd.budget_amount.is_negative() {
            return Err(LedgerError::InvalidArgument(
                "budget_amount must be >= 0".to_string(),
            ));
        }

        let guard = self.budget_guard(cmd.user_id, cmd.category_id);
        let _held = guard.lock().await;

        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, cmd.user_id, cmd.category_id)
                .await?;

            let existing = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(cmd.user_id))
                .filter(budgets::Column::CategoryId.eq(cmd.category_id))
                .one(&db_tx)
                .await?;

            match existing {
                Some(model) => {
                    let mut active: budgets::ActiveModel = model.into();
                    active.budget_amount = ActiveValue::Set(cmd.budget_amount.cents());
                    active.updated_at = ActiveValue::Set(Utc::now());
                    let model = active.update(&db_tx).await?;
                    Ok((Budget::from_model(model), false))
                }
                None => {
                    let total = self
                        .accumulated_total(&db_tx, cmd.user_id, cmd.category_id)
                        .await?;
                    let now = Utc::now();
                    let model = budgets::ActiveModel {
                        id: ActiveValue::NotSet,
                        user_id: ActiveValue::Set(cmd.user_id),
                        category_id: ActiveValue::Set(Some(cmd.category_id)),
                        budget_amount: ActiveValue::Set(cmd.budget_amount.cents()),
                        total_amount: ActiveValue::Set(total),
                        created_at: ActiveValue::Set(now),
                        updated_at: ActiveValue::Set(now),
                    }
                    .insert(&db_tx)
                    .await?;
                    Ok((Budget::from_model(model), true))
                }
            }
        })
    }

    /// Lists the caller's budgets, newest first.
    pub async fn budgets(&self, user_id: i64) -> ResultLedger<Vec<Budget>> {
        let models = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .order_by_desc(budgets::Column::CreatedAt)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Budget::from_model).collect())
    }

    /// Returns the budget row for an owned (user, category) pair.
    pub async fn budget(&self, user_id: i64, category_id: i64) -> ResultLedger<Budget> {
        let model = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .filter(budgets::Column::CategoryId.eq(category_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("budget not exists".to_string()))?;
        Ok(Budget::from_model(model))
    }

    /// Finds the budget row for a pair, creating it with `{budget_amount: 0,
    /// total_amount: 0}` when absent. Callers must hold the pair's guard.
    pub(super) async fn budget_row_or_default(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        category_id: i64,
    ) -> ResultLedger<budgets::Model> {
        let existing = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .filter(budgets::Column::CategoryId.eq(category_id))
            .one(db_tx)
            .await?;
        if let Some(model) = existing {
            return Ok(model);
        }

        let now = Utc::now();
        let model = budgets::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            category_id: ActiveValue::Set(Some(category_id)),
            budget_amount: ActiveValue::Set(0),
            total_amount: ActiveValue::Set(0),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(db_tx)
        .await?;
        Ok(model)
    }

    /// Finds the budget row for a pair without creating one.
    pub(super) async fn budget_row(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        category_id: i64,
    ) -> ResultLedger<Option<budgets::Model>> {
        budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .filter(budgets::Column::CategoryId.eq(category_id))
            .one(db_tx)
            .await
            .map_err(Into::into)
    }

    /// Writes a new accumulated total on a budget row.
    pub(super) async fn write_total(
        &self,
        db_tx: &DatabaseTransaction,
        budget_id: i64,
        new_total: i64,
    ) -> ResultLedger<()> {
        let active = budgets::ActiveModel {
            id: ActiveValue::Set(budget_id),
            total_amount: ActiveValue::Set(new_total),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        active.update(db_tx).await?;
        Ok(())
    }

    /// Sums the stored transaction amounts for a pair.
    async fn accumulated_total(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        category_id: i64,
    ) -> ResultLedger<i64> {
        let backend = db_tx.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount), 0) AS sum \
             FROM transactions \
             WHERE user_id = ? AND category_id = ?",
            vec![user_id.into(), category_id.into()],
        );
        let row = db_tx.query_one(stmt).await?;
        Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
    }
}
