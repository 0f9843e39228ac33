use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{Account, LedgerError, Money, ResultLedger, UpdateAccountCmd, accounts, transactions};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Creates an account. Names are unique within the owner's accounts.
    pub async fn new_account(
        &self,
        user_id: i64,
        name: &str,
        balance: Option<Money>,
    ) -> ResultLedger<Account> {
        let name = normalize_required_name(name, "account")?;

        with_tx!(self, |db_tx| {
            if self
                .account_name_taken(&db_tx, user_id, &name, None)
                .await?
            {
                return Err(LedgerError::Conflict(format!(
                    "account name {name:?} already taken"
                )));
            }

            let now = Utc::now();
            let model = accounts::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(user_id),
                account_name: ActiveValue::Set(name.clone()),
                account_balance: ActiveValue::Set(balance.map(Money::cents)),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            Ok(Account::from(model))
        })
    }

    /// Lists the caller's accounts.
    pub async fn accounts(&self, user_id: i64) -> ResultLedger<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .order_by_asc(accounts::Column::AccountName)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Account::from).collect())
    }

    /// Returns one owned account.
    pub async fn account(&self, user_id: i64, account_id: i64) -> ResultLedger<Account> {
        let model = accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("account not exists".to_string()))?;
        Ok(Account::from(model))
    }

    /// Updates name and/or balance of an owned account.
    pub async fn update_account(
        &self,
        user_id: i64,
        account_id: i64,
        cmd: UpdateAccountCmd,
    ) -> ResultLedger<Account> {
        with_tx!(self, |db_tx| {
            let model = accounts::Entity::find_by_id(account_id)
                .filter(accounts::Column::UserId.eq(user_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| LedgerError::NotFound("account not exists".to_string()))?;

            let mut active: accounts::ActiveModel = model.into();
            if let Some(name) = cmd.account_name.as_deref() {
                let name = normalize_required_name(name, "account")?;
                if self
                    .account_name_taken(&db_tx, user_id, &name, Some(account_id))
                    .await?
                {
                    return Err(LedgerError::Conflict(format!(
                        "account name {name:?} already taken"
                    )));
                }
                active.account_name = ActiveValue::Set(name);
            }
            if let Some(balance) = cmd.account_balance {
                active.account_balance = ActiveValue::Set(Some(balance.cents()));
            }
            active.updated_at = ActiveValue::Set(Utc::now());

            let model = active.update(&db_tx).await?;
            Ok(Account::from(model))
        })
    }

    /// Deletes an owned account.
    ///
    /// Rejected with `Conflict` while any transaction still references the
    /// account; callers must delete or move those first.
    pub async fn delete_account(&self, user_id: i64, account_id: i64) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let model = accounts::Entity::find_by_id(account_id)
                .filter(accounts::Column::UserId.eq(user_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| LedgerError::NotFound("account not exists".to_string()))?;

            let dependent = transactions::Entity::find()
                .filter(transactions::Column::AccountId.eq(account_id))
                .one(&db_tx)
                .await?;
            if dependent.is_some() {
                return Err(LedgerError::Conflict(
                    "account has transactions and cannot be deleted".to_string(),
                ));
            }

            let active: accounts::ActiveModel = model.into();
            active.delete(&db_tx).await?;
            Ok(())
        })
    }

    pub(super) async fn require_account(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        account_id: i64,
    ) -> ResultLedger<accounts::Model> {
        accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::UserId.eq(user_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| LedgerError::NotFound("account not exists".to_string()))
    }

    async fn account_name_taken(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        name: &str,
        exclude_id: Option<i64>,
    ) -> ResultLedger<bool> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::AccountName.eq(name));
        if let Some(id) = exclude_id {
            query = query.filter(accounts::Column::Id.ne(id));
        }
        Ok(query.one(db_tx).await?.is_some())
    }
}
