use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Category, CategoryKind, LedgerError, ResultLedger, UpdateCategoryCmd, categories,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Creates a category. Names are unique among the owner's live
    /// categories; tombstoned names can be reused.
    pub async fn new_category(
        &self,
        user_id: i64,
        name: &str,
        kind: CategoryKind,
        sort_order: i32,
        description: Option<&str>,
    ) -> ResultLedger<Category> {
        let name = normalize_required_name(name, "category")?;

        with_tx!(self, |db_tx| {
            if self
                .category_name_taken(&db_tx, user_id, &name, None)
                .await?
            {
                return Err(LedgerError::Conflict(format!(
                    "category name {name:?} already taken"
                )));
            }

            let now = Utc::now();
            let model = categories::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(user_id),
                name: ActiveValue::Set(name.clone()),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                sort_order: ActiveValue::Set(sort_order),
                description: ActiveValue::Set(normalize_optional_text(description)),
                deleted_at: ActiveValue::Set(None),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            Category::try_from(model)
        })
    }

    /// Lists the caller's live categories, highest `sort_order` first.
    pub async fn categories(&self, user_id: i64) -> ResultLedger<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::DeletedAt.is_null())
            .order_by_desc(categories::Column::SortOrder)
            .order_by_desc(categories::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Category::try_from).collect()
    }

    /// Returns one owned live category.
    pub async fn category(&self, user_id: i64, category_id: i64) -> ResultLedger<Category> {
        let model = categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::DeletedAt.is_null())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }

    /// Updates name, sort order and/or description of an owned category.
    pub async fn update_category(
        &self,
        user_id: i64,
        category_id: i64,
        cmd: UpdateCategoryCmd,
    ) -> ResultLedger<Category> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, user_id, category_id).await?;

            let mut active: categories::ActiveModel = model.into();
            if let Some(name) = cmd.name.as_deref() {
                let name = normalize_required_name(name, "category")?;
                if self
                    .category_name_taken(&db_tx, user_id, &name, Some(category_id))
                    .await?
                {
                    return Err(LedgerError::Conflict(format!(
                        "category name {name:?} already taken"
                    )));
                }
                active.name = ActiveValue::Set(name);
            }
            if let Some(sort_order) = cmd.sort_order {
                active.sort_order = ActiveValue::Set(sort_order);
            }
            if let Some(description) = cmd.description.as_deref() {
                active.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }
            active.updated_at = ActiveValue::Set(Utc::now());

            let model = active.update(&db_tx).await?;
            Category::try_from(model)
        })
    }

    /// Soft-deletes an owned category.
    ///
    /// The row is tombstoned, not removed: existing transactions keep their
    /// attribution and the budget row stays readable. New transactions and
    /// budget changes treat the category as absent.
    pub async fn delete_category(&self, user_id: i64, category_id: i64) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, user_id, category_id).await?;

            let now = Utc::now();
            let mut active: categories::ActiveModel = model.into();
            active.deleted_at = ActiveValue::Set(Some(now));
            active.updated_at = ActiveValue::Set(now);
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Looks up a live category owned by `user_id`, as required by every
    /// budget-touching operation.
    pub(super) async fn require_category(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        category_id: i64,
    ) -> ResultLedger<categories::Model> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::DeletedAt.is_null())
            .one(db_tx)
            .await?
            .ok_or_else(|| LedgerError::NotFound("category not exists".to_string()))
    }

    async fn category_name_taken(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        name: &str,
        exclude_id: Option<i64>,
    ) -> ResultLedger<bool> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Name.eq(name))
            .filter(categories::Column::DeletedAt.is_null());
        if let Some(id) = exclude_id {
            query = query.filter(categories::Column::Id.ne(id));
        }
        Ok(query.one(db_tx).await?.is_some())
    }
}
