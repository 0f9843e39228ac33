//! The `budgets` table: the authoritative per-(user, category) accumulator.
//!
//! At most one row exists per (user, category) pair. `budget_amount` is the
//! spending cap (0 = unlimited) and `total_amount` the accumulated spend the
//! engine keeps in lockstep with the transactions table.

use sea_orm::entity::prelude::*;

use crate::Money;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    /// Spending cap; 0 means unlimited.
    pub budget_amount: Money,
    /// Accumulated spend over all non-deleted transactions of the pair.
    pub total_amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub budget_amount: i64,
    pub total_amount: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Categories,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Budget {
    /// Maps a stored row; rows with a NULL category (historical data) fall
    /// back to category id 0 and are never matched by engine lookups.
    pub(crate) fn from_model(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id.unwrap_or_default(),
            budget_amount: Money::new(model.budget_amount),
            total_amount: Money::new(model.total_amount),
        }
    }
}
