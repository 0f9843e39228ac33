use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{LedgerError, ResultLedger, User, users};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Registers a new user.
    ///
    /// `password_hash` is stored opaquely; hashing happens at the HTTP
    /// boundary. Emails are lowercased and must be unique.
    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> ResultLedger<User> {
        let name = normalize_required_name(name, "user")?;
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(LedgerError::InvalidArgument(format!(
                "invalid email: {email:?}"
            )));
        }

        with_tx!(self, |db_tx| {
            let existing = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(LedgerError::Conflict(format!(
                    "email {email} already registered"
                )));
            }

            let now = Utc::now();
            let model = users::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name.clone()),
                email: ActiveValue::Set(email.clone()),
                password_hash: ActiveValue::Set(password_hash.to_string()),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            Ok(User::from(model))
        })
    }

    /// Returns a user identity by id.
    pub async fn user(&self, user_id: i64) -> ResultLedger<User> {
        let model = users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("user not exists".to_string()))?;
        Ok(User::from(model))
    }
}
