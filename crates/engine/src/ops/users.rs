use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, NewUserCmd, ProfilePatch, ResultEngine, User, categories, plans, transactions, users,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

impl Engine {
    /// Registers a user and seeds `default_categories` for them in the same
    /// DB transaction.
    pub async fn register_user(
        &self,
        cmd: NewUserCmd,
        default_categories: &[String],
    ) -> ResultEngine<User> {
        let username = cmd.username.trim().to_string();
        if username.is_empty() {
            return Err(EngineError::InvalidCredentials(
                "username must not be empty".to_string(),
            ));
        }
        if cmd.password.is_empty() {
            return Err(EngineError::InvalidCredentials(
                "password must not be empty".to_string(),
            ));
        }
        let name = normalize_optional_text(cmd.name.as_deref());

        let user = with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }

            let model = users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                password: ActiveValue::Set(cmd.password),
                name: ActiveValue::Set(name),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Self::seed_in(&db_tx, &username, default_categories).await?;
            Ok::<_, EngineError>(User::from(model))
        })?;
        tracing::info!(username = %user.username, "registered user");
        Ok(user)
    }

    /// Checks a username/password pair.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<User> {
        match users::Entity::find_by_id(username.to_string())
            .one(&self.database)
            .await?
        {
            Some(model) if model.password == password => Ok(User::from(model)),
            _ => Err(EngineError::Unauthorized),
        }
    }

    /// The user record without its credential.
    pub async fn profile(&self, owner_id: &str) -> ResultEngine<User> {
        users::Entity::find_by_id(owner_id.to_string())
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Applies a profile patch. An empty patch returns the profile unchanged.
    pub async fn update_profile(&self, owner_id: &str, patch: ProfilePatch) -> ResultEngine<User> {
        let Some(name) = patch.name else {
            return self.profile(owner_id).await;
        };
        let name = normalize_optional_text(name.as_deref());

        let user = with_tx!(self, |db_tx| {
            let Some(model) = users::Entity::find_by_id(owner_id.to_string())
                .one(&db_tx)
                .await?
            else {
                return Err(EngineError::KeyNotFound("user not exists".to_string()));
            };
            let mut active: users::ActiveModel = model.into();
            active.name = ActiveValue::Set(name);
            let updated = active.update(&db_tx).await?;
            Ok::<_, EngineError>(User::from(updated))
        })?;
        tracing::info!(owner_id, "updated profile");
        Ok(user)
    }

    /// Removes the user and every row they own.
    ///
    /// Dependents go first: transactions, then plans, then categories.
    pub async fn delete_account(&self, owner_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let Some(user) = users::Entity::find_by_id(owner_id.to_string())
                .one(&db_tx)
                .await?
            else {
                return Err(EngineError::KeyNotFound("user not exists".to_string()));
            };

            let removed_transactions = transactions::Entity::delete_many()
                .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
                .exec(&db_tx)
                .await?
                .rows_affected;
            let removed_plans = plans::Entity::delete_many()
                .filter(plans::Column::OwnerId.eq(owner_id.to_string()))
                .exec(&db_tx)
                .await?
                .rows_affected;
            let removed_categories = categories::Entity::delete_many()
                .filter(categories::Column::OwnerId.eq(owner_id.to_string()))
                .exec(&db_tx)
                .await?
                .rows_affected;
            users::Entity::delete_by_id(user.username).exec(&db_tx).await?;

            tracing::info!(
                owner_id,
                removed_transactions,
                removed_plans,
                removed_categories,
                "deleted account"
            );
            Ok(())
        })
    }
}
