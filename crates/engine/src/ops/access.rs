//! Owner-scoped lookups shared by the stores.
//!
//! Every read goes through the owner filter: a row owned by someone else is
//! reported exactly like a missing one.

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, categories, plans, transactions};

use super::Engine;

/// Generates `find_owned_*` and `require_owned_*` functions for an entity
/// keyed by `Uuid` and scoped by an `owner_id` column.
macro_rules! impl_owned_lookup {
    ($find_fn:ident, $require_fn:ident, $entity:path, $model:path, $owner_col:expr, $err_msg:literal) => {
        pub(super) async fn $find_fn<C: ConnectionTrait>(
            db: &C,
            owner_id: &str,
            id: Uuid,
        ) -> ResultEngine<Option<$model>> {
            <$entity>::find_by_id(id)
                .filter($owner_col.eq(owner_id.to_string()))
                .one(db)
                .await
                .map_err(Into::into)
        }

        pub(super) async fn $require_fn<C: ConnectionTrait>(
            db: &C,
            owner_id: &str,
            id: Uuid,
        ) -> ResultEngine<$model> {
            Self::$find_fn(db, owner_id, id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_owned_lookup!(
        find_owned_category,
        require_owned_category,
        categories::Entity,
        categories::Model,
        categories::Column::OwnerId,
        "category not exists"
    );

    impl_owned_lookup!(
        find_owned_transaction,
        require_owned_transaction,
        transactions::Entity,
        transactions::Model,
        transactions::Column::OwnerId,
        "transaction not exists"
    );

    impl_owned_lookup!(
        find_owned_plan,
        require_owned_plan,
        plans::Entity,
        plans::Model,
        plans::Column::OwnerId,
        "plan not exists"
    );

    /// Resolve a category referenced by another record.
    ///
    /// Unlike [`Engine::require_owned_category`], a miss is a foreign-key
    /// problem of the caller's input and maps to `CategoryNotFound`.
    pub(super) async fn resolve_category<C: ConnectionTrait>(
        db: &C,
        owner_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        Self::find_owned_category(db, owner_id, category_id)
            .await?
            .ok_or_else(|| EngineError::CategoryNotFound(category_id.to_string()))
    }

    /// The plan budgeting `category_id` for `owner_id`, if any.
    pub(super) async fn plan_for_category<C: ConnectionTrait>(
        db: &C,
        owner_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<Option<plans::Model>> {
        plans::Entity::find()
            .filter(plans::Column::OwnerId.eq(owner_id.to_string()))
            .filter(plans::Column::CategoryId.eq(category_id))
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn ensure_category_unbudgeted<C: ConnectionTrait>(
        db: &C,
        owner_id: &str,
        category: &categories::Model,
    ) -> ResultEngine<()> {
        if Self::plan_for_category(db, owner_id, category.id)
            .await?
            .is_some()
        {
            return Err(EngineError::DuplicatePlan(category.name.clone()));
        }
        Ok(())
    }
}
