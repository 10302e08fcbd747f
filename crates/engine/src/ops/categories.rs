use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Category, CategoryPatch, EngineError, NewCategoryCmd, ResultEngine, TransactionKind,
    categories, plans, transactions,
    util::{normalize_display_name, normalize_name_key, normalize_optional_text},
};

use super::{Engine, with_tx};

fn parse_category_kind(kind: Option<&str>) -> ResultEngine<Option<TransactionKind>> {
    kind.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(TransactionKind::try_from)
        .transpose()
}

async fn name_taken<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    name_norm: &str,
    except: Option<Uuid>,
) -> ResultEngine<bool> {
    let mut select = categories::Entity::find()
        .filter(categories::Column::OwnerId.eq(owner_id.to_string()))
        .filter(categories::Column::NameNorm.eq(name_norm.to_string()));
    if let Some(id) = except {
        select = select.filter(categories::Column::Id.ne(id));
    }
    Ok(select.count(db).await? > 0)
}

/// Fails with `ExistingKey` when another category of `owner_id` already uses
/// the normalized name.
async fn ensure_name_free<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    name_norm: &str,
    display: &str,
    except: Option<Uuid>,
) -> ResultEngine<()> {
    if name_taken(db, owner_id, name_norm, except).await? {
        return Err(EngineError::ExistingKey(display.to_string()));
    }
    Ok(())
}

impl Engine {
    pub async fn create_category(&self, cmd: NewCategoryCmd) -> ResultEngine<Category> {
        let display = normalize_display_name(&cmd.name, "category")?;
        let name_norm = normalize_name_key(&display)?;
        let kind = parse_category_kind(cmd.kind.as_deref())?;
        let description = normalize_optional_text(cmd.description.as_deref());
        let owner_id = cmd.owner_id.as_str();

        let model = with_tx!(self, |db_tx| {
            ensure_name_free(&db_tx, owner_id, &name_norm, &display, None).await?;
            let active = categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                owner_id: ActiveValue::Set(owner_id.to_string()),
                name: ActiveValue::Set(display.clone()),
                name_norm: ActiveValue::Set(name_norm.clone()),
                kind: ActiveValue::Set(kind.map(|k| k.as_str().to_string())),
                description: ActiveValue::Set(description),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = active.insert(&db_tx).await?;
            Ok::<_, EngineError>(model)
        })?;
        tracing::debug!(owner_id, category_id = %model.id, "created category {}", model.name);
        Category::try_from(model)
    }

    /// Lists the owner's categories by name, optionally restricted to `kind`.
    pub async fn list_categories(
        &self,
        owner_id: &str,
        kind: Option<TransactionKind>,
    ) -> ResultEngine<Vec<Category>> {
        let mut select = categories::Entity::find()
            .filter(categories::Column::OwnerId.eq(owner_id.to_string()));
        if let Some(kind) = kind {
            select = select.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        select
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    pub async fn category(&self, owner_id: &str, category_id: Uuid) -> ResultEngine<Category> {
        let model = Self::require_owned_category(&self.database, owner_id, category_id).await?;
        Category::try_from(model)
    }

    /// Renames or re-describes a category. Plans and transactions keep
    /// referencing it by id, so nothing needs reconciling.
    pub async fn update_category(
        &self,
        owner_id: &str,
        category_id: Uuid,
        patch: CategoryPatch,
    ) -> ResultEngine<Category> {
        let renamed = patch
            .name
            .as_deref()
            .map(|name| -> ResultEngine<(String, String)> {
                let display = normalize_display_name(name, "category")?;
                let name_norm = normalize_name_key(&display)?;
                Ok((display, name_norm))
            })
            .transpose()?;
        let kind = patch
            .kind
            .as_ref()
            .map(|kind| parse_category_kind(kind.as_deref()))
            .transpose()?;

        let model = with_tx!(self, |db_tx| {
            let model = Self::require_owned_category(&db_tx, owner_id, category_id).await?;
            if patch.is_empty() {
                return Category::try_from(model);
            }

            let mut active: categories::ActiveModel = model.into();
            if let Some((display, name_norm)) = renamed {
                ensure_name_free(&db_tx, owner_id, &name_norm, &display, Some(category_id))
                    .await?;
                active.name = ActiveValue::Set(display);
                active.name_norm = ActiveValue::Set(name_norm);
            }
            if let Some(kind) = kind {
                active.kind = ActiveValue::Set(kind.map(|k| k.as_str().to_string()));
            }
            if let Some(description) = patch.description {
                active.description =
                    ActiveValue::Set(normalize_optional_text(description.as_deref()));
            }
            let model = active.update(&db_tx).await?;
            Ok::<_, EngineError>(model)
        })?;
        Category::try_from(model)
    }

    /// Deletes a category nothing references anymore.
    pub async fn delete_category(&self, owner_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = Self::require_owned_category(&db_tx, owner_id, category_id).await?;

            let used_by_transactions = transactions::Entity::find()
                .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
                .filter(transactions::Column::CategoryId.eq(category_id))
                .count(&db_tx)
                .await?;
            let used_by_plans = plans::Entity::find()
                .filter(plans::Column::OwnerId.eq(owner_id.to_string()))
                .filter(plans::Column::CategoryId.eq(category_id))
                .count(&db_tx)
                .await?;
            if used_by_transactions > 0 || used_by_plans > 0 {
                return Err(EngineError::CategoryInUse(format!(
                    "{} is referenced by {used_by_transactions} transaction(s) and {used_by_plans} plan(s)",
                    model.name
                )));
            }

            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;
            tracing::debug!(owner_id, %category_id, "deleted category {}", model.name);
            Ok(())
        })
    }

    /// Creates the given default categories for `owner_id`, skipping names
    /// the owner already has.
    pub async fn seed_default_categories(
        &self,
        owner_id: &str,
        names: &[String],
    ) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            Self::seed_in(&db_tx, owner_id, names).await
        })
    }

    pub(super) async fn seed_in(
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        names: &[String],
    ) -> ResultEngine<Vec<Category>> {
        let mut seeded = Vec::with_capacity(names.len());
        for name in names {
            let (display, name_norm) = match normalize_display_name(name, "category")
                .and_then(|display| normalize_name_key(&display).map(|norm| (display, norm)))
            {
                Ok(pair) => pair,
                Err(err) => {
                    tracing::warn!(owner_id, "skipping default category {name:?}: {err}");
                    continue;
                }
            };
            if name_taken(db_tx, owner_id, &name_norm, None).await? {
                continue;
            }

            let model = categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                owner_id: ActiveValue::Set(owner_id.to_string()),
                name: ActiveValue::Set(display),
                name_norm: ActiveValue::Set(name_norm),
                kind: ActiveValue::Set(None),
                description: ActiveValue::Set(None),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(db_tx)
            .await?;
            seeded.push(Category::try_from(model)?);
        }
        tracing::debug!(owner_id, "seeded {} default categories", seeded.len());
        Ok(seeded)
    }
}
