use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, SqlErr, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Money, NewPlanCmd, Plan, PlanPatch, PlanSpending, Reconciled, ResultEngine,
    categories, plans, util::normalize_optional_text,
};

use super::{Engine, reconcile::expense_total, with_tx};

/// Maps the `(owner_id, category_id)` unique index to `DuplicatePlan`.
///
/// The explicit check before writing catches the common case; the index
/// catches two writers racing for the same category.
fn map_unique_violation(err: DbErr, category_name: &str) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            EngineError::DuplicatePlan(category_name.to_string())
        }
        _ => err.into(),
    }
}

impl Engine {
    /// Creates a budget for a category and computes its first remaining
    /// amount from the expenses already recorded there.
    pub async fn create_plan(&self, cmd: NewPlanCmd) -> ResultEngine<Reconciled<Plan>> {
        let cap = cmd.cap.require_positive("cap")?;
        let description = normalize_optional_text(cmd.description.as_deref());
        let owner_id = cmd.owner_id.as_str();

        let plan = with_tx!(self, |db_tx| {
            let category = Self::resolve_category(&db_tx, owner_id, cmd.category_id).await?;
            Self::ensure_category_unbudgeted(&db_tx, owner_id, &category).await?;

            let now = Utc::now();
            let model = plans::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                owner_id: ActiveValue::Set(owner_id.to_string()),
                category_id: ActiveValue::Set(category.id),
                cap_minor: ActiveValue::Set(cap.cents()),
                remaining_minor: ActiveValue::Set(cap.cents()),
                description: ActiveValue::Set(description),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| map_unique_violation(err, &category.name))?;
            Ok::<_, EngineError>(Plan::from_models(model, Some(category)))
        })?;
        tracing::info!(owner_id, plan_id = %plan.id, "created plan for {} capped at {cap}", plan.category_name);

        Ok(self.reconcile_plan(plan).await)
    }

    /// Applies `patch` to a plan.
    ///
    /// Moving the plan to another category or changing its cap recomputes the
    /// remaining amount for the resulting category. The category the plan
    /// left has no plan anymore and needs no recompute.
    pub async fn update_plan(
        &self,
        owner_id: &str,
        plan_id: Uuid,
        patch: PlanPatch,
    ) -> ResultEngine<Reconciled<Plan>> {
        let cap = patch.cap.map(|cap| cap.require_positive("cap")).transpose()?;
        let affects_balance = patch.affects_balance();

        let plan = with_tx!(self, |db_tx| {
            let model = Self::require_owned_plan(&db_tx, owner_id, plan_id).await?;

            let category = match patch.category_id {
                Some(category_id) if category_id != model.category_id => {
                    let category = Self::resolve_category(&db_tx, owner_id, category_id).await?;
                    Self::ensure_category_unbudgeted(&db_tx, owner_id, &category).await?;
                    category
                }
                _ => Self::resolve_category(&db_tx, owner_id, model.category_id).await?,
            };

            let new_cap = cap.unwrap_or(Money::new(model.cap_minor));
            let remaining = Money::new(model.remaining_minor).min(new_cap);

            let mut active: plans::ActiveModel = model.into();
            active.category_id = ActiveValue::Set(category.id);
            active.cap_minor = ActiveValue::Set(new_cap.cents());
            active.remaining_minor = ActiveValue::Set(remaining.cents());
            if let Some(description) = patch.description {
                active.description =
                    ActiveValue::Set(normalize_optional_text(description.as_deref()));
            }
            active.updated_at = ActiveValue::Set(Utc::now());

            let model = active
                .update(&db_tx)
                .await
                .map_err(|err| map_unique_violation(err, &category.name))?;
            Ok::<_, EngineError>(Plan::from_models(model, Some(category)))
        })?;

        if affects_balance {
            Ok(self.reconcile_plan(plan).await)
        } else {
            Ok(Reconciled::clean(plan))
        }
    }

    pub async fn delete_plan(&self, owner_id: &str, plan_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = Self::require_owned_plan(&db_tx, owner_id, plan_id).await?;
            plans::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            tracing::info!(owner_id, %plan_id, "deleted plan");
            Ok(())
        })
    }

    pub async fn plan(&self, owner_id: &str, plan_id: Uuid) -> ResultEngine<Plan> {
        let (model, category) = plans::Entity::find_by_id(plan_id)
            .filter(plans::Column::OwnerId.eq(owner_id.to_string()))
            .find_also_related(categories::Entity)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("plan not exists".to_string()))?;
        Ok(Plan::from_models(model, category))
    }

    /// Lists the owner's plans, newest first.
    pub async fn list_plans(&self, owner_id: &str) -> ResultEngine<Vec<Plan>> {
        Ok(plans::Entity::find()
            .filter(plans::Column::OwnerId.eq(owner_id.to_string()))
            .order_by_desc(plans::Column::CreatedAt)
            .find_also_related(categories::Entity)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|(model, category)| Plan::from_models(model, category))
            .collect())
    }

    /// Compares the plan's cap with the live expense total of its category.
    ///
    /// Read-only: the stored remaining amount is not touched.
    pub async fn plan_spending(&self, owner_id: &str, plan_id: Uuid) -> ResultEngine<PlanSpending> {
        let model = Self::require_owned_plan(&self.database, owner_id, plan_id).await?;
        let cap = Money::new(model.cap_minor);
        let spent = expense_total(&self.database, owner_id, model.category_id).await?;
        Ok(PlanSpending {
            plan_id: model.id,
            cap,
            spent,
            remaining: cap.floored_sub(spent),
            over_budget: spent > cap,
        })
    }
}
