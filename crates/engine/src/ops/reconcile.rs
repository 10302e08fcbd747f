//! Plan reconciliation.
//!
//! A plan's `remaining` is a projection of the ledger:
//!
//! ```text
//! remaining = max(0, cap - Σ expense amounts in (owner, category))
//! ```
//!
//! It is recomputed from stored rows after every mutation that can move it,
//! never adjusted incrementally, so repeated runs converge on the same value
//! and a transaction is never counted against two plans.
//!
//! Reconciliation runs after the triggering mutation has committed. A failure
//! here never turns a successful mutation into an error: it is logged and
//! handed back next to the result as a [`ReconciliationFailure`].

use std::fmt;

use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, QueryFilter, QuerySelect,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Money, Plan, ResultEngine, TransactionKind, categories, plans, transactions,
};

use super::{Engine, with_tx};

/// A recompute that could not complete for `(owner_id, category_id)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciliationFailure {
    pub owner_id: String,
    pub category_id: Uuid,
    pub reason: String,
}

impl fmt::Display for ReconciliationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reconciliation of category {} for {} failed: {}",
            self.category_id, self.owner_id, self.reason
        )
    }
}

/// The result of a committed mutation plus any reconciliation that failed
/// after it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Reconciled<T> {
    pub value: T,
    pub failures: Vec<ReconciliationFailure>,
}

impl<T> Reconciled<T> {
    pub(crate) fn clean(value: T) -> Self {
        Self {
            value,
            failures: Vec::new(),
        }
    }

    /// `true` when every triggered recompute succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl Engine {
    /// Recomputes the remaining amount of the plan budgeting `category_id`.
    ///
    /// Returns `Ok(None)` when the category has no plan. Lookup, sum and write
    /// share one DB transaction so the result matches a single snapshot.
    pub async fn recompute_plan(
        &self,
        owner_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<Option<Plan>> {
        with_tx!(self, |db_tx| {
            recompute_in(&db_tx, owner_id, category_id).await
        })
    }

    /// Recomputes every distinct category in `category_ids`, collecting
    /// failures instead of returning them.
    pub(super) async fn reconcile_categories<T>(
        &self,
        owner_id: &str,
        category_ids: impl IntoIterator<Item = Uuid>,
        value: T,
    ) -> Reconciled<T> {
        let mut seen: Vec<Uuid> = Vec::new();
        let mut failures = Vec::new();
        for category_id in category_ids {
            if seen.contains(&category_id) {
                continue;
            }
            seen.push(category_id);
            if let Err(err) = self.recompute_plan(owner_id, category_id).await {
                failures.push(record_failure(owner_id, category_id, &err));
            }
        }
        Reconciled { value, failures }
    }

    /// Recomputes `plan` and returns it with the fresh remaining amount, or
    /// unchanged alongside the failure.
    pub(super) async fn reconcile_plan(&self, plan: Plan) -> Reconciled<Plan> {
        match self.recompute_plan(&plan.owner_id, plan.category_id).await {
            Ok(Some(fresh)) => Reconciled::clean(fresh),
            Ok(None) => Reconciled::clean(plan),
            Err(err) => {
                let failure = record_failure(&plan.owner_id, plan.category_id, &err);
                Reconciled {
                    value: plan,
                    failures: vec![failure],
                }
            }
        }
    }
}

fn record_failure(owner_id: &str, category_id: Uuid, err: &EngineError) -> ReconciliationFailure {
    tracing::warn!(
        owner_id,
        %category_id,
        "plan reconciliation failed: {err}"
    );
    ReconciliationFailure {
        owner_id: owner_id.to_string(),
        category_id,
        reason: err.to_string(),
    }
}

async fn recompute_in(
    db_tx: &DatabaseTransaction,
    owner_id: &str,
    category_id: Uuid,
) -> ResultEngine<Option<Plan>> {
    let Some((model, category)) = plans::Entity::find()
        .filter(plans::Column::OwnerId.eq(owner_id.to_string()))
        .filter(plans::Column::CategoryId.eq(category_id))
        .find_also_related(categories::Entity)
        .one(db_tx)
        .await?
    else {
        tracing::debug!(owner_id, %category_id, "no plan for category, nothing to reconcile");
        return Ok(None);
    };

    let cap = Money::new(model.cap_minor);
    let spent = expense_total(db_tx, owner_id, category_id).await?;
    let remaining = cap.floored_sub(spent);

    let mut plan = Plan::from_models(model, category);
    if plan.remaining != remaining {
        let updated = plans::ActiveModel::remaining_only(plan.id, remaining)
            .update(db_tx)
            .await?;
        plan.remaining = Money::new(updated.remaining_minor);
        plan.updated_at = updated.updated_at;
    }

    tracing::debug!(
        owner_id,
        %category_id,
        plan_id = %plan.id,
        "reconciled plan: cap {cap}, spent {spent}, remaining {}",
        plan.remaining
    );
    Ok(Some(plan))
}

/// Sum of expense amounts for `(owner_id, category_id)`.
pub(super) async fn expense_total<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    category_id: Uuid,
) -> ResultEngine<Money> {
    let total: Option<i64> = transactions::Entity::find()
        .select_only()
        .column_as(Expr::cust("COALESCE(SUM(amount_minor), 0)"), "total")
        .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
        .filter(transactions::Column::CategoryId.eq(category_id))
        .filter(transactions::Column::Kind.eq(TransactionKind::Expense.as_str()))
        .into_tuple()
        .one(db)
        .await?;
    Ok(Money::new(total.unwrap_or(0)))
}
