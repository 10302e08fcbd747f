use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Money, NewTransactionCmd, Reconciled, ResultEngine, Transaction,
    TransactionKind, TransactionPatch, categories, transactions,
    util::{normalize_optional_text, parse_date},
};

use super::{Engine, with_tx};

/// Filters for listing transactions.
///
/// `from` and `to` are both inclusive calendar dates.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<Uuid>,
}

/// Income/expense totals over a date range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransactionSummary {
    pub total_income: Money,
    pub total_expense: Money,
    /// `total_income - total_expense`, may be negative.
    pub balance: Money,
}

fn validate_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(EngineError::InvalidDate(format!(
            "invalid range: {from} is after {to}"
        )));
    }
    Ok(())
}

fn in_range<S: QueryFilter>(
    mut select: S,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> S {
    if let Some(from) = from {
        select = select.filter(transactions::Column::Date.gte(from));
    }
    if let Some(to) = to {
        select = select.filter(transactions::Column::Date.lte(to));
    }
    select
}

async fn kind_total<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    kind: TransactionKind,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ResultEngine<Money> {
    let select = transactions::Entity::find()
        .select_only()
        .column_as(Expr::cust("COALESCE(SUM(amount_minor), 0)"), "total")
        .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
        .filter(transactions::Column::Kind.eq(kind.as_str()));
    let total: Option<i64> = in_range(select, from, to).into_tuple().one(db).await?;
    Ok(Money::new(total.unwrap_or(0)))
}

impl Engine {
    /// Records an income or expense.
    ///
    /// An expense triggers reconciliation of its category's plan.
    pub async fn create_transaction(
        &self,
        cmd: NewTransactionCmd,
    ) -> ResultEngine<Reconciled<Transaction>> {
        let amount = cmd.amount.require_positive("amount")?;
        let date = parse_date(&cmd.date)?;
        let kind = TransactionKind::try_from(cmd.kind.as_str())?;
        let description = normalize_optional_text(cmd.description.as_deref());
        let owner_id = cmd.owner_id.as_str();

        let tx = with_tx!(self, |db_tx| {
            let category = Self::resolve_category(&db_tx, owner_id, cmd.category_id).await?;
            let tx = Transaction::new(
                owner_id.to_string(),
                &category,
                kind,
                amount,
                date,
                description,
            )?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            Ok::<_, EngineError>(tx)
        })?;
        tracing::debug!(owner_id, transaction_id = %tx.id, "created {} of {}", tx.kind, tx.amount);

        let affected = tx.kind.is_expense().then_some(tx.category_id);
        Ok(self.reconcile_categories(owner_id, affected, tx).await)
    }

    /// Applies `patch` to a transaction.
    ///
    /// Reconciles the previous category if the transaction was an expense and
    /// the resulting category if it is one now (once when they coincide).
    pub async fn update_transaction(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
        patch: TransactionPatch,
    ) -> ResultEngine<Reconciled<Transaction>> {
        let amount = patch
            .amount
            .map(|amount| amount.require_positive("amount"))
            .transpose()?;
        let date = patch.date.as_deref().map(parse_date).transpose()?;
        let kind = patch
            .kind
            .as_deref()
            .map(TransactionKind::try_from)
            .transpose()?;

        let (before, after) = with_tx!(self, |db_tx| {
            let model = Self::require_owned_transaction(&db_tx, owner_id, transaction_id).await?;
            let before = Transaction::from_models(model.clone(), None)?;

            let category = match patch.category_id {
                Some(category_id) => {
                    Self::resolve_category(&db_tx, owner_id, category_id).await?
                }
                None => Self::resolve_category(&db_tx, owner_id, model.category_id).await?,
            };

            let mut active: transactions::ActiveModel = model.into();
            active.category_id = ActiveValue::Set(category.id);
            if let Some(amount) = amount {
                active.amount_minor = ActiveValue::Set(amount.cents());
            }
            if let Some(date) = date {
                active.date = ActiveValue::Set(date);
            }
            if let Some(kind) = kind {
                active.kind = ActiveValue::Set(kind.as_str().to_string());
            }
            if let Some(description) = patch.description {
                active.description =
                    ActiveValue::Set(normalize_optional_text(description.as_deref()));
            }
            let updated = active.update(&db_tx).await?;
            Ok::<_, EngineError>((before, Transaction::from_models(updated, Some(category))?))
        })?;

        let affected = [
            before.kind.is_expense().then_some(before.category_id),
            after.kind.is_expense().then_some(after.category_id),
        ];
        Ok(self
            .reconcile_categories(owner_id, affected.into_iter().flatten(), after)
            .await)
    }

    /// Deletes a transaction, reconciling its category if it was an expense.
    pub async fn delete_transaction(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Reconciled<()>> {
        let deleted = with_tx!(self, |db_tx| {
            let model = Self::require_owned_transaction(&db_tx, owner_id, transaction_id).await?;
            let deleted = Transaction::from_models(model, None)?;
            transactions::Entity::delete_by_id(deleted.id)
                .exec(&db_tx)
                .await?;
            Ok::<_, EngineError>(deleted)
        })?;
        tracing::debug!(owner_id, %transaction_id, "deleted {}", deleted.kind);

        let affected = deleted.kind.is_expense().then_some(deleted.category_id);
        Ok(self.reconcile_categories(owner_id, affected, ()).await)
    }

    /// Returns a transaction with its category name.
    pub async fn transaction(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let (model, category) = transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
            .find_also_related(categories::Entity)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        Transaction::from_models(model, category)
    }

    /// Lists transactions newest first (by date, then creation time).
    pub async fn list_transactions(
        &self,
        owner_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_range(filter.from, filter.to)?;

        let mut select = transactions::Entity::find()
            .filter(transactions::Column::OwnerId.eq(owner_id.to_string()));
        select = in_range(select, filter.from, filter.to);
        if let Some(kind) = filter.kind {
            select = select.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(category_id) = filter.category_id {
            select = select.filter(transactions::Column::CategoryId.eq(category_id));
        }

        select
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::CreatedAt)
            .find_also_related(categories::Entity)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|(model, category)| Transaction::from_models(model, category))
            .collect()
    }

    /// Returns income/expense totals for the inclusive `[from, to]` range.
    pub async fn transaction_summary(
        &self,
        owner_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<TransactionSummary> {
        validate_range(from, to)?;
        let total_income =
            kind_total(&self.database, owner_id, TransactionKind::Income, from, to).await?;
        let total_expense =
            kind_total(&self.database, owner_id, TransactionKind::Expense, from, to).await?;
        Ok(TransactionSummary {
            total_income,
            total_expense,
            balance: total_income - total_expense,
        })
    }
}
