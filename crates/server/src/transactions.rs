//! Transactions API endpoints.
//!
//! Every write answers with the resulting transaction; plans whose recompute
//! failed after the write are listed in `reconciliation_failures`.

use api_types::{
    reconcile::{Reconciled, ReconciliationReport},
    stats::{Summary, SummaryQuery},
    transaction::{TransactionListQuery, TransactionNew, TransactionUpdate, TransactionView},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::{NewTransactionCmd, TransactionListFilter, TransactionPatch, User};
use uuid::Uuid;

use crate::{
    ServerError, issues, kind_filter, kind_view, parse_amount, parse_optional_date, reconciled,
    server::ServerState,
};

fn map_transaction(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        category_id: tx.category_id,
        category_name: tx.category_name,
        kind: kind_view(tx.kind),
        amount: tx.amount.to_string(),
        date: tx.date,
        description: tx.description,
        created_at: tx.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let filter = TransactionListFilter {
        from: parse_optional_date(query.from.as_deref())?,
        to: parse_optional_date(query.to.as_deref())?,
        kind: query.kind.map(kind_filter),
        category_id: query.category_id,
    };
    let transactions = state
        .engine
        .list_transactions(&user.username, &filter)
        .await?
        .into_iter()
        .map(map_transaction)
        .collect();
    Ok(Json(transactions))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<Reconciled<TransactionView>>), ServerError> {
    let cmd = NewTransactionCmd {
        owner_id: user.username,
        category_id: payload.category_id,
        amount: parse_amount(&payload.amount)?,
        date: payload.date,
        kind: payload.kind,
        description: payload.description,
    };
    let created = state.engine.create_transaction(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(reconciled(created, map_transaction)),
    ))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state
        .engine
        .transaction(&user.username, transaction_id)
        .await?;
    Ok(Json(map_transaction(tx)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<Reconciled<TransactionView>>, ServerError> {
    let patch = TransactionPatch {
        category_id: payload.category_id,
        amount: payload.amount.as_deref().map(parse_amount).transpose()?,
        date: payload.date,
        kind: payload.kind,
        description: payload.description,
    };
    let updated = state
        .engine
        .update_transaction(&user.username, transaction_id, patch)
        .await?;
    Ok(Json(reconciled(updated, map_transaction)))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Response, ServerError> {
    let deleted = state
        .engine
        .delete_transaction(&user.username, transaction_id)
        .await?;
    if deleted.is_clean() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let report = ReconciliationReport {
        reconciliation_failures: issues(deleted.failures),
    };
    Ok((StatusCode::OK, Json(report)).into_response())
}

/// Income/expense totals over an optional inclusive date range.
pub async fn summary(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Summary>, ServerError> {
    let summary = state
        .engine
        .transaction_summary(
            &user.username,
            parse_optional_date(query.from.as_deref())?,
            parse_optional_date(query.to.as_deref())?,
        )
        .await?;
    Ok(Json(Summary {
        total_income: summary.total_income.to_string(),
        total_expense: summary.total_expense.to_string(),
        balance: summary.balance.to_string(),
    }))
}
