//! Budget plan endpoints.

use api_types::{
    plan::{PlanNew, PlanSpendingView, PlanUpdate, PlanView},
    reconcile::Reconciled,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{NewPlanCmd, PlanPatch, User};
use uuid::Uuid;

use crate::{ServerError, parse_amount, reconciled, server::ServerState};

fn map_plan(plan: engine::Plan) -> PlanView {
    PlanView {
        id: plan.id,
        category_id: plan.category_id,
        category_name: plan.category_name,
        cap: plan.cap.to_string(),
        remaining: plan.remaining.to_string(),
        description: plan.description,
        created_at: plan.created_at,
        updated_at: plan.updated_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<PlanView>>, ServerError> {
    let plans = state
        .engine
        .list_plans(&user.username)
        .await?
        .into_iter()
        .map(map_plan)
        .collect();
    Ok(Json(plans))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<PlanNew>,
) -> Result<(StatusCode, Json<Reconciled<PlanView>>), ServerError> {
    let cmd = NewPlanCmd {
        owner_id: user.username,
        category_id: payload.category_id,
        cap: parse_amount(&payload.cap)?,
        description: payload.description,
    };
    let created = state.engine.create_plan(cmd).await?;
    Ok((StatusCode::CREATED, Json(reconciled(created, map_plan))))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<PlanView>, ServerError> {
    let plan = state.engine.plan(&user.username, plan_id).await?;
    Ok(Json(map_plan(plan)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(plan_id): Path<Uuid>,
    Json(payload): Json<PlanUpdate>,
) -> Result<Json<Reconciled<PlanView>>, ServerError> {
    let patch = PlanPatch {
        category_id: payload.category_id,
        cap: payload.cap.as_deref().map(parse_amount).transpose()?,
        description: payload.description,
    };
    let updated = state
        .engine
        .update_plan(&user.username, plan_id, patch)
        .await?;
    Ok(Json(reconciled(updated, map_plan)))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(plan_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_plan(&user.username, plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Live spending of the plan's category against its cap.
pub async fn spending(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<PlanSpendingView>, ServerError> {
    let spending = state.engine.plan_spending(&user.username, plan_id).await?;
    Ok(Json(PlanSpendingView {
        plan_id: spending.plan_id,
        cap: spending.cap.to_string(),
        spent: spending.spent.to_string(),
        remaining: spending.remaining.to_string(),
        over_budget: spending.over_budget,
    }))
}
