//! Account endpoints.

use api_types::user::{ProfileUpdate, UserRegister, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{NewUserCmd, ProfilePatch, User};

use crate::{ServerError, server::ServerState};

fn map_user(user: User) -> UserView {
    UserView {
        username: user.username,
        name: user.name,
        created_at: user.created_at,
    }
}

/// Register a user and seed the configured default categories.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<UserRegister>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let mut cmd = NewUserCmd::new(payload.username, payload.password);
    cmd.name = payload.name;
    let user = state
        .engine
        .register_user(cmd, &state.default_categories)
        .await?;
    Ok((StatusCode::CREATED, Json(map_user(user))))
}

pub async fn me(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.profile(&user.username).await?;
    Ok(Json(map_user(user)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let patch = ProfilePatch { name: payload.name };
    let user = state.engine.update_profile(&user.username, patch).await?;
    Ok(Json(map_user(user)))
}

/// Delete the caller's account with everything it owns.
pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account(&user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
