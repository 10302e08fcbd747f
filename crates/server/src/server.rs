use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{ServerError, categories, plans, transactions, user};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Category names seeded for every new account.
    pub default_categories: Arc<[String]>,
}

/// Resolve HTTP Basic credentials to a user and hand it to the handlers as
/// an `Extension<engine::User>`.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(credentials)) = auth_header else {
        return Err(EngineError::Unauthorized.into());
    };
    if credentials.username().is_empty() || credentials.password().is_empty() {
        return Err(EngineError::Unauthorized.into());
    }

    let user = state
        .engine
        .authenticate(credentials.username(), credentials.password())
        .await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Build the application router.
///
/// Everything but registration sits behind the basic-auth layer.
pub fn app(engine: Engine, default_categories: Vec<String>) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
        default_categories: default_categories.into(),
    };

    Router::new()
        .route("/user/me", get(user::me).patch(user::update))
        .route("/user", axum::routing::delete(user::delete))
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/{id}",
            get(categories::get)
                .patch(categories::update)
                .delete(categories::delete),
        )
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/summary", get(transactions::summary))
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .patch(transactions::update)
                .delete(transactions::delete),
        )
        .route("/plans", get(plans::list).post(plans::create))
        .route(
            "/plans/{id}",
            get(plans::get).patch(plans::update).delete(plans::delete),
        )
        .route("/plans/{id}/spending", get(plans::spending))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .route("/user/register", post(user::register))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    default_categories: Vec<String>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine, default_categories)).await
}
