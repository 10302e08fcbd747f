use api_types::{
    ErrorResponse,
    reconcile::{Reconciled, ReconciliationIssue},
};
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerState, app, run_with_listener};

mod categories;
mod plans;
mod server;
mod transactions;
mod user;

/// Engine error on its way to becoming an HTTP response.
pub struct ServerError(EngineError);

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) | EngineError::CategoryNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::DuplicatePlan(_)
        | EngineError::ExistingKey(_)
        | EngineError::CategoryInUse(_) => StatusCode::CONFLICT,
        EngineError::Unauthorized => StatusCode::UNAUTHORIZED,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidDate(_)
        | EngineError::InvalidKind(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidCredentials(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let ServerError(err) = self;
        let status = status_for_engine_error(&err);
        let body = ErrorResponse {
            code: err.code().to_string(),
            error: message_for_engine_error(err),
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self(value)
    }
}

fn kind_view(kind: engine::TransactionKind) -> api_types::TransactionKind {
    match kind {
        engine::TransactionKind::Income => api_types::TransactionKind::Income,
        engine::TransactionKind::Expense => api_types::TransactionKind::Expense,
    }
}

fn kind_filter(kind: api_types::TransactionKind) -> engine::TransactionKind {
    match kind {
        api_types::TransactionKind::Income => engine::TransactionKind::Income,
        api_types::TransactionKind::Expense => engine::TransactionKind::Expense,
    }
}

fn issues(failures: Vec<engine::ReconciliationFailure>) -> Vec<ReconciliationIssue> {
    failures
        .into_iter()
        .map(|failure| ReconciliationIssue {
            category_id: failure.category_id,
            reason: failure.reason,
        })
        .collect()
}

/// Maps the value of an engine `Reconciled` and carries its failures along.
fn reconciled<T, U>(result: engine::Reconciled<T>, map: impl FnOnce(T) -> U) -> Reconciled<U> {
    Reconciled {
        data: map(result.value),
        reconciliation_failures: issues(result.failures),
    }
}

fn parse_amount(value: &str) -> Result<engine::Money, ServerError> {
    Ok(value.parse::<engine::Money>()?)
}

fn parse_optional_date(value: Option<&str>) -> Result<Option<chrono::NaiveDate>, ServerError> {
    Ok(value.map(engine::parse_date).transpose()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res =
            ServerError::from(EngineError::CategoryNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        for err in [
            EngineError::ExistingKey("x".to_string()),
            EngineError::DuplicatePlan("x".to_string()),
            EngineError::CategoryInUse("x".to_string()),
        ] {
            assert_eq!(ServerError::from(err).into_response().status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn engine_validation_maps_to_422() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InvalidDate("x".to_string()),
            EngineError::InvalidKind("x".to_string()),
            EngineError::InvalidName("x".to_string()),
            EngineError::InvalidCredentials("x".to_string()),
        ] {
            assert_eq!(
                ServerError::from(err).into_response().status(),
                StatusCode::UNPROCESSABLE_ENTITY
            );
        }
    }

    #[test]
    fn engine_unauthorized_maps_to_401() {
        let res = ServerError::from(EngineError::Unauthorized).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn database_error_maps_to_500() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("disk on fire".to_string()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
