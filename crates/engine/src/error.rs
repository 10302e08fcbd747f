//! The module contains the error the engine can throw.
//!
//! Validation errors ([`InvalidAmount`], [`InvalidDate`], [`InvalidKind`],
//! [`InvalidName`]) are kept apart from lookups ([`KeyNotFound`],
//! [`CategoryNotFound`]) and conflicts ([`DuplicatePlan`], [`ExistingKey`],
//! [`CategoryInUse`]) so callers can tell them apart.
//!
//! Reconciliation problems are **not** represented here: see
//! [`ReconciliationFailure`].
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidDate`]: EngineError::InvalidDate
//!  [`InvalidKind`]: EngineError::InvalidKind
//!  [`InvalidName`]: EngineError::InvalidName
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`CategoryNotFound`]: EngineError::CategoryNotFound
//!  [`DuplicatePlan`]: EngineError::DuplicatePlan
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`CategoryInUse`]: EngineError::CategoryInUse
//!  [`ReconciliationFailure`]: crate::ReconciliationFailure
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Category already has a plan: {0}")]
    DuplicatePlan(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Category in use: {0}")]
    CategoryInUse(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid kind: {0}")]
    InvalidKind(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::CategoryNotFound(a), Self::CategoryNotFound(b)) => a == b,
            (Self::DuplicatePlan(a), Self::DuplicatePlan(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::CategoryInUse(a), Self::CategoryInUse(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidKind(a), Self::InvalidKind(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidCredentials(a), Self::InvalidCredentials(b)) => a == b,
            (Self::Unauthorized, Self::Unauthorized) => true,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl EngineError {
    /// Stable snake_case identifier of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::KeyNotFound(_) => "not_found",
            Self::CategoryNotFound(_) => "category_not_found",
            Self::DuplicatePlan(_) => "duplicate_plan",
            Self::ExistingKey(_) => "already_exists",
            Self::CategoryInUse(_) => "category_in_use",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidDate(_) => "invalid_date",
            Self::InvalidKind(_) => "invalid_kind",
            Self::InvalidName(_) => "invalid_name",
            Self::InvalidCredentials(_) => "invalid_credentials",
            Self::Unauthorized => "unauthorized",
            Self::Database(_) => "internal",
        }
    }
}
