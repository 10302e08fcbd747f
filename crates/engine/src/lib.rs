//! Domain engine for Dompet.
//!
//! Owns the storage entities and every store operation (categories,
//! transactions, plans, accounts) plus the reconciliation that keeps each
//! plan's remaining amount derived from its category's expenses.

pub use categories::Category;
pub use commands::{
    CategoryPatch, NewCategoryCmd, NewPlanCmd, NewTransactionCmd, NewUserCmd, PlanPatch,
    ProfilePatch, TransactionPatch,
};
pub use error::EngineError;
pub use money::Money;
pub use ops::{
    Engine, EngineBuilder, Reconciled, ReconciliationFailure, TransactionListFilter,
    TransactionSummary,
};
pub use plans::{Plan, PlanSpending};
pub use transactions::{Transaction, TransactionKind};
pub use users::User;
pub use util::parse_date;

mod categories;
mod commands;
mod error;
mod money;
mod ops;
mod plans;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
