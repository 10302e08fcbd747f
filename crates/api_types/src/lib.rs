//! Request and response bodies of the Dompet HTTP API.
//!
//! Amounts travel as decimal strings (`"12.50"`) and dates as `YYYY-MM-DD`;
//! the server validates both, so they are plain `String`s here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Deserializes a patch field that distinguishes "absent" from `null`.
///
/// Use with `#[serde(default, deserialize_with = "crate::nullable")]`:
/// a missing key stays `None`, `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable snake_case error kind, e.g. `duplicate_plan`.
    pub code: String,
}

pub mod reconcile {
    use super::*;

    /// A plan recompute that failed after the request's write committed.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconciliationIssue {
        pub category_id: Uuid,
        pub reason: String,
    }

    /// A mutation result plus the recomputes that failed after it.
    ///
    /// `reconciliation_failures` is omitted from JSON when empty.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Reconciled<T> {
        #[serde(flatten)]
        pub data: T,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub reconciliation_failures: Vec<ReconciliationIssue>,
    }

    /// Body of a delete that committed but left plans unreconciled.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconciliationReport {
        pub reconciliation_failures: Vec<ReconciliationIssue>,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserRegister {
        pub username: String,
        pub password: String,
        pub name: Option<String>,
    }

    /// `name: null` or a blank name clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        #[serde(default, deserialize_with = "crate::nullable")]
        pub name: Option<Option<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub username: String,
        pub name: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        /// `income` or `expense`.
        pub kind: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        #[serde(default, deserialize_with = "crate::nullable")]
        pub kind: Option<Option<String>>,
        #[serde(default, deserialize_with = "crate::nullable")]
        pub description: Option<Option<String>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryListQuery {
        pub kind: Option<TransactionKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub kind: Option<TransactionKind>,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub category_id: Uuid,
        /// Decimal string, must be > 0.
        pub amount: String,
        /// `YYYY-MM-DD` or RFC 3339.
        pub date: String,
        /// `income` or `expense`.
        pub kind: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub category_id: Option<Uuid>,
        pub amount: Option<String>,
        pub date: Option<String>,
        pub kind: Option<String>,
        #[serde(default, deserialize_with = "crate::nullable")]
        pub description: Option<Option<String>>,
    }

    /// Filters of `GET /transactions`. `from` and `to` are inclusive.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub from: Option<String>,
        pub to: Option<String>,
        pub kind: Option<TransactionKind>,
        pub category_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub category_id: Uuid,
        pub category_name: String,
        pub kind: TransactionKind,
        pub amount: String,
        pub date: NaiveDate,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod plan {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlanNew {
        pub category_id: Uuid,
        /// Decimal string, must be > 0.
        pub cap: String,
        pub description: Option<String>,
    }

    /// The remaining amount is derived and cannot be patched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PlanUpdate {
        pub category_id: Option<Uuid>,
        pub cap: Option<String>,
        #[serde(default, deserialize_with = "crate::nullable")]
        pub description: Option<Option<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlanView {
        pub id: Uuid,
        pub category_id: Uuid,
        pub category_name: String,
        pub cap: String,
        pub remaining: String,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlanSpendingView {
        pub plan_id: Uuid,
        pub cap: String,
        pub spent: String,
        pub remaining: String,
        pub over_budget: bool,
    }
}

pub mod stats {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SummaryQuery {
        pub from: Option<String>,
        pub to: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Summary {
        pub total_income: String,
        pub total_expense: String,
        /// Income minus expense, may be negative.
        pub balance: String,
    }
}
