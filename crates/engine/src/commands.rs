//! Command structs for engine operations.
//!
//! These types group parameters for write operations (create/update of
//! categories, transactions and plans), keeping call sites readable and
//! avoiding long argument lists.
//!
//! Update commands are patches: `None` leaves a field unchanged. Fields typed
//! `Option<Option<T>>` can also be cleared with `Some(None)`.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Money, TransactionKind};

/// Register a new account.
#[derive(Clone, Debug)]
pub struct NewUserCmd {
    pub username: String,
    pub password: String,
    pub name: Option<String>,
}

impl NewUserCmd {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Partial update of the caller's profile. A blank name clears it.
#[derive(Clone, Debug, Default)]
pub struct ProfilePatch {
    pub name: Option<Option<String>>,
}

impl ProfilePatch {
    #[must_use]
    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }
}

/// Create a category.
#[derive(Clone, Debug)]
pub struct NewCategoryCmd {
    pub owner_id: String,
    pub name: String,
    pub kind: Option<String>,
    pub description: Option<String>,
}

impl NewCategoryCmd {
    #[must_use]
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            name: name.into(),
            kind: None,
            description: None,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a category.
#[derive(Clone, Debug, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub kind: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.description.is_none()
    }
}

/// Create a transaction.
///
/// `kind` and `date` are raw client input and are validated by the engine.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub owner_id: String,
    pub category_id: Uuid,
    pub amount: Money,
    pub date: String,
    pub kind: String,
    pub description: Option<String>,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        category_id: Uuid,
        amount: Money,
        date: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            category_id,
            amount,
            date: date.into(),
            kind: kind.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn expense(
        owner_id: impl Into<String>,
        category_id: Uuid,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self::new(
            owner_id,
            category_id,
            amount,
            date.to_string(),
            TransactionKind::Expense.as_str(),
        )
    }

    #[must_use]
    pub fn income(
        owner_id: impl Into<String>,
        category_id: Uuid,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self::new(
            owner_id,
            category_id,
            amount,
            date.to_string(),
            TransactionKind::Income.as_str(),
        )
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a transaction.
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub category_id: Option<Uuid>,
    pub amount: Option<Money>,
    pub date: Option<String>,
    pub kind: Option<String>,
    pub description: Option<Option<String>>,
}

impl TransactionPatch {
    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }
}

/// Create a plan.
#[derive(Clone, Debug)]
pub struct NewPlanCmd {
    pub owner_id: String,
    pub category_id: Uuid,
    pub cap: Money,
    pub description: Option<String>,
}

impl NewPlanCmd {
    #[must_use]
    pub fn new(owner_id: impl Into<String>, category_id: Uuid, cap: Money) -> Self {
        Self {
            owner_id: owner_id.into(),
            category_id,
            cap,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a plan. The remaining amount is never patchable.
#[derive(Clone, Debug, Default)]
pub struct PlanPatch {
    pub category_id: Option<Uuid>,
    pub cap: Option<Money>,
    pub description: Option<Option<String>>,
}

impl PlanPatch {
    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn cap(mut self, cap: Money) -> Self {
        self.cap = Some(cap);
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Whether the patch can move the plan's remaining amount.
    pub(crate) fn affects_balance(&self) -> bool {
        self.category_id.is_some() || self.cap.is_some()
    }
}
