//! Transaction primitives.
//!
//! A `Transaction` is a dated income or expense tagged with one category. Only
//! expenses count against a category's plan.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, categories};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn is_expense(self) -> bool {
        self == Self::Expense
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(EngineError::InvalidKind(format!(
                "kind must be income or expense, got '{value}'"
            ))),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: String,
    pub category_id: Uuid,
    /// Name of the category at read time.
    pub category_name: String,
    pub kind: TransactionKind,
    pub amount: Money,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn new(
        owner_id: String,
        category: &categories::Model,
        kind: TransactionKind,
        amount: Money,
        date: NaiveDate,
        description: Option<String>,
    ) -> ResultEngine<Self> {
        let amount = amount.require_positive("amount")?;
        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            category_id: category.id,
            category_name: category.name.clone(),
            kind,
            amount,
            date,
            description,
            created_at: Utc::now(),
        })
    }

    pub(crate) fn from_models(
        model: Model,
        category: Option<categories::Model>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            category_id: model.category_id,
            category_name: category.map(|c| c.name).unwrap_or_default(),
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount_minor),
            date: model.date,
            description: model.description,
            created_at: model.created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub category_id: Uuid,
    pub kind: String,
    pub amount_minor: i64,
    pub date: Date,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            owner_id: ActiveValue::Set(tx.owner_id.clone()),
            category_id: ActiveValue::Set(tx.category_id),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount.cents()),
            date: ActiveValue::Set(tx.date),
            description: ActiveValue::Set(tx.description.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(
            TransactionKind::try_from("Expense").unwrap(),
            TransactionKind::Expense
        );
        assert_eq!(
            " income ".parse::<TransactionKind>().unwrap(),
            TransactionKind::Income
        );
    }

    #[test]
    fn unknown_kind_is_invalid_kind() {
        assert!(matches!(
            TransactionKind::try_from("transfer"),
            Err(EngineError::InvalidKind(_))
        ));
    }
}
