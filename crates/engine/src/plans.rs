//! Budget plans.
//!
//! A plan caps the expenses of one category for one owner. `remaining` is a
//! derived value kept in `[0, cap]` by the reconciliation engine and never
//! written by clients.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{Money, categories};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub id: Uuid,
    pub owner_id: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub cap: Money,
    pub remaining: Money,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    pub(crate) fn from_models(model: Model, category: Option<categories::Model>) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            category_id: model.category_id,
            category_name: category.map(|c| c.name).unwrap_or_default(),
            cap: Money::new(model.cap_minor),
            remaining: Money::new(model.remaining_minor),
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Spending of a plan's category compared to its cap.
///
/// Unlike `Plan::remaining`, `spent` is not clamped: `over_budget` is the only
/// place overspend is visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanSpending {
    pub plan_id: Uuid,
    pub cap: Money,
    pub spent: Money,
    pub remaining: Money,
    pub over_budget: bool,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub category_id: Uuid,
    pub cap_minor: i64,
    pub remaining_minor: i64,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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

impl ActiveModel {
    /// Active model touching only the derived balance.
    pub(crate) fn remaining_only(id: Uuid, remaining: Money) -> Self {
        Self {
            id: ActiveValue::Set(id),
            remaining_minor: ActiveValue::Set(remaining.cents()),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        }
    }
}
