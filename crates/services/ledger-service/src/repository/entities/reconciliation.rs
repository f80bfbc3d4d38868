//! Reconciliation session entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use common::AppError;
use domain::{Money, Reconciliation};

use super::parse_label;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reconciliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub statement_date: Date,
    pub statement_balance: i64,
    pub cleared_balance: i64,
    pub difference: i64,
    pub status: String,
    pub completed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Reconciliation {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Reconciliation {
            id: model.id,
            status: parse_label("reconciliation status", &model.status)?,
            account_id: model.account_id,
            statement_date: model.statement_date,
            statement_balance: Money::from_cents(model.statement_balance),
            cleared_balance: Money::from_cents(model.cleared_balance),
            difference: Money::from_cents(model.difference),
            completed_at: model.completed_at,
            created_at: model.created_at,
        })
    }
}

impl From<&Reconciliation> for ActiveModel {
    fn from(r: &Reconciliation) -> Self {
        ActiveModel {
            id: Set(r.id),
            account_id: Set(r.account_id),
            statement_date: Set(r.statement_date),
            statement_balance: Set(r.statement_balance.cents()),
            cleared_balance: Set(r.cleared_balance.cents()),
            difference: Set(r.difference.cents()),
            status: Set(r.status.as_str().to_string()),
            completed_at: Set(r.completed_at),
            created_at: Set(r.created_at),
        }
    }
}
