//! Transfer database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::{Money, Transfer};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: i64,
    pub transfer_date: Date,
    pub memo: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Transfer {
    fn from(model: Model) -> Self {
        Transfer {
            id: model.id,
            from_account_id: model.from_account_id,
            to_account_id: model.to_account_id,
            amount: Money::from_cents(model.amount),
            transfer_date: model.transfer_date,
            memo: model.memo,
            created_at: model.created_at,
        }
    }
}

impl From<&Transfer> for ActiveModel {
    fn from(t: &Transfer) -> Self {
        ActiveModel {
            id: Set(t.id),
            from_account_id: Set(t.from_account_id),
            to_account_id: Set(t.to_account_id),
            amount: Set(t.amount.cents()),
            transfer_date: Set(t.transfer_date),
            memo: Set(t.memo.clone()),
            created_at: Set(t.created_at),
        }
    }
}
