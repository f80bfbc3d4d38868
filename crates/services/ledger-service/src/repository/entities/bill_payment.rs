//! Bill payment database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::{BillPayment, Money};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bill_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bill_id: Uuid,
    pub supplier_id: Uuid,
    pub payment_account_id: Uuid,
    pub amount: i64,
    pub payment_date: Date,
    pub bill_reference: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for BillPayment {
    fn from(model: Model) -> Self {
        BillPayment {
            id: model.id,
            bill_id: model.bill_id,
            supplier_id: model.supplier_id,
            payment_account_id: model.payment_account_id,
            amount: Money::from_cents(model.amount),
            payment_date: model.payment_date,
            bill_reference: model.bill_reference,
            created_at: model.created_at,
        }
    }
}

impl From<&BillPayment> for ActiveModel {
    fn from(bp: &BillPayment) -> Self {
        ActiveModel {
            id: Set(bp.id),
            bill_id: Set(bp.bill_id),
            supplier_id: Set(bp.supplier_id),
            payment_account_id: Set(bp.payment_account_id),
            amount: Set(bp.amount.cents()),
            payment_date: Set(bp.payment_date),
            bill_reference: Set(bp.bill_reference.clone()),
            created_at: Set(bp.created_at),
        }
    }
}
