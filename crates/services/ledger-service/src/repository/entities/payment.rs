//! Customer payment database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::{Money, Payment};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub payment_date: Date,
    pub amount: i64,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub deposit_to_account_id: Option<Uuid>,
    pub memo: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Payment {
    fn from(model: Model) -> Self {
        Payment {
            id: model.id,
            customer_id: model.customer_id,
            payment_date: model.payment_date,
            amount: Money::from_cents(model.amount),
            payment_method: model.payment_method,
            reference_number: model.reference_number,
            deposit_to_account_id: model.deposit_to_account_id,
            memo: model.memo,
            created_at: model.created_at,
        }
    }
}

impl From<&Payment> for ActiveModel {
    fn from(p: &Payment) -> Self {
        ActiveModel {
            id: Set(p.id),
            customer_id: Set(p.customer_id),
            payment_date: Set(p.payment_date),
            amount: Set(p.amount.cents()),
            payment_method: Set(p.payment_method.clone()),
            reference_number: Set(p.reference_number.clone()),
            deposit_to_account_id: Set(p.deposit_to_account_id),
            memo: Set(p.memo.clone()),
            created_at: Set(p.created_at),
        }
    }
}
