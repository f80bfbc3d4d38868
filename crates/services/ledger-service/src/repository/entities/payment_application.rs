//! Payment-to-invoice application entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{Money, PaymentApplication};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PaymentApplication {
    fn from(model: Model) -> Self {
        PaymentApplication {
            id: model.id,
            payment_id: model.payment_id,
            invoice_id: model.invoice_id,
            amount: Money::from_cents(model.amount),
        }
    }
}
