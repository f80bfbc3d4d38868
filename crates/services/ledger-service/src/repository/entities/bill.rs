//! Supplier bill database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use common::AppError;
use domain::{Bill, Money};

use super::parse_label;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bill_number: Option<String>,
    pub supplier_id: Uuid,
    pub account_id: Option<Uuid>,
    pub bill_date: Date,
    pub due_date: Option<Date>,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total: i64,
    pub amount_paid: i64,
    pub amount_due: i64,
    pub status: String,
    pub memo: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Bill {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Bill {
            id: model.id,
            status: parse_label("bill status", &model.status)?,
            bill_number: model.bill_number,
            supplier_id: model.supplier_id,
            account_id: model.account_id,
            bill_date: model.bill_date,
            due_date: model.due_date,
            subtotal: Money::from_cents(model.subtotal),
            tax_amount: Money::from_cents(model.tax_amount),
            total: Money::from_cents(model.total),
            amount_paid: Money::from_cents(model.amount_paid),
            amount_due: Money::from_cents(model.amount_due),
            memo: model.memo,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&Bill> for ActiveModel {
    fn from(b: &Bill) -> Self {
        ActiveModel {
            id: Set(b.id),
            bill_number: Set(b.bill_number.clone()),
            supplier_id: Set(b.supplier_id),
            account_id: Set(b.account_id),
            bill_date: Set(b.bill_date),
            due_date: Set(b.due_date),
            subtotal: Set(b.subtotal.cents()),
            tax_amount: Set(b.tax_amount.cents()),
            total: Set(b.total.cents()),
            amount_paid: Set(b.amount_paid.cents()),
            amount_due: Set(b.amount_due.cents()),
            status: Set(b.status.as_str().to_string()),
            memo: Set(b.memo.clone()),
            created_at: Set(b.created_at),
            updated_at: Set(b.updated_at),
        }
    }
}
