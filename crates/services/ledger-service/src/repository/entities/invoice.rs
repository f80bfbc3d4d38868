//! Invoice database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use common::AppError;
use domain::{Invoice, Money};

use super::parse_label;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub invoice_date: Date,
    pub due_date: Option<Date>,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total: i64,
    pub amount_paid: i64,
    pub amount_due: i64,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Invoice {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: model.id,
            status: parse_label("invoice status", &model.status)?,
            invoice_number: model.invoice_number,
            customer_id: model.customer_id,
            invoice_date: model.invoice_date,
            due_date: model.due_date,
            subtotal: Money::from_cents(model.subtotal),
            tax_amount: Money::from_cents(model.tax_amount),
            total: Money::from_cents(model.total),
            amount_paid: Money::from_cents(model.amount_paid),
            amount_due: Money::from_cents(model.amount_due),
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&Invoice> for ActiveModel {
    fn from(inv: &Invoice) -> Self {
        ActiveModel {
            id: Set(inv.id),
            invoice_number: Set(inv.invoice_number.clone()),
            customer_id: Set(inv.customer_id),
            invoice_date: Set(inv.invoice_date),
            due_date: Set(inv.due_date),
            subtotal: Set(inv.subtotal.cents()),
            tax_amount: Set(inv.tax_amount.cents()),
            total: Set(inv.total.cents()),
            amount_paid: Set(inv.amount_paid.cents()),
            amount_due: Set(inv.amount_due.cents()),
            status: Set(inv.status.as_str().to_string()),
            notes: Set(inv.notes.clone()),
            created_at: Set(inv.created_at),
            updated_at: Set(inv.updated_at),
        }
    }
}
