//! Expense database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use common::AppError;
use domain::{Expense, Money};

use super::parse_label;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub expense_type: String,
    pub payee_type: String,
    pub payee_id: Option<Uuid>,
    pub payee_name: Option<String>,
    pub account_id: Option<Uuid>,
    pub payment_account_id: Option<Uuid>,
    pub expense_date: Date,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total: i64,
    pub memo: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Expense {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Expense {
            id: model.id,
            expense_type: parse_label("expense type", &model.expense_type)?,
            payee_type: parse_label("payee type", &model.payee_type)?,
            payee_id: model.payee_id,
            payee_name: model.payee_name,
            account_id: model.account_id,
            payment_account_id: model.payment_account_id,
            expense_date: model.expense_date,
            subtotal: Money::from_cents(model.subtotal),
            tax_amount: Money::from_cents(model.tax_amount),
            total: Money::from_cents(model.total),
            memo: model.memo,
            created_at: model.created_at,
        })
    }
}

impl From<&Expense> for ActiveModel {
    fn from(e: &Expense) -> Self {
        ActiveModel {
            id: Set(e.id),
            expense_type: Set(e.expense_type.as_str().to_string()),
            payee_type: Set(e.payee_type.as_str().to_string()),
            payee_id: Set(e.payee_id),
            payee_name: Set(e.payee_name.clone()),
            account_id: Set(e.account_id),
            payment_account_id: Set(e.payment_account_id),
            expense_date: Set(e.expense_date),
            subtotal: Set(e.subtotal.cents()),
            tax_amount: Set(e.tax_amount.cents()),
            total: Set(e.total.cents()),
            memo: Set(e.memo.clone()),
            created_at: Set(e.created_at),
        }
    }
}
