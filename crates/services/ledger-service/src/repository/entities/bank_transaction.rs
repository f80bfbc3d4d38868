//! Bank feed transaction entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use common::AppError;
use domain::{BankTransaction, Money, NewBankTransaction};

use super::parse_label;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub transaction_date: Date,
    pub description: String,
    pub amount: i64,
    pub fit_id: String,
    pub status: String,
    pub category_account_id: Option<Uuid>,
    pub category: Option<String>,
    pub payee: Option<String>,
    pub applied_rule_id: Option<Uuid>,
    pub memo: Option<String>,
    pub is_reconciled: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for BankTransaction {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(BankTransaction {
            id: model.id,
            status: parse_label("bank transaction status", &model.status)?,
            account_id: model.account_id,
            transaction_date: model.transaction_date,
            description: model.description,
            amount: Money::from_cents(model.amount),
            fit_id: model.fit_id,
            category_account_id: model.category_account_id,
            category: model.category,
            payee: model.payee,
            applied_rule_id: model.applied_rule_id,
            memo: model.memo,
            is_reconciled: model.is_reconciled,
            created_at: model.created_at,
        })
    }
}

impl ActiveModel {
    pub fn from_new(tx: &NewBankTransaction, now: DateTimeUtc) -> Self {
        ActiveModel {
            id: Set(tx.id),
            account_id: Set(tx.account_id),
            transaction_date: Set(tx.transaction_date),
            description: Set(tx.description.clone()),
            amount: Set(tx.amount.cents()),
            fit_id: Set(tx.fit_id.clone()),
            status: Set(tx.status.as_str().to_string()),
            category_account_id: Set(tx.category_account_id),
            category: Set(tx.category.clone()),
            payee: Set(tx.payee.clone()),
            applied_rule_id: Set(tx.applied_rule_id),
            memo: Set(None),
            is_reconciled: Set(false),
            created_at: Set(now),
        }
    }
}
