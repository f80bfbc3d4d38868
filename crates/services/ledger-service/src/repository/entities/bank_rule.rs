//! Bank rule entity for SeaORM. Conditions are stored as a JSON array.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::{BankRule, RuleCondition};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub priority: i32,
    pub conditions: Json,
    pub assign_account_id: Option<Uuid>,
    pub assign_category: Option<String>,
    pub assign_payee: Option<String>,
    pub auto_confirm: bool,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for BankRule {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let conditions: Vec<RuleCondition> = serde_json::from_value(model.conditions)
            .map_err(|e| AppError::internal(format!("Bank rule {} conditions: {}", model.id, e)))?;

        Ok(BankRule {
            id: model.id,
            name: model.name,
            priority: model.priority,
            conditions,
            assign_account_id: model.assign_account_id,
            assign_category: model.assign_category,
            assign_payee: model.assign_payee,
            auto_confirm: model.auto_confirm,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
