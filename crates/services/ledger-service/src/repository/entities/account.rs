//! Account database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::Account;

use super::parse_label;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub account_type: String,
    pub detail_type: Option<String>,
    pub description: Option<String>,
    pub account_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Account {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Account {
            id: model.id,
            account_type: parse_label("account type", &model.account_type)?,
            name: model.name,
            detail_type: model.detail_type,
            description: model.description,
            account_number: model.account_number,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
