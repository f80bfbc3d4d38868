//! Supplier database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::Supplier;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub display_name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Supplier {
    fn from(model: Model) -> Self {
        Supplier {
            id: model.id,
            display_name: model.display_name,
            company: model.company,
            email: model.email,
            phone: model.phone,
            tax_id: model.tax_id,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}
