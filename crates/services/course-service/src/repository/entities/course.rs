//! Course database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use common::AppError;
use domain::{Course, CourseStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub status: String,
    pub published_at: Option<DateTimeUtc>,
    pub published_by: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl TryFrom<Model> for Course {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let status: CourseStatus = model.status.parse().map_err(|_| {
            AppError::internal(format!("Unexpected course status '{}' in storage", model.status))
        })?;

        Ok(Course {
            id: model.id,
            title: model.title,
            slug: model.slug,
            status,
            published_at: model.published_at,
            published_by: model.published_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&Course> for ActiveModel {
    fn from(course: &Course) -> Self {
        ActiveModel {
            id: Set(course.id),
            title: Set(course.title.clone()),
            slug: Set(course.slug.clone()),
            status: Set(course.status.as_str().to_string()),
            published_at: Set(course.published_at),
            published_by: Set(course.published_by.clone()),
            created_at: Set(course.created_at),
            updated_at: Set(course.updated_at),
        }
    }
}
