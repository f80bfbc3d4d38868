//! Course repository implementation.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use super::entities::course::{self, ActiveModel, Entity as CourseEntity};
use common::{AppError, AppResult};
use domain::{Course, CourseStatus};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Course repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, course: Course) -> AppResult<Course>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Course>>;

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Course>>;

    /// Newest first, optionally narrowed to one status
    async fn list(&self, status: Option<CourseStatus>) -> AppResult<Vec<Course>>;

    /// Courses with any of the given ids. Unknown ids are ignored.
    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<Course>>;

    /// Write back status and publishing fields
    async fn save(&self, course: Course) -> AppResult<Course>;

    /// Save several courses in one transaction. Returns how many were written.
    async fn save_all(&self, courses: Vec<Course>) -> AppResult<u32>;

    async fn count_by_status(&self) -> AppResult<Vec<(CourseStatus, u64)>>;
}

/// Concrete implementation of CourseRepository
pub struct CourseStore {
    db: DatabaseConnection,
}

impl CourseStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(models: Vec<course::Model>) -> AppResult<Vec<Course>> {
    models.into_iter().map(Course::try_from).collect()
}

#[async_trait]
impl CourseRepository for CourseStore {
    async fn create(&self, course: Course) -> AppResult<Course> {
        let model = ActiveModel::from(&course)
            .insert(&self.db)
            .await
            .map_err(AppError::from)?;
        Course::try_from(model)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Course>> {
        let result = CourseEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        result.map(Course::try_from).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Course>> {
        let result = CourseEntity::find()
            .filter(course::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        result.map(Course::try_from).transpose()
    }

    async fn list(&self, status: Option<CourseStatus>) -> AppResult<Vec<Course>> {
        let mut query = CourseEntity::find();
        if let Some(status) = status {
            query = query.filter(course::Column::Status.eq(status.as_str()));
        }

        let models = query
            .order_by_desc(course::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;
        to_domain(models)
    }

    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<Course>> {
        let models = CourseEntity::find()
            .filter(course::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(AppError::from)?;
        to_domain(models)
    }

    async fn save(&self, course: Course) -> AppResult<Course> {
        let model = ActiveModel::from(&course)
            .update(&self.db)
            .await
            .map_err(AppError::from)?;
        Course::try_from(model)
    }

    async fn save_all(&self, courses: Vec<Course>) -> AppResult<u32> {
        let txn = self.db.begin().await.map_err(AppError::from)?;

        let mut written = 0;
        for course in &courses {
            if let Err(e) = ActiveModel::from(course).update(&txn).await {
                txn.rollback().await.map_err(AppError::from)?;
                return Err(AppError::from(e));
            }
            written += 1;
        }

        txn.commit().await.map_err(AppError::from)?;
        Ok(written)
    }

    async fn count_by_status(&self) -> AppResult<Vec<(CourseStatus, u64)>> {
        let rows: Vec<(String, i64)> = CourseEntity::find()
            .select_only()
            .column(course::Column::Status)
            .column_as(Expr::col(course::Column::Id).count(), "count")
            .group_by(course::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        rows.into_iter()
            .map(|(status, count)| {
                let status: CourseStatus = status.parse().map_err(|_| {
                    AppError::internal(format!("Unexpected course status '{}' in storage", status))
                })?;
                Ok((status, count.max(0) as u64))
            })
            .collect()
    }
}
