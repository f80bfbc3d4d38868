//! Course catalogue and the publishing lifecycle.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::{BulkStatusOutcome, Course, CourseStats, CourseStatus, NewCourse};

use crate::repository::CourseRepository;

#[async_trait]
pub trait CourseService: Send + Sync {
    async fn create_course(&self, course: NewCourse) -> AppResult<Course>;

    async fn get_course(&self, id: Uuid) -> AppResult<Course>;

    async fn list_courses(&self, status: Option<CourseStatus>) -> AppResult<Vec<Course>>;

    /// Move one course along the lifecycle. `actor` is recorded on publish.
    async fn update_status(&self, id: Uuid, status: CourseStatus, actor: &str) -> AppResult<Course>;

    /// Move many courses at once. Courses that cannot make the move are skipped.
    async fn bulk_update_status(
        &self,
        ids: Vec<Uuid>,
        status: CourseStatus,
        actor: &str,
    ) -> AppResult<BulkStatusOutcome>;

    async fn stats(&self) -> AppResult<CourseStats>;
}

pub struct CourseManager {
    repo: Arc<dyn CourseRepository>,
}

impl CourseManager {
    pub fn new(repo: Arc<dyn CourseRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CourseService for CourseManager {
    async fn create_course(&self, course: NewCourse) -> AppResult<Course> {
        let course = course.into_course(Uuid::new_v4())?;

        if self.repo.find_by_slug(&course.slug).await?.is_some() {
            return Err(AppError::conflict(format!(
                "A course with slug '{}' already exists",
                course.slug
            )));
        }

        let course = self.repo.create(course).await?;
        tracing::info!("Created course {} ({})", course.slug, course.id);
        Ok(course)
    }

    async fn get_course(&self, id: Uuid) -> AppResult<Course> {
        self.repo.find_by_id(id).await?.ok_or_not_found("Course")
    }

    async fn list_courses(&self, status: Option<CourseStatus>) -> AppResult<Vec<Course>> {
        self.repo.list(status).await
    }

    async fn update_status(&self, id: Uuid, status: CourseStatus, actor: &str) -> AppResult<Course> {
        let mut course = self.get_course(id).await?;
        let from = course.status;
        course.transition(status, actor, Utc::now())?;

        let course = self.repo.save(course).await?;
        tracing::info!("Course {} moved from {} to {} by {}", course.id, from, status, actor);
        Ok(course)
    }

    async fn bulk_update_status(
        &self,
        ids: Vec<Uuid>,
        status: CourseStatus,
        actor: &str,
    ) -> AppResult<BulkStatusOutcome> {
        if ids.is_empty() {
            return Err(AppError::validation("At least one course id is required"));
        }

        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        let requested = ids.len() as u32;

        let now = Utc::now();
        let courses = self.repo.find_many(ids).await?;
        let changed: Vec<Course> = courses
            .into_iter()
            .filter_map(|mut course| course.transition(status, actor, now).ok().map(|_| course))
            .collect();

        let updated = if changed.is_empty() {
            0
        } else {
            self.repo.save_all(changed).await?
        };
        let outcome = BulkStatusOutcome {
            updated,
            skipped: requested.saturating_sub(updated),
        };

        tracing::info!(
            "Bulk status change to {} by {}: {} updated, {} skipped",
            status,
            actor,
            outcome.updated,
            outcome.skipped
        );
        Ok(outcome)
    }

    async fn stats(&self) -> AppResult<CourseStats> {
        let mut stats = CourseStats::default();
        for (status, count) in self.repo.count_by_status().await? {
            stats.record(status, count);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockCourseRepository;

    fn course(title: &str, status: CourseStatus) -> Course {
        let mut course = Course::new(
            Uuid::new_v4(),
            title.to_string(),
            title.to_lowercase().replace(' ', "-"),
        );
        course.status = status;
        course
    }

    #[tokio::test]
    async fn test_create_course_rejects_taken_slug() {
        let mut repo = MockCourseRepository::new();
        repo.expect_find_by_slug()
            .withf(|slug| slug == "spanish-a1")
            .returning(|_| Ok(Some(course("Spanish A1", CourseStatus::Draft))));
        repo.expect_create().never();

        let service = CourseManager::new(Arc::new(repo));
        let result = service
            .create_course(NewCourse {
                title: "Spanish A1".to_string(),
                slug: " Spanish-A1 ".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_status_enforces_transitions() {
        let existing = course("French B2", CourseStatus::Review);
        let id = existing.id;

        let mut repo = MockCourseRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_save().never();

        let service = CourseManager::new(Arc::new(repo));
        let result = service
            .update_status(id, CourseStatus::Archived, "Ana Admin")
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_status_publishes_with_actor() {
        let existing = course("German A2", CourseStatus::Draft);
        let id = existing.id;

        let mut repo = MockCourseRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_save().returning(Ok);

        let service = CourseManager::new(Arc::new(repo));
        let course = service
            .update_status(id, CourseStatus::Published, "Ana Admin")
            .await
            .unwrap();

        assert_eq!(course.status, CourseStatus::Published);
        assert_eq!(course.published_by.as_deref(), Some("Ana Admin"));
        assert!(course.published_at.is_some());
    }

    #[tokio::test]
    async fn test_update_status_missing_course() {
        let mut repo = MockCourseRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = CourseManager::new(Arc::new(repo));
        let result = service
            .update_status(Uuid::new_v4(), CourseStatus::Review, "admin")
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_bulk_publish_stamps_every_course() {
        let drafts = vec![
            course("Spanish A1", CourseStatus::Draft),
            course("Spanish A2", CourseStatus::Draft),
            course("Spanish B1", CourseStatus::Draft),
        ];
        let ids: Vec<Uuid> = drafts.iter().map(|c| c.id).collect();

        let mut repo = MockCourseRepository::new();
        repo.expect_find_many()
            .returning(move |_| Ok(drafts.clone()));
        repo.expect_save_all()
            .withf(|courses| {
                courses.len() == 3
                    && courses.iter().all(|c| {
                        c.status == CourseStatus::Published
                            && c.published_by.as_deref() == Some("Ana Admin")
                            && c.published_at.is_some()
                    })
            })
            .times(1)
            .returning(|courses| Ok(courses.len() as u32));

        let service = CourseManager::new(Arc::new(repo));
        let outcome = service
            .bulk_update_status(ids, CourseStatus::Published, "Ana Admin")
            .await
            .unwrap();

        assert_eq!(outcome, BulkStatusOutcome { updated: 3, skipped: 0 });
    }

    #[tokio::test]
    async fn test_bulk_archive_leaves_publisher_unset() {
        let drafts = vec![
            course("Italian A1", CourseStatus::Draft),
            course("Italian A2", CourseStatus::Draft),
        ];
        let ids: Vec<Uuid> = drafts.iter().map(|c| c.id).collect();

        let mut repo = MockCourseRepository::new();
        repo.expect_find_many()
            .returning(move |_| Ok(drafts.clone()));
        repo.expect_save_all()
            .withf(|courses| {
                courses.iter().all(|c| {
                    c.status == CourseStatus::Archived
                        && c.published_by.is_none()
                        && c.published_at.is_none()
                })
            })
            .returning(|courses| Ok(courses.len() as u32));

        let service = CourseManager::new(Arc::new(repo));
        let outcome = service
            .bulk_update_status(ids, CourseStatus::Archived, "Ana Admin")
            .await
            .unwrap();

        assert_eq!(outcome.updated, 2);
    }

    #[tokio::test]
    async fn test_bulk_skips_illegal_and_unknown() {
        let review = course("Portuguese B1", CourseStatus::Review);
        let draft = course("Portuguese A1", CourseStatus::Draft);
        let ids = vec![review.id, draft.id, Uuid::new_v4(), draft.id];
        let found = vec![review, draft];

        let mut repo = MockCourseRepository::new();
        repo.expect_find_many()
            .withf(|ids| ids.len() == 3)
            .returning(move |_| Ok(found.clone()));
        repo.expect_save_all()
            .withf(|courses| courses.len() == 1 && courses[0].status == CourseStatus::Archived)
            .returning(|courses| Ok(courses.len() as u32));

        let service = CourseManager::new(Arc::new(repo));
        let outcome = service
            .bulk_update_status(ids, CourseStatus::Archived, "admin")
            .await
            .unwrap();

        assert_eq!(outcome, BulkStatusOutcome { updated: 1, skipped: 2 });
    }

    #[tokio::test]
    async fn test_bulk_requires_ids() {
        let repo = MockCourseRepository::new();
        let service = CourseManager::new(Arc::new(repo));

        let result = service
            .bulk_update_status(vec![], CourseStatus::Published, "admin")
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_stats_fill_missing_statuses_with_zero() {
        let mut repo = MockCourseRepository::new();
        repo.expect_count_by_status().returning(|| {
            Ok(vec![
                (CourseStatus::Draft, 4),
                (CourseStatus::Published, 2),
            ])
        });

        let service = CourseManager::new(Arc::new(repo));
        let stats = service.stats().await.unwrap();

        assert_eq!(stats.draft, 4);
        assert_eq!(stats.review, 0);
        assert_eq!(stats.published, 2);
        assert_eq!(stats.archived, 0);
        assert_eq!(stats.total, 6);
    }
}
