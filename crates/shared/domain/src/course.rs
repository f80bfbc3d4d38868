//! Course entity and its publishing lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

labelled_enum! {
    /// Publishing state of a course.
    pub enum CourseStatus {
        Draft => "draft",
        Review => "review",
        Published => "published",
        Archived => "archived",
    }
}

impl Default for CourseStatus {
    fn default() -> Self {
        CourseStatus::Draft
    }
}

impl CourseStatus {
    /// Whether a course may move from `self` to `target`.
    ///
    /// Staying in the same status is not a transition.
    pub fn can_transition_to(&self, target: CourseStatus) -> bool {
        use CourseStatus::*;

        matches!(
            (self, target),
            (Draft, Review)
                | (Draft, Published)
                | (Draft, Archived)
                | (Review, Draft)
                | (Review, Published)
                | (Published, Draft)
                | (Published, Archived)
                | (Archived, Draft)
                | (Archived, Published)
        )
    }
}

/// Course domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub status: CourseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn new(id: Uuid, title: String, slug: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            slug,
            status: CourseStatus::Draft,
            published_at: None,
            published_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `target`, refusing transitions outside the lifecycle.
    pub fn transition(&mut self, target: CourseStatus, actor: &str, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::validation(format!(
                "Cannot change course status from {} to {}",
                self.status, target
            )));
        }

        let fields = PublishFields::for_target(target, actor, now);
        self.status = target;
        fields.apply(self);
        self.updated_at = now;
        Ok(())
    }
}

/// Publication stamp written when a course becomes published.
///
/// Other targets leave any earlier stamp in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishFields {
    pub published_at: Option<DateTime<Utc>>,
    pub published_by: Option<String>,
}

impl PublishFields {
    pub fn for_target(target: CourseStatus, actor: &str, now: DateTime<Utc>) -> Self {
        if target == CourseStatus::Published {
            Self {
                published_at: Some(now),
                published_by: Some(actor.to_string()),
            }
        } else {
            Self {
                published_at: None,
                published_by: None,
            }
        }
    }

    pub fn apply(&self, course: &mut Course) {
        if self.published_at.is_some() {
            course.published_at = self.published_at;
        }
        if self.published_by.is_some() {
            course.published_by = self.published_by.clone();
        }
    }
}

/// Course creation data
#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub slug: String,
}

impl NewCourse {
    pub fn into_course(self, id: Uuid) -> DomainResult<Course> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("Course title is required"));
        }
        let slug = self.slug.trim().to_lowercase();
        if slug.is_empty() {
            return Err(DomainError::validation("Course slug is required"));
        }
        Ok(Course::new(id, title, slug))
    }
}

/// Result of a bulk status change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BulkStatusOutcome {
    pub updated: u32,
    pub skipped: u32,
}

/// Course counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CourseStats {
    pub draft: u64,
    pub review: u64,
    pub published: u64,
    pub archived: u64,
    pub total: u64,
}

impl CourseStats {
    pub fn record(&mut self, status: CourseStatus, count: u64) {
        match status {
            CourseStatus::Draft => self.draft += count,
            CourseStatus::Review => self.review += count,
            CourseStatus::Published => self.published += count,
            CourseStatus::Archived => self.archived += count,
        }
        self.total += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(CourseStatus::default(), CourseStatus::Draft);
        assert_eq!("review".parse::<CourseStatus>().unwrap(), CourseStatus::Review);
        assert!("live".parse::<CourseStatus>().is_err());
    }

    #[test]
    fn test_publish_stamps_actor() {
        let mut course = Course::new(Uuid::new_v4(), "Spanish A1".into(), "spanish-a1".into());
        let now = Utc::now();
        course.transition(CourseStatus::Published, "Ana Admin", now).unwrap();
        assert_eq!(course.published_by.as_deref(), Some("Ana Admin"));
        assert_eq!(course.published_at, Some(now));

        // Unpublishing keeps the earlier stamp.
        course.transition(CourseStatus::Draft, "Someone Else", Utc::now()).unwrap();
        assert_eq!(course.published_by.as_deref(), Some("Ana Admin"));
    }

    #[test]
    fn test_illegal_transition_leaves_course_untouched() {
        let mut course = Course::new(Uuid::new_v4(), "French B2".into(), "french-b2".into());
        course.transition(CourseStatus::Review, "admin", Utc::now()).unwrap();
        let err = course.transition(CourseStatus::Archived, "admin", Utc::now());
        assert!(matches!(err, Err(DomainError::Validation(_))));
        assert_eq!(course.status, CourseStatus::Review);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = CourseStats::default();
        stats.record(CourseStatus::Draft, 3);
        stats.record(CourseStatus::Published, 2);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.review, 0);
    }
}
