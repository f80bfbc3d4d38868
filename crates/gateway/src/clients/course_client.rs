//! gRPC client for course-service.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tonic::transport::{Channel, Endpoint};
use tracing::debug;
use uuid::Uuid;

use common::{AppError, AppResult, GrpcClientConfig};
use domain::{BulkStatusOutcome, Course, CourseStats, CourseStatus};
use proto::course::{
    course_service_client::CourseServiceClient as ProtoCourseClient, BulkUpdateStatusRequest,
    CreateCourseRequest, GetCourseRequest, GetStatsRequest, ListCoursesRequest,
    UpdateStatusRequest,
};

/// gRPC client wrapper for course-service.
pub struct CourseClient {
    client: ProtoCourseClient<Channel>,
}

impl CourseClient {
    /// Connect to course-service.
    pub async fn connect(config: &GrpcClientConfig) -> Result<Self, tonic::transport::Error> {
        debug!("Connecting to course-service at {}", config.endpoint);
        let channel = Endpoint::from_shared(config.endpoint.clone())?
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect()
            .await?;
        Ok(Self {
            client: ProtoCourseClient::new(channel),
        })
    }

    /// Round trip to course-service.
    pub async fn ping(&self) -> AppResult<()> {
        self.stats().await.map(|_| ())
    }

    /// Create a draft course.
    pub async fn create_course(&self, title: String, slug: String) -> AppResult<Course> {
        let request = tonic::Request::new(CreateCourseRequest { title, slug });

        let mut client = self.client.clone();
        let response = client.create_course(request).await.map_err(AppError::from)?;
        proto_to_course(response.into_inner())
    }

    /// Get course by ID.
    pub async fn get_course(&self, id: Uuid) -> AppResult<Course> {
        let request = tonic::Request::new(GetCourseRequest { id: id.to_string() });

        let mut client = self.client.clone();
        let response = client.get_course(request).await.map_err(AppError::from)?;
        proto_to_course(response.into_inner())
    }

    /// List courses, newest first.
    pub async fn list_courses(&self, status: Option<CourseStatus>) -> AppResult<Vec<Course>> {
        let request = tonic::Request::new(ListCoursesRequest {
            status: status.map(|s| s.as_str().to_string()),
        });

        let mut client = self.client.clone();
        let response = client.list_courses(request).await.map_err(AppError::from)?;

        response
            .into_inner()
            .courses
            .into_iter()
            .map(proto_to_course)
            .collect()
    }

    /// Move a course to a new status on behalf of `actor`.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: CourseStatus,
        actor: &str,
    ) -> AppResult<Course> {
        let request = tonic::Request::new(UpdateStatusRequest {
            id: id.to_string(),
            status: status.as_str().to_string(),
            actor: actor.to_string(),
        });

        let mut client = self.client.clone();
        let response = client.update_status(request).await.map_err(AppError::from)?;
        proto_to_course(response.into_inner())
    }

    /// Move many courses to a new status.
    pub async fn bulk_update_status(
        &self,
        ids: &[Uuid],
        status: CourseStatus,
        actor: &str,
    ) -> AppResult<BulkStatusOutcome> {
        let request = tonic::Request::new(BulkUpdateStatusRequest {
            ids: ids.iter().map(Uuid::to_string).collect(),
            status: status.as_str().to_string(),
            actor: actor.to_string(),
        });

        let mut client = self.client.clone();
        let response = client
            .bulk_update_status(request)
            .await
            .map_err(AppError::from)?
            .into_inner();

        Ok(BulkStatusOutcome {
            updated: response.updated,
            skipped: response.skipped,
        })
    }

    /// Course counts per status.
    pub async fn stats(&self) -> AppResult<CourseStats> {
        let request = tonic::Request::new(GetStatsRequest {});

        let mut client = self.client.clone();
        let stats = client
            .get_stats(request)
            .await
            .map_err(AppError::from)?
            .into_inner();

        Ok(CourseStats {
            draft: stats.draft,
            review: stats.review,
            published: stats.published,
            archived: stats.archived,
            total: stats.total,
        })
    }
}

fn parse_timestamp(value: &str, field: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::internal(format!("Invalid {} from course-service", field)))
}

/// Convert proto Course to domain Course.
fn proto_to_course(proto: proto::course::Course) -> AppResult<Course> {
    let id = proto
        .id
        .parse()
        .map_err(|_| AppError::internal("Invalid UUID from course-service"))?;

    let status = proto
        .status
        .parse()
        .map_err(|_| AppError::internal("Invalid status from course-service"))?;

    let published_at = proto
        .published_at
        .map(|dt| parse_timestamp(&dt, "published_at"))
        .transpose()?;

    Ok(Course {
        id,
        title: proto.title,
        slug: proto.slug,
        status,
        published_at,
        published_by: proto.published_by,
        created_at: parse_timestamp(&proto.created_at, "created_at")?,
        updated_at: parse_timestamp(&proto.updated_at, "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proto_course(status: &str, published_at: Option<&str>) -> proto::course::Course {
        proto::course::Course {
            id: Uuid::new_v4().to_string(),
            title: "Spanish A1".to_string(),
            slug: "spanish-a1".to_string(),
            status: status.to_string(),
            published_at: published_at.map(str::to_string),
            published_by: published_at.map(|_| "Ana Admin".to_string()),
            created_at: "2025-01-10T08:00:00Z".to_string(),
            updated_at: "2025-01-12T08:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_published_course_converts() {
        let course =
            proto_to_course(proto_course("published", Some("2025-01-12T08:00:00Z"))).unwrap();

        assert_eq!(course.status, CourseStatus::Published);
        assert_eq!(course.published_by.as_deref(), Some("Ana Admin"));
        assert!(course.published_at.is_some());
    }

    #[test]
    fn test_unknown_status_is_internal_error() {
        let result = proto_to_course(proto_course("retired", None));
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
