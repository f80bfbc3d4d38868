//! gRPC implementation for CourseService.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use uuid::Uuid;

use common::AppError;
use domain::{CourseStatus, NewCourse};
use proto::course::{
    course_service_server::CourseService as CourseServiceProto, BulkUpdateStatusRequest,
    BulkUpdateStatusResponse, Course, CourseStats, CreateCourseRequest, GetCourseRequest,
    GetStatsRequest, ListCoursesRequest, ListCoursesResponse, UpdateStatusRequest,
};

use crate::service::CourseService;

/// gRPC service wrapper for CourseService.
pub struct CourseGrpcService {
    service: Arc<dyn CourseService>,
}

impl CourseGrpcService {
    /// Create a new gRPC service wrapper.
    pub fn new(service: Arc<dyn CourseService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl CourseServiceProto for CourseGrpcService {
    async fn create_course(
        &self,
        request: Request<CreateCourseRequest>,
    ) -> Result<Response<Course>, Status> {
        let req = request.into_inner();

        let course = self
            .service
            .create_course(NewCourse {
                title: req.title,
                slug: req.slug,
            })
            .await
            .map_err(Status::from)?;
        Ok(Response::new(course_to_proto(&course)))
    }

    async fn get_course(
        &self,
        request: Request<GetCourseRequest>,
    ) -> Result<Response<Course>, Status> {
        let req = request.into_inner();
        let id = parse_uuid(&req.id)?;

        let course = self.service.get_course(id).await.map_err(Status::from)?;
        Ok(Response::new(course_to_proto(&course)))
    }

    async fn list_courses(
        &self,
        request: Request<ListCoursesRequest>,
    ) -> Result<Response<ListCoursesResponse>, Status> {
        let req = request.into_inner();
        let status = req
            .status
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_status(&s))
            .transpose()?;

        let courses = self
            .service
            .list_courses(status)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(ListCoursesResponse {
            total: i32::try_from(courses.len()).unwrap_or(i32::MAX),
            courses: courses.iter().map(course_to_proto).collect(),
        }))
    }

    async fn update_status(
        &self,
        request: Request<UpdateStatusRequest>,
    ) -> Result<Response<Course>, Status> {
        let req = request.into_inner();
        let id = parse_uuid(&req.id)?;
        let status = parse_status(&req.status)?;

        let course = self
            .service
            .update_status(id, status, &req.actor)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(course_to_proto(&course)))
    }

    async fn bulk_update_status(
        &self,
        request: Request<BulkUpdateStatusRequest>,
    ) -> Result<Response<BulkUpdateStatusResponse>, Status> {
        let req = request.into_inner();
        let ids = req
            .ids
            .iter()
            .map(|id| parse_uuid(id))
            .collect::<Result<Vec<_>, _>>()?;
        let status = parse_status(&req.status)?;

        let outcome = self
            .service
            .bulk_update_status(ids, status, &req.actor)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(BulkUpdateStatusResponse {
            updated: outcome.updated,
            skipped: outcome.skipped,
        }))
    }

    async fn get_stats(
        &self,
        _request: Request<GetStatsRequest>,
    ) -> Result<Response<CourseStats>, Status> {
        let stats = self.service.stats().await.map_err(Status::from)?;

        Ok(Response::new(CourseStats {
            draft: stats.draft,
            review: stats.review,
            published: stats.published,
            archived: stats.archived,
            total: stats.total,
        }))
    }
}

/// Parse UUID from string.
fn parse_uuid(s: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(s).map_err(|_| Status::invalid_argument("Invalid UUID format"))
}

fn parse_status(s: &str) -> Result<CourseStatus, Status> {
    s.parse::<CourseStatus>()
        .map_err(|e| Status::from(AppError::from(e)))
}

fn course_to_proto(course: &domain::Course) -> Course {
    Course {
        id: course.id.to_string(),
        title: course.title.clone(),
        slug: course.slug.clone(),
        status: course.status.to_string(),
        published_at: course.published_at.map(|dt| dt.to_rfc3339()),
        published_by: course.published_by.clone(),
        created_at: course.created_at.to_rfc3339(),
        updated_at: course.updated_at.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::CourseService;
    use async_trait::async_trait;
    use common::AppResult;
    use domain::BulkStatusOutcome;

    struct RecordingService;

    #[async_trait]
    impl CourseService for RecordingService {
        async fn create_course(&self, _course: NewCourse) -> AppResult<domain::Course> {
            Err(AppError::internal("unused"))
        }

        async fn get_course(&self, _id: Uuid) -> AppResult<domain::Course> {
            Err(AppError::NotFound("Course".to_string()))
        }

        async fn list_courses(
            &self,
            _status: Option<CourseStatus>,
        ) -> AppResult<Vec<domain::Course>> {
            Ok(vec![])
        }

        async fn update_status(
            &self,
            _id: Uuid,
            _status: CourseStatus,
            _actor: &str,
        ) -> AppResult<domain::Course> {
            Err(AppError::internal("unused"))
        }

        async fn bulk_update_status(
            &self,
            ids: Vec<Uuid>,
            _status: CourseStatus,
            _actor: &str,
        ) -> AppResult<BulkStatusOutcome> {
            Ok(BulkStatusOutcome {
                updated: ids.len() as u32,
                skipped: 0,
            })
        }

        async fn stats(&self) -> AppResult<domain::CourseStats> {
            Ok(domain::CourseStats::default())
        }
    }

    fn grpc() -> CourseGrpcService {
        CourseGrpcService::new(Arc::new(RecordingService))
    }

    #[tokio::test]
    async fn test_unknown_status_is_invalid_argument() {
        let result = grpc()
            .update_status(Request::new(UpdateStatusRequest {
                id: Uuid::new_v4().to_string(),
                status: "retired".to_string(),
                actor: "admin".to_string(),
            }))
            .await;

        assert_eq!(result.unwrap_err().code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_bulk_rejects_malformed_id() {
        let result = grpc()
            .bulk_update_status(Request::new(BulkUpdateStatusRequest {
                ids: vec![Uuid::new_v4().to_string(), "not-a-uuid".to_string()],
                status: "published".to_string(),
                actor: "admin".to_string(),
            }))
            .await;

        assert_eq!(result.unwrap_err().code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_empty_status_filter_lists_everything() {
        let response = grpc()
            .list_courses(Request::new(ListCoursesRequest {
                status: Some(String::new()),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.total, 0);
    }

    #[tokio::test]
    async fn test_missing_course_maps_to_not_found() {
        let result = grpc()
            .get_course(Request::new(GetCourseRequest {
                id: Uuid::new_v4().to_string(),
            }))
            .await;

        assert_eq!(result.unwrap_err().code(), tonic::Code::NotFound);
    }
}
