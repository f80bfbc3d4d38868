//! Course catalogue handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{BulkStatusOutcome, Course, CourseStats, CourseStatus};

use crate::extractors::ValidatedJson;
use crate::middleware::{require_admin, CurrentUser};
use crate::state::AppState;

/// New course request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[schema(example = "Business Spanish A2")]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Slug must be 1-100 characters"))]
    #[schema(example = "business-spanish-a2")]
    pub slug: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "published")]
    pub status: CourseStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkStatusRequest {
    #[validate(length(min = 1, message = "No courses selected"))]
    pub ids: Vec<Uuid>,
    pub status: CourseStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseListQuery {
    #[param(value_type = Option<String>)]
    pub status: Option<CourseStatus>,
}

/// Create course routes
pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/stats", get(course_stats))
        .route("/bulk-status", post(bulk_update_status))
        .route("/:id", get(get_course))
        .route("/:id/status", put(update_status))
}

/// List courses, newest first
#[utoipa::path(
    get,
    path = "/courses",
    tag = "Courses",
    security(("bearer_auth" = [])),
    params(CourseListQuery),
    responses((status = 200, description = "Courses", body = Vec<Course>))
)]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<CourseListQuery>,
) -> AppResult<Json<Vec<Course>>> {
    Ok(Json(state.courses.list_courses(query.status).await?))
}

/// Create a draft course
#[utoipa::path(
    post,
    path = "/courses",
    tag = "Courses",
    security(("bearer_auth" = [])),
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 409, description = "Slug already in use")
    )
)]
pub async fn create_course(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCourseRequest>,
) -> AppResult<(StatusCode, Json<Course>)> {
    let course = state
        .courses
        .create_course(payload.title, payload.slug)
        .await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// Get a course
#[utoipa::path(
    get,
    path = "/courses/{id}",
    tag = "Courses",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course", body = Course),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Course>> {
    Ok(Json(state.courses.get_course(id).await?))
}

/// Course counts per status
#[utoipa::path(
    get,
    path = "/courses/stats",
    tag = "Courses",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Course statistics", body = CourseStats))
)]
pub async fn course_stats(State(state): State<AppState>) -> AppResult<Json<CourseStats>> {
    Ok(Json(state.courses.stats().await?))
}

/// Move a course to a new status (admin only)
#[utoipa::path(
    put,
    path = "/courses/{id}/status",
    tag = "Courses",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Transition not allowed")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<Course>> {
    require_admin(&current_user)?;

    let course = state
        .courses
        .update_status(id, payload.status, current_user.display_name())
        .await?;
    Ok(Json(course))
}

/// Move many courses to a new status (admin only)
#[utoipa::path(
    post,
    path = "/courses/bulk-status",
    tag = "Courses",
    security(("bearer_auth" = [])),
    request_body = BulkStatusRequest,
    responses(
        (status = 200, description = "Bulk update outcome", body = BulkStatusOutcome),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn bulk_update_status(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<BulkStatusRequest>,
) -> AppResult<Json<BulkStatusOutcome>> {
    require_admin(&current_user)?;

    let outcome = state
        .courses
        .bulk_update_status(&payload.ids, payload.status, current_user.display_name())
        .await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_status_requires_ids() {
        let request = BulkStatusRequest {
            ids: Vec::new(),
            status: CourseStatus::Published,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_status_parses_from_label() {
        let request: UpdateStatusRequest =
            serde_json::from_value(serde_json::json!({ "status": "archived" })).unwrap();
        assert_eq!(request.status, CourseStatus::Archived);

        let bad = serde_json::from_value::<UpdateStatusRequest>(serde_json::json!({ "status": "live" }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_empty_slug_rejected() {
        let request = CreateCourseRequest {
            title: "Business Spanish A2".to_string(),
            slug: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
