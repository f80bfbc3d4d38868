//! Health check handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use common::AppResult;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub services: ServiceStatus,
}

/// Individual service status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    pub redis: ServiceHealth,
    pub ledger_service: ServiceHealth,
    pub course_service: ServiceHealth,
}

/// Service health with optional error message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl From<AppResult<()>> for ServiceHealth {
    fn from(result: AppResult<()>) -> Self {
        match result {
            Ok(()) => Self {
                status: "healthy".to_string(),
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy".to_string(),
                error: Some(e.to_string()),
            },
        }
    }
}

impl ServiceStatus {
    fn all_healthy(&self) -> bool {
        self.redis.is_healthy() && self.ledger_service.is_healthy() && self.course_service.is_healthy()
    }
}

/// Create health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// Health check endpoint - verifies Redis and both backing services.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "All dependencies healthy", body = HealthResponse),
        (status = 503, description = "At least one dependency is down", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let (redis, ledger, courses) = futures::join!(
        state.cache.ping(),
        state.ledger.ping(),
        state.courses.ping()
    );

    let services = ServiceStatus {
        redis: redis.into(),
        ledger_service: ledger.into(),
        course_service: courses.into(),
    };
    let all_healthy = services.all_healthy();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        services,
    };

    if all_healthy {
        (StatusCode::OK, Json(response)).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AppError;

    #[test]
    fn test_one_failure_degrades() {
        let services = ServiceStatus {
            redis: Ok(()).into(),
            ledger_service: Err(AppError::ServiceUnavailable("ledger-service".to_string())).into(),
            course_service: Ok(()).into(),
        };
        assert!(!services.all_healthy());
        assert!(services.ledger_service.error.is_some());
        assert!(services.redis.error.is_none());
    }
}
