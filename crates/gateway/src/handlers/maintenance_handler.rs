//! Ledger maintenance handlers (admin only).

use axum::{extract::State, response::Json, routing::post, Extension, Router};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use common::AppResult;
use domain::RejournalizeReport;

use crate::extractors::ValidatedJson;
use crate::middleware::{require_admin, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RejournalizeRequest {
    /// Compute the rebuild and roll it back
    #[serde(default)]
    pub dry_run: bool,
}

/// Create maintenance routes
pub fn maintenance_routes() -> Router<AppState> {
    Router::new().route("/rejournalize", post(rejournalize))
}

/// Rebuild every system-generated journal entry from its source document
#[utoipa::path(
    post,
    path = "/maintenance/rejournalize",
    tag = "Maintenance",
    security(("bearer_auth" = [])),
    request_body = RejournalizeRequest,
    responses(
        (status = 200, description = "Rebuild report", body = RejournalizeReport),
        (status = 403, description = "Admin access required"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn rejournalize(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<RejournalizeRequest>,
) -> AppResult<Json<RejournalizeReport>> {
    require_admin(&current_user)?;

    info!(
        user = %current_user.email,
        dry_run = payload.dry_run,
        "Rejournalize requested"
    );

    let report = state.ledger.rejournalize(payload.dry_run).await?;
    if !report.dry_run {
        state.cache.invalidate_accounts().await;
    }
    Ok(Json(report))
}
