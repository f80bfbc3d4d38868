//! Manual journal entry handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{JournalEntry, MAX_AMOUNT_CENTS};
use proto::ledger as pb;

use crate::extractors::ValidatedJson;
use crate::handlers::date_string;
use crate::middleware::{require_admin, CurrentUser};
use crate::state::AppState;

/// One side of a manual entry. Exactly one of debit or credit is non-zero.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct JournalLineRequest {
    pub account_id: Uuid,
    #[validate(range(
        min = 0,
        max = MAX_AMOUNT_CENTS,
        message = "Debit must be between 0 and the maximum amount"
    ))]
    #[serde(default)]
    #[schema(example = 15000)]
    pub debit: i64,
    #[validate(range(
        min = 0,
        max = MAX_AMOUNT_CENTS,
        message = "Credit must be between 0 and the maximum amount"
    ))]
    #[serde(default)]
    pub credit: i64,
    pub description: Option<String>,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
}

impl From<JournalLineRequest> for pb::JournalLine {
    fn from(line: JournalLineRequest) -> Self {
        Self {
            account_id: line.account_id.to_string(),
            debit: line.debit,
            credit: line.credit,
            description: line.description,
            customer_id: line.customer_id.map(|id| id.to_string()),
            supplier_id: line.supplier_id.map(|id| id.to_string()),
        }
    }
}

/// Manual journal entry. Debits must equal credits.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateJournalEntryRequest {
    pub entry_date: NaiveDate,
    #[schema(example = "Owner contribution")]
    pub memo: Option<String>,
    #[serde(default)]
    pub is_adjusting: bool,
    #[validate(
        length(min = 2, message = "A journal entry needs at least two lines"),
        nested
    )]
    pub lines: Vec<JournalLineRequest>,
}

impl From<CreateJournalEntryRequest> for pb::CreateJournalEntryRequest {
    fn from(req: CreateJournalEntryRequest) -> Self {
        Self {
            entry_date: date_string(req.entry_date),
            memo: req.memo,
            is_adjusting: req.is_adjusting,
            lines: req.lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReverseJournalEntryRequest {
    pub reason: Option<String>,
    /// Defaults to today
    pub entry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Create journal entry routes
pub fn journal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_journal_entries).post(create_journal_entry))
        .route("/:id", get(get_journal_entry))
        .route("/:id/reverse", post(reverse_journal_entry))
}

/// List journal entries, newest first
#[utoipa::path(
    get,
    path = "/journal-entries",
    tag = "Journal",
    security(("bearer_auth" = [])),
    params(DateRangeQuery),
    responses((status = 200, description = "Journal entries", body = Vec<JournalEntry>))
)]
pub async fn list_journal_entries(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let entries = state
        .ledger
        .list_journal_entries(query.start_date, query.end_date)
        .await?;
    Ok(Json(entries))
}

/// Post a manual journal entry
#[utoipa::path(
    post,
    path = "/journal-entries",
    tag = "Journal",
    security(("bearer_auth" = [])),
    request_body = CreateJournalEntryRequest,
    responses(
        (status = 201, description = "Entry posted", body = JournalEntry),
        (status = 400, description = "Entry does not balance")
    )
)]
pub async fn create_journal_entry(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateJournalEntryRequest>,
) -> AppResult<(StatusCode, Json<JournalEntry>)> {
    let entry = state.ledger.create_journal_entry(payload.into()).await?;
    state.cache.invalidate_accounts().await;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Get a journal entry with its lines
#[utoipa::path(
    get,
    path = "/journal-entries/{id}",
    tag = "Journal",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Journal entry ID")),
    responses(
        (status = 200, description = "Journal entry", body = JournalEntry),
        (status = 404, description = "Journal entry not found")
    )
)]
pub async fn get_journal_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<JournalEntry>> {
    Ok(Json(state.ledger.get_journal_entry(id).await?))
}

/// Post the mirror image of an entry (admin only)
#[utoipa::path(
    post,
    path = "/journal-entries/{id}/reverse",
    tag = "Journal",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Journal entry ID")),
    request_body = ReverseJournalEntryRequest,
    responses(
        (status = 201, description = "Reversing entry posted", body = JournalEntry),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Journal entry not found")
    )
)]
pub async fn reverse_journal_entry(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReverseJournalEntryRequest>,
) -> AppResult<(StatusCode, Json<JournalEntry>)> {
    require_admin(&current_user)?;

    let entry = state
        .ledger
        .reverse_journal_entry(id, payload.reason, payload.entry_date)
        .await?;
    state.cache.invalidate_accounts().await;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(debit: i64, credit: i64) -> JournalLineRequest {
        JournalLineRequest {
            account_id: Uuid::new_v4(),
            debit,
            credit,
            description: None,
            customer_id: None,
            supplier_id: None,
        }
    }

    fn entry(lines: Vec<JournalLineRequest>) -> CreateJournalEntryRequest {
        CreateJournalEntryRequest {
            entry_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            memo: None,
            is_adjusting: false,
            lines,
        }
    }

    #[test]
    fn test_single_line_entry_rejected() {
        assert!(entry(vec![line(100, 0)]).validate().is_err());
    }

    #[test]
    fn test_negative_line_rejected() {
        assert!(entry(vec![line(-100, 0), line(0, -100)]).validate().is_err());
    }

    #[test]
    fn test_entry_converts_lines() {
        let request = pb::CreateJournalEntryRequest::from(entry(vec![line(100, 0), line(0, 100)]));
        assert_eq!(request.entry_date, "2025-03-31");
        assert_eq!(request.lines.len(), 2);
        assert_eq!(request.lines[0].debit, 100);
        assert_eq!(request.lines[1].credit, 100);
    }
}
