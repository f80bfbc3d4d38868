//! Bank feed, bank rule and reconciliation handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{BankRule, BankTransaction, BankTransactionStatus, Money, Reconciliation};
use proto::ledger as pb;

use crate::clients::{ImportSummary, RuleRunSummary, WorkspaceView};
use crate::extractors::ValidatedJson;
use crate::handlers::date_string;
use crate::state::AppState;

// =============================================================================
// Bank feed
// =============================================================================

/// One row of a bank or card statement. Positive amounts are deposits.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ImportedRowRequest {
    pub transaction_date: NaiveDate,
    #[validate(length(min = 1, message = "Description is required"))]
    #[schema(example = "STAPLES #1123")]
    pub description: String,
    #[schema(example = -4599)]
    pub amount: i64,
    /// Institution's transaction id. Derived from date, amount and description when absent.
    pub fit_id: Option<String>,
}

impl From<ImportedRowRequest> for pb::ImportedRow {
    fn from(row: ImportedRowRequest) -> Self {
        Self {
            transaction_date: date_string(row.transaction_date),
            description: row.description,
            amount: row.amount,
            fit_id: row.fit_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ImportBankTransactionsRequest {
    pub account_id: Uuid,
    #[validate(length(min = 1, message = "Nothing to import"), nested)]
    pub rows: Vec<ImportedRowRequest>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategorizeRequest {
    pub category_account_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetReconciledRequest {
    pub reconciled: bool,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ApplyRulesRequest {
    /// Limit the run to one bank account
    pub account_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BankTransactionQuery {
    pub account_id: Option<Uuid>,
    #[param(value_type = Option<String>)]
    pub status: Option<BankTransactionStatus>,
}

// =============================================================================
// Rules
// =============================================================================

/// Rule condition. `field` is `description` or `amount`; `operator` is one of
/// `contains`, `equals`, `startsWith`, `greaterThan`, `lessThan`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RuleConditionRequest {
    #[validate(length(min = 1, message = "Condition field is required"))]
    #[schema(example = "description")]
    pub field: String,
    #[validate(length(min = 1, message = "Condition operator is required"))]
    #[schema(example = "contains")]
    pub operator: String,
    #[schema(example = "STAPLES")]
    pub value: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BankRuleRequest {
    #[validate(length(min = 1, message = "Rule name is required"))]
    #[schema(example = "Office supplies")]
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    #[validate(length(min = 1, message = "A rule needs at least one condition"), nested)]
    pub conditions: Vec<RuleConditionRequest>,
    pub assign_account_id: Option<Uuid>,
    pub assign_category: Option<String>,
    pub assign_payee: Option<String>,
    #[serde(default)]
    pub auto_confirm: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl From<BankRuleRequest> for pb::BankRuleInput {
    fn from(req: BankRuleRequest) -> Self {
        Self {
            name: req.name,
            priority: req.priority,
            conditions: req
                .conditions
                .into_iter()
                .map(|c| pb::RuleCondition {
                    field: c.field,
                    operator: c.operator,
                    value: c.value,
                })
                .collect(),
            assign_account_id: req.assign_account_id.map(|id| id.to_string()),
            assign_category: req.assign_category,
            assign_payee: req.assign_payee,
            auto_confirm: req.auto_confirm,
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub deleted: bool,
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Statement figures for a reconciliation. Balance is in cents.
#[derive(Debug, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatementRequest {
    pub account_id: Uuid,
    pub statement_date: NaiveDate,
    #[schema(example = 254300)]
    pub statement_balance: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReconciliationListQuery {
    pub account_id: Option<Uuid>,
}

/// Create bank feed routes
pub fn bank_transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bank_transactions))
        .route("/import", post(import_bank_transactions))
        .route("/apply-rules", post(apply_bank_rules))
        .route("/:id/categorize", post(categorize_bank_transaction))
        .route("/:id/exclude", post(exclude_bank_transaction))
        .route("/:id/reconciled", put(set_reconciled))
}

/// Create bank rule routes
pub fn bank_rule_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bank_rules).post(create_bank_rule))
        .route("/:id", put(update_bank_rule).delete(delete_bank_rule))
}

/// Create reconciliation routes
pub fn reconciliation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reconciliations).post(start_reconciliation))
        .route("/workspace", get(reconciliation_workspace))
        .route("/:id/finish", post(finish_reconciliation))
}

/// List imported bank transactions
#[utoipa::path(
    get,
    path = "/bank/transactions",
    tag = "Banking",
    security(("bearer_auth" = [])),
    params(BankTransactionQuery),
    responses((status = 200, description = "Bank transactions", body = Vec<BankTransaction>))
)]
pub async fn list_bank_transactions(
    State(state): State<AppState>,
    Query(query): Query<BankTransactionQuery>,
) -> AppResult<Json<Vec<BankTransaction>>> {
    let transactions = state
        .ledger
        .list_bank_transactions(
            query.account_id,
            query.status.map(|s| s.as_str().to_string()),
        )
        .await?;
    Ok(Json(transactions))
}

/// Import statement rows, skipping ones already imported
#[utoipa::path(
    post,
    path = "/bank/transactions/import",
    tag = "Banking",
    security(("bearer_auth" = [])),
    request_body = ImportBankTransactionsRequest,
    responses(
        (status = 200, description = "Import summary", body = ImportSummary),
        (status = 404, description = "Account not found")
    )
)]
pub async fn import_bank_transactions(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ImportBankTransactionsRequest>,
) -> AppResult<Json<ImportSummary>> {
    let rows = payload.rows.into_iter().map(Into::into).collect();
    let summary = state
        .ledger
        .import_bank_transactions(payload.account_id, rows)
        .await?;
    Ok(Json(summary))
}

/// Categorize a transaction and post it
#[utoipa::path(
    post,
    path = "/bank/transactions/{id}/categorize",
    tag = "Banking",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Bank transaction ID")),
    request_body = CategorizeRequest,
    responses(
        (status = 200, description = "Transaction categorized", body = BankTransaction),
        (status = 404, description = "Transaction or account not found")
    )
)]
pub async fn categorize_bank_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CategorizeRequest>,
) -> AppResult<Json<BankTransaction>> {
    let transaction = state
        .ledger
        .categorize_bank_transaction(id, payload.category_account_id)
        .await?;
    state.cache.invalidate_accounts().await;
    Ok(Json(transaction))
}

/// Exclude a transaction from the books
#[utoipa::path(
    post,
    path = "/bank/transactions/{id}/exclude",
    tag = "Banking",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Bank transaction ID")),
    responses(
        (status = 200, description = "Transaction excluded", body = BankTransaction),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn exclude_bank_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BankTransaction>> {
    let transaction = state.ledger.exclude_bank_transaction(id).await?;
    state.cache.invalidate_accounts().await;
    Ok(Json(transaction))
}

/// Mark a transaction cleared or uncleared in the reconciliation workspace
#[utoipa::path(
    put,
    path = "/bank/transactions/{id}/reconciled",
    tag = "Reconciliation",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Bank transaction ID")),
    request_body = SetReconciledRequest,
    responses(
        (status = 200, description = "Transaction updated", body = BankTransaction),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn set_reconciled(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SetReconciledRequest>,
) -> AppResult<Json<BankTransaction>> {
    let transaction = state.ledger.toggle_reconciled(id, payload.reconciled).await?;
    Ok(Json(transaction))
}

/// Run active rules over transactions waiting for review
#[utoipa::path(
    post,
    path = "/bank/transactions/apply-rules",
    tag = "Banking",
    security(("bearer_auth" = [])),
    request_body = ApplyRulesRequest,
    responses((status = 200, description = "Rule run summary", body = RuleRunSummary))
)]
pub async fn apply_bank_rules(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ApplyRulesRequest>,
) -> AppResult<Json<RuleRunSummary>> {
    let summary = state.ledger.apply_bank_rules(payload.account_id).await?;
    if summary.matched > 0 {
        state.cache.invalidate_accounts().await;
    }
    Ok(Json(summary))
}

/// List bank rules in evaluation order
#[utoipa::path(
    get,
    path = "/bank/rules",
    tag = "Banking",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Bank rules", body = Vec<BankRule>))
)]
pub async fn list_bank_rules(State(state): State<AppState>) -> AppResult<Json<Vec<BankRule>>> {
    Ok(Json(state.ledger.list_bank_rules().await?))
}

/// Create a bank rule
#[utoipa::path(
    post,
    path = "/bank/rules",
    tag = "Banking",
    security(("bearer_auth" = [])),
    request_body = BankRuleRequest,
    responses(
        (status = 201, description = "Rule created", body = BankRule),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_bank_rule(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<BankRuleRequest>,
) -> AppResult<(StatusCode, Json<BankRule>)> {
    let rule = state.ledger.create_bank_rule(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// Replace a bank rule
#[utoipa::path(
    put,
    path = "/bank/rules/{id}",
    tag = "Banking",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Rule ID")),
    request_body = BankRuleRequest,
    responses(
        (status = 200, description = "Rule updated", body = BankRule),
        (status = 404, description = "Rule not found")
    )
)]
pub async fn update_bank_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<BankRuleRequest>,
) -> AppResult<Json<BankRule>> {
    Ok(Json(state.ledger.update_bank_rule(id, payload.into()).await?))
}

/// Delete a bank rule
#[utoipa::path(
    delete,
    path = "/bank/rules/{id}",
    tag = "Banking",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Rule ID")),
    responses(
        (status = 200, description = "Rule deleted", body = DeleteResponse),
        (status = 404, description = "Rule not found")
    )
)]
pub async fn delete_bank_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    state.ledger.delete_bank_rule(id).await?;
    Ok(Json(DeleteResponse { deleted: true }))
}

/// Reconciliation workspace for a statement
#[utoipa::path(
    get,
    path = "/reconciliations/workspace",
    tag = "Reconciliation",
    security(("bearer_auth" = [])),
    params(StatementRequest),
    responses(
        (status = 200, description = "Workspace", body = WorkspaceView),
        (status = 404, description = "Account not found")
    )
)]
pub async fn reconciliation_workspace(
    State(state): State<AppState>,
    Query(query): Query<StatementRequest>,
) -> AppResult<Json<WorkspaceView>> {
    let workspace = state
        .ledger
        .reconciliation_workspace(
            query.account_id,
            query.statement_date,
            Money::from_cents(query.statement_balance),
        )
        .await?;
    Ok(Json(workspace))
}

/// List reconciliations, newest statement first
#[utoipa::path(
    get,
    path = "/reconciliations",
    tag = "Reconciliation",
    security(("bearer_auth" = [])),
    params(ReconciliationListQuery),
    responses((status = 200, description = "Reconciliations", body = Vec<Reconciliation>))
)]
pub async fn list_reconciliations(
    State(state): State<AppState>,
    Query(query): Query<ReconciliationListQuery>,
) -> AppResult<Json<Vec<Reconciliation>>> {
    Ok(Json(state.ledger.list_reconciliations(query.account_id).await?))
}

/// Start a reconciliation for a statement
#[utoipa::path(
    post,
    path = "/reconciliations",
    tag = "Reconciliation",
    security(("bearer_auth" = [])),
    request_body = StatementRequest,
    responses(
        (status = 201, description = "Reconciliation started", body = Reconciliation),
        (status = 404, description = "Account not found")
    )
)]
pub async fn start_reconciliation(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<StatementRequest>,
) -> AppResult<(StatusCode, Json<Reconciliation>)> {
    let reconciliation = state
        .ledger
        .start_reconciliation(
            payload.account_id,
            payload.statement_date,
            Money::from_cents(payload.statement_balance),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(reconciliation)))
}

/// Finish a reconciliation once the difference is zero
#[utoipa::path(
    post,
    path = "/reconciliations/{id}/finish",
    tag = "Reconciliation",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Reconciliation ID")),
    responses(
        (status = 200, description = "Reconciliation completed", body = Reconciliation),
        (status = 404, description = "Reconciliation not found"),
        (status = 409, description = "Difference is not zero or already completed")
    )
)]
pub async fn finish_reconciliation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Reconciliation>> {
    Ok(Json(state.ledger.finish_reconciliation(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(conditions: Vec<RuleConditionRequest>) -> BankRuleRequest {
        BankRuleRequest {
            name: "Office supplies".to_string(),
            priority: 10,
            conditions,
            assign_account_id: None,
            assign_category: Some("Office".to_string()),
            assign_payee: None,
            auto_confirm: false,
            is_active: true,
        }
    }

    fn contains(value: &str) -> RuleConditionRequest {
        RuleConditionRequest {
            field: "description".to_string(),
            operator: "contains".to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_rule_without_conditions_rejected() {
        assert!(rule(Vec::new()).validate().is_err());
    }

    #[test]
    fn test_rule_converts_conditions() {
        let input = pb::BankRuleInput::from(rule(vec![contains("STAPLES")]));
        assert_eq!(input.conditions.len(), 1);
        assert_eq!(input.conditions[0].operator, "contains");
        assert_eq!(input.assign_category.as_deref(), Some("Office"));
    }

    #[test]
    fn test_rule_defaults_to_active() {
        let rule: BankRuleRequest = serde_json::from_value(serde_json::json!({
            "name": "Fees",
            "conditions": [{ "field": "description", "operator": "contains", "value": "FEE" }]
        }))
        .unwrap();
        assert!(rule.is_active);
        assert!(!rule.auto_confirm);
        assert_eq!(rule.priority, 0);
    }

    #[test]
    fn test_import_requires_rows() {
        let request = ImportBankTransactionsRequest {
            account_id: Uuid::new_v4(),
            rows: Vec::new(),
        };
        assert!(request.validate().is_err());
    }
}
