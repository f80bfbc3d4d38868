//! Expense, bill and transfer handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use common::AppResult;
use domain::{
    Bill, BillPayment, BillStatus, Expense, ExpenseType, PayeeType, Transfer, MAX_AMOUNT_CENTS,
};
use proto::ledger as pb;

use crate::extractors::ValidatedJson;
use crate::handlers::date_string;
use crate::state::AppState;

/// Expense paid straight from a bank or card account. Amounts are in cents.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateExpenseRequest {
    /// Defaults to `Expense`
    pub expense_type: Option<ExpenseType>,
    /// Defaults to `other`
    pub payee_type: Option<PayeeType>,
    pub payee_id: Option<Uuid>,
    #[schema(example = "Office Depot")]
    pub payee_name: Option<String>,
    /// Category account. Falls back to Uncategorized Expense.
    pub account_id: Option<Uuid>,
    /// Bank or card account paid from. Falls back to the operating bank.
    pub payment_account_id: Option<Uuid>,
    pub expense_date: NaiveDate,
    #[validate(range(
        min = 0,
        max = MAX_AMOUNT_CENTS,
        message = "Subtotal must be between 0 and the maximum amount"
    ))]
    #[schema(example = 4500)]
    pub subtotal: i64,
    #[validate(range(
        min = 0,
        max = MAX_AMOUNT_CENTS,
        message = "Tax must be between 0 and the maximum amount"
    ))]
    #[serde(default)]
    pub tax_amount: i64,
    pub memo: Option<String>,
}

impl From<CreateExpenseRequest> for pb::CreateExpenseRequest {
    fn from(req: CreateExpenseRequest) -> Self {
        Self {
            expense_type: req.expense_type.map(|t| t.as_str().to_string()),
            payee_type: req.payee_type.map(|t| t.as_str().to_string()),
            payee_id: req.payee_id.map(|id| id.to_string()),
            payee_name: req.payee_name,
            account_id: req.account_id.map(|id| id.to_string()),
            payment_account_id: req.payment_account_id.map(|id| id.to_string()),
            expense_date: date_string(req.expense_date),
            subtotal: req.subtotal,
            tax_amount: req.tax_amount,
            memo: req.memo,
        }
    }
}

/// Supplier bill. Amounts are in cents.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBillRequest {
    #[schema(example = "INV-2231")]
    pub bill_number: Option<String>,
    pub supplier_id: Uuid,
    /// Expense account. Falls back to Uncategorized Expense.
    pub account_id: Option<Uuid>,
    pub bill_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    #[validate(range(
        min = 0,
        max = MAX_AMOUNT_CENTS,
        message = "Subtotal must be between 0 and the maximum amount"
    ))]
    #[schema(example = 60000)]
    pub subtotal: i64,
    #[validate(range(
        min = 0,
        max = MAX_AMOUNT_CENTS,
        message = "Tax must be between 0 and the maximum amount"
    ))]
    #[serde(default)]
    pub tax_amount: i64,
    pub memo: Option<String>,
}

impl From<CreateBillRequest> for pb::CreateBillRequest {
    fn from(req: CreateBillRequest) -> Self {
        Self {
            bill_number: req.bill_number,
            supplier_id: req.supplier_id.to_string(),
            account_id: req.account_id.map(|id| id.to_string()),
            bill_date: date_string(req.bill_date),
            due_date: req.due_date.map(date_string),
            subtotal: req.subtotal,
            tax_amount: req.tax_amount,
            memo: req.memo,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PayBillRequest {
    pub payment_account_id: Uuid,
    #[validate(range(
        min = 1,
        max = MAX_AMOUNT_CENTS,
        message = "Payment amount must be positive and within the maximum amount"
    ))]
    #[schema(example = 60000)]
    pub amount: i64,
    pub payment_date: NaiveDate,
}

impl PayBillRequest {
    fn into_proto(self, bill_id: Uuid) -> pb::PayBillRequest {
        pb::PayBillRequest {
            bill_id: bill_id.to_string(),
            payment_account_id: self.payment_account_id.to_string(),
            amount: self.amount,
            payment_date: date_string(self.payment_date),
        }
    }
}

/// Move money between two balance sheet accounts. Amount is in cents.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_transfer_accounts"))]
pub struct CreateTransferRequest {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    #[validate(range(
        min = 1,
        max = MAX_AMOUNT_CENTS,
        message = "Transfer amount must be positive and within the maximum amount"
    ))]
    #[schema(example = 100000)]
    pub amount: i64,
    pub transfer_date: NaiveDate,
    pub memo: Option<String>,
}

fn validate_transfer_accounts(req: &CreateTransferRequest) -> Result<(), ValidationError> {
    if req.from_account_id == req.to_account_id {
        let mut error = ValidationError::new("same_account");
        error.message = Some("Cannot transfer to the same account".into());
        return Err(error);
    }
    Ok(())
}

impl From<CreateTransferRequest> for pb::CreateTransferRequest {
    fn from(req: CreateTransferRequest) -> Self {
        Self {
            from_account_id: req.from_account_id.to_string(),
            to_account_id: req.to_account_id.to_string(),
            amount: req.amount,
            transfer_date: date_string(req.transfer_date),
            memo: req.memo,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BillListQuery {
    #[param(value_type = Option<String>)]
    pub status: Option<BillStatus>,
    pub supplier_id: Option<Uuid>,
}

/// Create expense routes
pub fn expense_routes() -> Router<AppState> {
    Router::new().route("/", get(list_expenses).post(create_expense))
}

/// Create bill routes
pub fn bill_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bills).post(create_bill))
        .route("/:id/payments", post(pay_bill))
}

/// Create transfer routes
pub fn transfer_routes() -> Router<AppState> {
    Router::new().route("/", get(list_transfers).post(create_transfer))
}

/// List expenses
#[utoipa::path(
    get,
    path = "/expenses",
    tag = "Purchases",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Expenses", body = Vec<Expense>))
)]
pub async fn list_expenses(State(state): State<AppState>) -> AppResult<Json<Vec<Expense>>> {
    Ok(Json(state.ledger.list_expenses().await?))
}

/// Record and post an expense
#[utoipa::path(
    post,
    path = "/expenses",
    tag = "Purchases",
    security(("bearer_auth" = [])),
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = Expense),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_expense(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateExpenseRequest>,
) -> AppResult<(StatusCode, Json<Expense>)> {
    let expense = state.ledger.create_expense(payload.into()).await?;
    state.cache.invalidate_accounts().await;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// List bills
#[utoipa::path(
    get,
    path = "/bills",
    tag = "Purchases",
    security(("bearer_auth" = [])),
    params(BillListQuery),
    responses((status = 200, description = "Bills", body = Vec<Bill>))
)]
pub async fn list_bills(
    State(state): State<AppState>,
    Query(query): Query<BillListQuery>,
) -> AppResult<Json<Vec<Bill>>> {
    let bills = state
        .ledger
        .list_bills(
            query.status.map(|s| s.as_str().to_string()),
            query.supplier_id,
        )
        .await?;
    Ok(Json(bills))
}

/// Enter and post a supplier bill
#[utoipa::path(
    post,
    path = "/bills",
    tag = "Purchases",
    security(("bearer_auth" = [])),
    request_body = CreateBillRequest,
    responses(
        (status = 201, description = "Bill entered", body = Bill),
        (status = 404, description = "Supplier not found")
    )
)]
pub async fn create_bill(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateBillRequest>,
) -> AppResult<(StatusCode, Json<Bill>)> {
    let bill = state.ledger.create_bill(payload.into()).await?;
    state.cache.invalidate_accounts().await;
    Ok((StatusCode::CREATED, Json(bill)))
}

/// Pay part or all of a bill
#[utoipa::path(
    post,
    path = "/bills/{id}/payments",
    tag = "Purchases",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Bill ID")),
    request_body = PayBillRequest,
    responses(
        (status = 201, description = "Bill payment recorded", body = BillPayment),
        (status = 400, description = "Amount exceeds the open balance"),
        (status = 404, description = "Bill not found"),
        (status = 409, description = "Bill is paid or voided")
    )
)]
pub async fn pay_bill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<PayBillRequest>,
) -> AppResult<(StatusCode, Json<BillPayment>)> {
    let payment = state.ledger.pay_bill(payload.into_proto(id)).await?;
    state.cache.invalidate_accounts().await;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// List transfers
#[utoipa::path(
    get,
    path = "/transfers",
    tag = "Purchases",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Transfers", body = Vec<Transfer>))
)]
pub async fn list_transfers(State(state): State<AppState>) -> AppResult<Json<Vec<Transfer>>> {
    Ok(Json(state.ledger.list_transfers().await?))
}

/// Record and post a transfer
#[utoipa::path(
    post,
    path = "/transfers",
    tag = "Purchases",
    security(("bearer_auth" = [])),
    request_body = CreateTransferRequest,
    responses(
        (status = 201, description = "Transfer recorded", body = Transfer),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_transfer(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateTransferRequest>,
) -> AppResult<(StatusCode, Json<Transfer>)> {
    let transfer = state.ledger.create_transfer(payload.into()).await?;
    state.cache.invalidate_accounts().await;
    Ok((StatusCode::CREATED, Json(transfer)))
}
