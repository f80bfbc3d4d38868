//! Invoice and payment handlers.

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
use validator::Validate;

use common::AppResult;
use domain::{Invoice, InvoiceStatus, Payment, MAX_AMOUNT_CENTS};
use proto::ledger as pb;

use crate::extractors::ValidatedJson;
use crate::handlers::date_string;
use crate::state::AppState;

/// New invoice request. Amounts are in cents.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "Invoice number is required"))]
    #[schema(example = "1001")]
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    #[validate(range(
        min = 0,
        max = MAX_AMOUNT_CENTS,
        message = "Subtotal must be between 0 and the maximum amount"
    ))]
    #[schema(example = 25000)]
    pub subtotal: i64,
    #[validate(range(
        min = 0,
        max = MAX_AMOUNT_CENTS,
        message = "Tax must be between 0 and the maximum amount"
    ))]
    #[serde(default)]
    #[schema(example = 3250)]
    pub tax_amount: i64,
    /// `Draft` saves without posting; anything else posts immediately
    #[schema(value_type = Option<String>, example = "Sent")]
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
}

impl From<CreateInvoiceRequest> for pb::CreateInvoiceRequest {
    fn from(req: CreateInvoiceRequest) -> Self {
        Self {
            invoice_number: req.invoice_number,
            customer_id: req.customer_id.to_string(),
            invoice_date: date_string(req.invoice_date),
            due_date: req.due_date.map(date_string),
            subtotal: req.subtotal,
            tax_amount: req.tax_amount,
            status: req.status.map(|s| s.as_str().to_string()),
            notes: req.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VoidInvoiceRequest {
    #[schema(example = "Issued in error")]
    pub reason: Option<String>,
}

/// Customer payment against one invoice. Amounts are in cents.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    pub invoice_id: Uuid,
    pub payment_date: NaiveDate,
    #[validate(range(
        min = 1,
        max = MAX_AMOUNT_CENTS,
        message = "Payment amount must be positive and within the maximum amount"
    ))]
    #[schema(example = 28250)]
    pub amount: i64,
    #[schema(example = "e-Transfer")]
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    /// Defaults to Undeposited Funds
    pub deposit_to_account_id: Option<Uuid>,
    pub memo: Option<String>,
}

impl From<RecordPaymentRequest> for pb::RecordPaymentRequest {
    fn from(req: RecordPaymentRequest) -> Self {
        Self {
            invoice_id: req.invoice_id.to_string(),
            payment_date: date_string(req.payment_date),
            amount: req.amount,
            payment_method: req.payment_method,
            reference_number: req.reference_number,
            deposit_to_account_id: req.deposit_to_account_id.map(|id| id.to_string()),
            memo: req.memo,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvoiceListQuery {
    #[param(value_type = Option<String>)]
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<Uuid>,
}

/// Create invoice routes
pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/:id", get(get_invoice))
        .route("/:id/send", post(send_invoice))
        .route("/:id/void", post(void_invoice))
}

/// Create payment routes
pub fn payment_routes() -> Router<AppState> {
    Router::new().route("/", get(list_payments).post(record_payment))
}

/// List invoices
#[utoipa::path(
    get,
    path = "/invoices",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    params(InvoiceListQuery),
    responses((status = 200, description = "Invoices", body = Vec<Invoice>))
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> AppResult<Json<Vec<Invoice>>> {
    let invoices = state
        .ledger
        .list_invoices(
            query.status.map(|s| s.as_str().to_string()),
            query.customer_id,
        )
        .await?;
    Ok(Json(invoices))
}

/// Create an invoice and post it unless it is a draft
#[utoipa::path(
    post,
    path = "/invoices",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created", body = Invoice),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateInvoiceRequest>,
) -> AppResult<(StatusCode, Json<Invoice>)> {
    let invoice = state.ledger.create_invoice(payload.into()).await?;
    state.cache.invalidate_accounts().await;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Get an invoice
#[utoipa::path(
    get,
    path = "/invoices/{id}",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice", body = Invoice),
        (status = 404, description = "Invoice not found")
    )
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Invoice>> {
    Ok(Json(state.ledger.get_invoice(id).await?))
}

/// Send a draft invoice, posting it to the ledger
#[utoipa::path(
    post,
    path = "/invoices/{id}/send",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice sent", body = Invoice),
        (status = 404, description = "Invoice not found"),
        (status = 409, description = "Invoice is not a draft")
    )
)]
pub async fn send_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Invoice>> {
    let invoice = state.ledger.send_invoice(id).await?;
    state.cache.invalidate_accounts().await;
    Ok(Json(invoice))
}

/// Void an invoice, reversing its journal entry
#[utoipa::path(
    post,
    path = "/invoices/{id}/void",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = VoidInvoiceRequest,
    responses(
        (status = 200, description = "Invoice voided", body = Invoice),
        (status = 404, description = "Invoice not found"),
        (status = 409, description = "Invoice has payments or is already void")
    )
)]
pub async fn void_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<VoidInvoiceRequest>,
) -> AppResult<Json<Invoice>> {
    let invoice = state.ledger.void_invoice(id, payload.reason).await?;
    state.cache.invalidate_accounts().await;
    Ok(Json(invoice))
}

/// List customer payments
#[utoipa::path(
    get,
    path = "/payments",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Payments", body = Vec<Payment>))
)]
pub async fn list_payments(State(state): State<AppState>) -> AppResult<Json<Vec<Payment>>> {
    Ok(Json(state.ledger.list_payments().await?))
}

/// Record a payment against an invoice
#[utoipa::path(
    post,
    path = "/payments",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = Payment),
        (status = 400, description = "Amount exceeds the open balance"),
        (status = 404, description = "Invoice not found")
    )
)]
pub async fn record_payment(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RecordPaymentRequest>,
) -> AppResult<(StatusCode, Json<Payment>)> {
    let payment = state.ledger.record_payment(payload.into()).await?;
    state.cache.invalidate_accounts().await;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_request_formats_dates_and_status() {
        let request = pb::CreateInvoiceRequest::from(CreateInvoiceRequest {
            invoice_number: "1001".to_string(),
            customer_id: Uuid::nil(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            subtotal: 25000,
            tax_amount: 3250,
            status: Some(InvoiceStatus::Draft),
            notes: None,
        });

        assert_eq!(request.invoice_date, "2025-04-01");
        assert_eq!(request.due_date.as_deref(), Some("2025-05-01"));
        assert_eq!(request.status.as_deref(), Some("Draft"));
    }

    #[test]
    fn test_payment_amount_must_be_positive() {
        let payment = RecordPaymentRequest {
            invoice_id: Uuid::new_v4(),
            payment_date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            amount: 0,
            payment_method: None,
            reference_number: None,
            deposit_to_account_id: None,
            memo: None,
        };
        assert!(payment.validate().is_err());
    }

    #[test]
    fn test_invoice_amounts_capped() {
        let invoice = CreateInvoiceRequest {
            invoice_number: "1002".to_string(),
            customer_id: Uuid::nil(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            due_date: None,
            subtotal: i64::MAX,
            tax_amount: 1,
            status: None,
            notes: None,
        };
        let errors = invoice.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("subtotal"));
    }
}
