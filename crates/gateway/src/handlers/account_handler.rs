//! Chart of accounts, customer and supplier handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{AccountType, Customer, Supplier};
use proto::ledger as pb;

use crate::clients::{AccountView, PartyBalance};
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// New account request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, message = "Account name is required"))]
    #[schema(example = "Operating Chequing")]
    pub name: String,
    #[schema(example = "Bank")]
    pub account_type: AccountType,
    pub detail_type: Option<String>,
    pub description: Option<String>,
    #[schema(example = "1010")]
    pub account_number: Option<String>,
}

impl From<CreateAccountRequest> for pb::CreateAccountRequest {
    fn from(req: CreateAccountRequest) -> Self {
        Self {
            name: req.name,
            account_type: req.account_type.as_str().to_string(),
            detail_type: req.detail_type,
            description: req.description,
            account_number: req.account_number,
        }
    }
}

/// New customer or supplier request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePartyRequest {
    #[validate(length(min = 1, message = "Display name is required"))]
    #[schema(example = "Maria Lopez")]
    pub display_name: String,
    pub company: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Suppliers only
    pub tax_id: Option<String>,
}

impl From<CreatePartyRequest> for pb::CreatePartyRequest {
    fn from(req: CreatePartyRequest) -> Self {
        Self {
            display_name: req.display_name,
            company: req.company,
            email: req.email,
            phone: req.phone,
            tax_id: req.tax_id,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AccountListQuery {
    /// Include deactivated accounts
    #[serde(default)]
    pub include_inactive: bool,
    /// Only accounts of this type, e.g. `Bank`
    #[param(value_type = Option<String>)]
    pub account_type: Option<AccountType>,
}

/// Create account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route("/:id", get(get_account))
        .route("/:id/deactivate", post(deactivate_account))
}

/// Create customer routes
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id/balance", get(customer_balance))
}

/// Create supplier routes
pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route("/:id/balance", get(supplier_balance))
}

fn filter_accounts(accounts: Vec<AccountView>, query: &AccountListQuery) -> Vec<AccountView> {
    accounts
        .into_iter()
        .filter(|a| query.include_inactive || a.account.is_active)
        .filter(|a| {
            query
                .account_type
                .map_or(true, |t| a.account.account_type == t)
        })
        .collect()
}

/// List the chart of accounts with balances
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(AccountListQuery),
    responses(
        (status = 200, description = "Chart of accounts", body = Vec<AccountView>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<AccountListQuery>,
) -> AppResult<Json<Vec<AccountView>>> {
    let accounts = match state.cache.get_accounts().await {
        Some(accounts) => accounts,
        None => {
            let accounts = state.ledger.list_accounts().await?;
            state.cache.set_accounts(&accounts).await;
            accounts
        }
    };

    Ok(Json(filter_accounts(accounts, &query)))
}

/// Create an account
#[utoipa::path(
    post,
    path = "/accounts",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountView),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Account name already in use")
    )
)]
pub async fn create_account(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateAccountRequest>,
) -> AppResult<(StatusCode, Json<AccountView>)> {
    let account = state.ledger.create_account(payload.into()).await?;
    state.cache.invalidate_accounts().await;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Get one account with its balance
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account", body = AccountView),
        (status = 404, description = "Account not found")
    )
)]
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AccountView>> {
    Ok(Json(state.ledger.get_account(id).await?))
}

/// Deactivate an account
#[utoipa::path(
    post,
    path = "/accounts/{id}/deactivate",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deactivated", body = AccountView),
        (status = 404, description = "Account not found"),
        (status = 409, description = "System accounts cannot be deactivated")
    )
)]
pub async fn deactivate_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AccountView>> {
    let account = state.ledger.deactivate_account(id).await?;
    state.cache.invalidate_accounts().await;
    Ok(Json(account))
}

/// List customers
#[utoipa::path(
    get,
    path = "/customers",
    tag = "Customers",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Customers", body = Vec<Customer>))
)]
pub async fn list_customers(State(state): State<AppState>) -> AppResult<Json<Vec<Customer>>> {
    Ok(Json(state.ledger.list_customers().await?))
}

/// Create a customer
#[utoipa::path(
    post,
    path = "/customers",
    tag = "Customers",
    security(("bearer_auth" = [])),
    request_body = CreatePartyRequest,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_customer(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreatePartyRequest>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let customer = state.ledger.create_customer(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Open receivable balance of a customer
#[utoipa::path(
    get,
    path = "/customers/{id}/balance",
    tag = "Customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer balance", body = PartyBalance),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn customer_balance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PartyBalance>> {
    Ok(Json(state.ledger.customer_balance(id).await?))
}

/// List suppliers
#[utoipa::path(
    get,
    path = "/suppliers",
    tag = "Suppliers",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Suppliers", body = Vec<Supplier>))
)]
pub async fn list_suppliers(State(state): State<AppState>) -> AppResult<Json<Vec<Supplier>>> {
    Ok(Json(state.ledger.list_suppliers().await?))
}

/// Create a supplier
#[utoipa::path(
    post,
    path = "/suppliers",
    tag = "Suppliers",
    security(("bearer_auth" = [])),
    request_body = CreatePartyRequest,
    responses(
        (status = 201, description = "Supplier created", body = Supplier),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreatePartyRequest>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    let supplier = state.ledger.create_supplier(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

/// Open payable balance of a supplier
#[utoipa::path(
    get,
    path = "/suppliers/{id}/balance",
    tag = "Suppliers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier balance", body = PartyBalance),
        (status = 404, description = "Supplier not found")
    )
)]
pub async fn supplier_balance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PartyBalance>> {
    Ok(Json(state.ledger.supplier_balance(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{Account, Money};

    fn account(name: &str, account_type: AccountType, is_active: bool) -> AccountView {
        AccountView {
            account: Account {
                id: Uuid::new_v4(),
                name: name.to_string(),
                account_type,
                detail_type: None,
                description: None,
                account_number: None,
                is_active,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            balance: Money::ZERO,
        }
    }

    fn chart() -> Vec<AccountView> {
        vec![
            account("Operating Chequing", AccountType::Bank, true),
            account("Old Savings", AccountType::Bank, false),
            account("Sales", AccountType::Income, true),
        ]
    }

    #[test]
    fn test_inactive_hidden_by_default() {
        let accounts = filter_accounts(chart(), &AccountListQuery::default());
        assert_eq!(accounts.len(), 2);
        assert!(accounts.iter().all(|a| a.account.is_active));
    }

    #[test]
    fn test_filter_by_type_with_inactive() {
        let query = AccountListQuery {
            include_inactive: true,
            account_type: Some(AccountType::Bank),
        };
        let names: Vec<String> = filter_accounts(chart(), &query)
            .into_iter()
            .map(|a| a.account.name)
            .collect();
        assert_eq!(names, vec!["Operating Chequing", "Old Savings"]);
    }

    #[test]
    fn test_account_request_sends_type_label() {
        let request = pb::CreateAccountRequest::from(CreateAccountRequest {
            name: "Accounts Receivable".to_string(),
            account_type: AccountType::AccountsReceivable,
            detail_type: None,
            description: None,
            account_number: None,
        });
        assert_eq!(request.account_type, "Accounts Receivable");
    }
}
