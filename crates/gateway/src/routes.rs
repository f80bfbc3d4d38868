//! Route configuration.

use axum::{middleware, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{
    account_routes, bank_rule_routes, bank_transaction_routes, bill_routes, course_routes,
    customer_routes, expense_routes, health_routes, invoice_routes, journal_routes,
    maintenance_routes, payment_routes, reconciliation_routes, report_routes, supplier_routes,
    transfer_routes,
};
use crate::middleware::{auth_middleware, rate_limit_admin_middleware, rate_limit_middleware};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    // Bookkeeping and course routes (auth required, general rate limit)
    let api = Router::new()
        .nest("/accounts", account_routes())
        .nest("/customers", customer_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/invoices", invoice_routes())
        .nest("/payments", payment_routes())
        .nest("/expenses", expense_routes())
        .nest("/bills", bill_routes())
        .nest("/transfers", transfer_routes())
        .nest("/journal-entries", journal_routes())
        .nest("/bank/transactions", bank_transaction_routes())
        .nest("/bank/rules", bank_rule_routes())
        .nest("/reconciliations", reconciliation_routes())
        .nest("/reports", report_routes())
        .nest("/courses", course_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Maintenance routes (auth required, stricter rate limit)
    let maintenance = maintenance_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_admin_middleware,
        ));

    Router::new()
        // Health check (no auth, no rate limit)
        .nest("/health", health_routes())
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .nest("/maintenance", maintenance)
        .with_state(state)
}
