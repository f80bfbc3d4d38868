//! Financial report handlers.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use common::AppResult;
use domain::{
    export::{aging_csv, profit_and_loss_csv},
    AgingKind, AgingReport, BalanceSheet, Dashboard, ProfitAndLoss, TrialBalance,
};

use crate::clients::{MonthlyBalanceReport, MonthlyProfitAndLossReport};
use crate::state::AppState;

/// Response body format for exportable reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AsOfQuery {
    /// Defaults to today
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub format: ReportFormat,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// Defaults to January 1 of the current year
    pub start_date: Option<NaiveDate>,
    /// Defaults to today
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub format: ReportFormat,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YearQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// `7d`, `30d`, `90d`, `ytd` or `12m`
    pub period: Option<String>,
}

/// Create report routes
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/trial-balance", get(trial_balance))
        .route("/profit-and-loss", get(profit_and_loss))
        .route("/balance-sheet", get(balance_sheet))
        .route("/monthly-profit-and-loss", get(monthly_profit_and_loss))
        .route("/monthly-balance-sheet", get(monthly_balance_sheet))
        .route("/aging/:kind", get(aging_report))
        .route("/dashboard", get(dashboard))
}

fn csv_response(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Trial balance
#[utoipa::path(
    get,
    path = "/reports/trial-balance",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(AsOfQuery),
    responses((status = 200, description = "Trial balance", body = TrialBalance))
)]
pub async fn trial_balance(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<TrialBalance>> {
    Ok(Json(state.ledger.trial_balance(query.as_of).await?))
}

/// Profit and loss for a period, as JSON or CSV
#[utoipa::path(
    get,
    path = "/reports/profit-and-loss",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(PeriodQuery),
    responses(
        (status = 200, description = "Profit and loss", body = ProfitAndLoss),
        (status = 200, description = "Profit and loss CSV", content_type = "text/csv", body = String)
    )
)]
pub async fn profit_and_loss(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Response> {
    let report = state
        .ledger
        .profit_and_loss(query.start_date, query.end_date)
        .await?;

    Ok(match query.format {
        ReportFormat::Json => Json(report).into_response(),
        ReportFormat::Csv => {
            let filename = format!(
                "profit-and-loss-{}-{}.csv",
                report.start_date, report.end_date
            );
            csv_response(&filename, profit_and_loss_csv(&report))
        }
    })
}

/// Balance sheet
#[utoipa::path(
    get,
    path = "/reports/balance-sheet",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(AsOfQuery),
    responses((status = 200, description = "Balance sheet", body = BalanceSheet))
)]
pub async fn balance_sheet(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<BalanceSheet>> {
    Ok(Json(state.ledger.balance_sheet(query.as_of).await?))
}

/// Income, expenses and net profit for each month of a year
#[utoipa::path(
    get,
    path = "/reports/monthly-profit-and-loss",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(YearQuery),
    responses((status = 200, description = "Monthly profit and loss", body = MonthlyProfitAndLossReport))
)]
pub async fn monthly_profit_and_loss(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> AppResult<Json<MonthlyProfitAndLossReport>> {
    Ok(Json(state.ledger.monthly_profit_and_loss(query.year).await?))
}

/// Month-end assets, liabilities and equity for a year
#[utoipa::path(
    get,
    path = "/reports/monthly-balance-sheet",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(YearQuery),
    responses((status = 200, description = "Monthly balance sheet", body = MonthlyBalanceReport))
)]
pub async fn monthly_balance_sheet(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> AppResult<Json<MonthlyBalanceReport>> {
    Ok(Json(state.ledger.monthly_balance_sheet(query.year).await?))
}

/// Receivables or payables aging, as JSON or CSV
#[utoipa::path(
    get,
    path = "/reports/aging/{kind}",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(
        ("kind" = String, Path, description = "`receivables` or `payables`"),
        AsOfQuery
    ),
    responses(
        (status = 200, description = "Aging report", body = AgingReport),
        (status = 200, description = "Aging CSV", content_type = "text/csv", body = String),
        (status = 400, description = "Unknown report kind")
    )
)]
pub async fn aging_report(
    State(state): State<AppState>,
    Path(kind): Path<AgingKind>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Response> {
    let report = state.ledger.aging_report(kind, query.as_of).await?;

    Ok(match query.format {
        ReportFormat::Json => Json(report).into_response(),
        ReportFormat::Csv => {
            let filename = format!("{}-aging-{}.csv", kind.as_str(), report.as_of);
            csv_response(&filename, aging_csv(&report))
        }
    })
}

/// Dashboard metrics with trends against the previous period
#[utoipa::path(
    get,
    path = "/reports/dashboard",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(DashboardQuery),
    responses((status = 200, description = "Dashboard", body = Dashboard))
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<Dashboard>> {
    Ok(Json(state.ledger.dashboard(query.period).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_format_defaults_to_json() {
        let query: PeriodQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(query.format, ReportFormat::Json);

        let query: AsOfQuery =
            serde_json::from_value(serde_json::json!({ "format": "csv" })).unwrap();
        assert_eq!(query.format, ReportFormat::Csv);
    }

    #[test]
    fn test_csv_response_headers() {
        let response = csv_response("report.csv", "a,b\n".to_string());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"report.csv\""
        );
    }
}
