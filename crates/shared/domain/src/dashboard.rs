//! Summary figures for the financial dashboard.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::reports::ProfitAndLoss;
use crate::trend::{calc_trend, ReportPeriod, Trend};

/// A figure with its change against the previous window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Metric {
    pub value: Money,
    pub trend: Trend,
}

impl Metric {
    pub fn compare(current: Money, previous: Money) -> Self {
        Self {
            value: current,
            trend: calc_trend(current.as_dollars(), previous.as_dollars()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Dashboard {
    pub period: ReportPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub revenue: Metric,
    pub expenses: Metric,
    pub net_profit: Metric,
    pub open_receivables: Money,
    pub open_payables: Money,
    pub bank_balance: Money,
    pub transactions_for_review: u64,
}

impl Dashboard {
    /// Income figures from the current and previous window's statements.
    /// Balances are left at zero for the caller to fill in.
    pub fn from_statements(period: ReportPeriod, current: &ProfitAndLoss, previous: &ProfitAndLoss) -> Self {
        Self {
            period,
            start_date: current.start_date,
            end_date: current.end_date,
            revenue: Metric::compare(current.total_income, previous.total_income),
            expenses: Metric::compare(current.total_expenses, previous.total_expenses),
            net_profit: Metric::compare(current.net_income, previous.net_income),
            open_receivables: Money::ZERO,
            open_payables: Money::ZERO,
            bank_balance: Money::ZERO,
            transactions_for_review: 0,
        }
    }
}
