//! Period-over-period comparisons for summary dashboards.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::TREND_NEUTRAL_THRESHOLD;
use crate::error::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Trend {
    pub direction: TrendDirection,
    pub pct: String,
}

impl Trend {
    fn neutral() -> Self {
        Self {
            direction: TrendDirection::Neutral,
            pct: "0%".to_string(),
        }
    }
}

/// Direction and signed percentage change from `previous` to `current`.
///
/// Growth from zero reads as `+100%`; changes under half a percent are neutral.
pub fn calc_trend(current: f64, previous: f64) -> Trend {
    if previous == 0.0 && current == 0.0 {
        return Trend::neutral();
    }
    if previous == 0.0 {
        return Trend {
            direction: TrendDirection::Up,
            pct: "+100%".to_string(),
        };
    }

    let change = (current - previous) / previous * 100.0;
    if change.abs() < TREND_NEUTRAL_THRESHOLD {
        return Trend::neutral();
    }

    if change > 0.0 {
        Trend {
            direction: TrendDirection::Up,
            pct: format!("+{:.1}%", change),
        }
    } else {
        Trend {
            direction: TrendDirection::Down,
            pct: format!("{:.1}%", change),
        }
    }
}

/// Reporting window selectable on dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ReportPeriod {
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[serde(rename = "ytd")]
    YearToDate,
    #[default]
    #[serde(rename = "12m")]
    Last12Months,
}

/// Current window and the window it is compared against. Both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRanges {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub prev_start: NaiveDate,
    pub prev_end: NaiveDate,
}

impl ReportPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Last7Days => "7d",
            ReportPeriod::Last30Days => "30d",
            ReportPeriod::Last90Days => "90d",
            ReportPeriod::YearToDate => "ytd",
            ReportPeriod::Last12Months => "12m",
        }
    }

    /// Parse a period label. Unknown or empty labels mean the 12-month window.
    pub fn parse_or_default(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }

    pub fn ranges(&self, today: NaiveDate) -> PeriodRanges {
        let days = match self {
            ReportPeriod::Last7Days => 7,
            ReportPeriod::Last30Days => 30,
            ReportPeriod::Last90Days => 90,
            ReportPeriod::Last12Months => 365,
            ReportPeriod::YearToDate => {
                let year = today.year();
                let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(today);
                let prev_start = NaiveDate::from_ymd_opt(year - 1, 1, 1).unwrap_or(start);
                let prev_end = same_day_last_year(today).unwrap_or(prev_start);
                return PeriodRanges {
                    start,
                    end: today,
                    prev_start,
                    prev_end,
                };
            }
        };

        let start = today - Duration::days(days);
        let prev_end = start - Duration::days(1);
        PeriodRanges {
            start,
            end: today,
            prev_start: prev_end - Duration::days(days),
            prev_end,
        }
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "7d" => Ok(ReportPeriod::Last7Days),
            "30d" => Ok(ReportPeriod::Last30Days),
            "90d" => Ok(ReportPeriod::Last90Days),
            "ytd" => Ok(ReportPeriod::YearToDate),
            "12m" => Ok(ReportPeriod::Last12Months),
            other => Err(DomainError::validation(format!(
                "Unknown report period '{}'",
                other
            ))),
        }
    }
}

/// Same month and day one year earlier; Feb 29 falls back to Feb 28.
fn same_day_last_year(date: NaiveDate) -> Option<NaiveDate> {
    date.with_year(date.year() - 1)
        .or_else(|| NaiveDate::from_ymd_opt(date.year() - 1, date.month(), 28))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_trend() {
        assert_eq!(
            calc_trend(150.0, 100.0),
            Trend { direction: TrendDirection::Up, pct: "+50.0%".to_string() }
        );
        assert_eq!(calc_trend(0.0, 0.0), Trend::neutral());
        assert_eq!(calc_trend(5.0, 0.0).pct, "+100%");

        let down = calc_trend(75.0, 100.0);
        assert_eq!(down.direction, TrendDirection::Down);
        assert_eq!(down.pct, "-25.0%");

        assert_eq!(calc_trend(1004.0, 1000.0), Trend::neutral());
    }

    #[test]
    fn test_rolling_ranges() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let r = ReportPeriod::Last30Days.ranges(today);
        assert_eq!(r.start, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(r.prev_end, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(r.prev_start, NaiveDate::from_ymd_opt(2025, 1, 29).unwrap());
    }

    #[test]
    fn test_year_to_date_ranges() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let r = ReportPeriod::YearToDate.ranges(today);
        assert_eq!(r.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(r.prev_start, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(r.prev_end, NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
    }

    #[test]
    fn test_period_labels() {
        assert_eq!(ReportPeriod::default(), ReportPeriod::Last12Months);
        assert_eq!(ReportPeriod::parse_or_default("ytd"), ReportPeriod::YearToDate);
        assert_eq!(ReportPeriod::parse_or_default("forever"), ReportPeriod::Last12Months);
    }
}
