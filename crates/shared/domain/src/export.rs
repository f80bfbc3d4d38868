//! CSV renderings of reports.

use crate::aging::{AgingBucket, AgingReport};
use crate::money::Money;
use crate::reports::ProfitAndLoss;

/// Quote a field when it contains a comma, quote, or line break.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = fields
        .into_iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn amount(m: Money) -> String {
    m.to_decimal_string()
}

pub fn aging_csv(report: &AgingReport) -> String {
    let mut out = String::new();

    let mut header = vec!["Name".to_string()];
    header.extend(AgingBucket::ALL.iter().map(|b| b.as_str().to_string()));
    header.push("Total".to_string());
    out.push_str(&csv_line(header));

    for row in &report.rows {
        let mut fields = vec![row.name.clone()];
        fields.extend(AgingBucket::ALL.iter().map(|b| amount(row.buckets.get(*b))));
        fields.push(amount(row.buckets.total));
        out.push_str(&csv_line(fields));
    }

    let mut totals = vec!["Total".to_string()];
    totals.extend(AgingBucket::ALL.iter().map(|b| amount(report.totals.get(*b))));
    totals.push(amount(report.totals.total));
    out.push_str(&csv_line(totals));

    out
}

pub fn profit_and_loss_csv(report: &ProfitAndLoss) -> String {
    let mut out = csv_line(["Section", "Account", "Amount"]);

    for row in &report.income {
        out.push_str(&csv_line(["Income", row.account_name.as_str(), &amount(row.amount)]));
    }
    out.push_str(&csv_line(["Income", "Total Income", &amount(report.total_income)]));

    for row in &report.expenses {
        out.push_str(&csv_line(["Expenses", row.account_name.as_str(), &amount(row.amount)]));
    }
    out.push_str(&csv_line(["Expenses", "Total Expenses", &amount(report.total_expenses)]));
    out.push_str(&csv_line(["", "Net Income", &amount(report.net_income)]));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    use crate::aging::AgingItem;

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("Smith, John"), "\"Smith, John\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_aging_csv_layout() {
        let as_of = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let report = AgingReport::build(
            &[AgingItem {
                party_id: Uuid::new_v4(),
                party_name: "Lingua, Inc".to_string(),
                due_date: None,
                amount_due: Money::from_cents(12345),
            }],
            as_of,
        );

        let csv = aging_csv(&report);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Name,Current,1-30,31-60,61-90,91+,Total");
        assert_eq!(lines[1], "\"Lingua, Inc\",123.45,0.00,0.00,0.00,0.00,123.45");
        assert_eq!(lines[2], "Total,123.45,0.00,0.00,0.00,0.00,123.45");
    }
}
