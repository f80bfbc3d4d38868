//! Receivable and payable aging.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::invoice::Invoice;
use crate::money::Money;
use crate::purchase::Bill;

labelled_enum! {
    /// Days-past-due band.
    pub enum AgingBucket {
        Current => "Current",
        Days1To30 => "1-30",
        Days31To60 => "31-60",
        Days61To90 => "61-90",
        Over90 => "91+",
    }
}

labelled_enum! {
    /// Which side of the ledger an aging report covers.
    pub enum AgingKind {
        Receivables => "receivables",
        Payables => "payables",
    }
}

impl AgingBucket {
    pub fn for_days(days_past_due: i64) -> Self {
        match days_past_due {
            d if d <= 0 => AgingBucket::Current,
            d if d <= 30 => AgingBucket::Days1To30,
            d if d <= 60 => AgingBucket::Days31To60,
            d if d <= 90 => AgingBucket::Days61To90,
            _ => AgingBucket::Over90,
        }
    }

    /// Bucket for a document due on `due_date`, evaluated on `as_of`.
    /// Documents without a due date are current.
    pub fn classify(due_date: Option<NaiveDate>, as_of: NaiveDate) -> Self {
        match due_date {
            Some(due) => Self::for_days((as_of - due).num_days()),
            None => AgingBucket::Current,
        }
    }
}

/// An open document to be aged.
#[derive(Debug, Clone)]
pub struct AgingItem {
    pub party_id: Uuid,
    pub party_name: String,
    pub due_date: Option<NaiveDate>,
    pub amount_due: Money,
}

impl AgingItem {
    pub fn from_invoice(invoice: &Invoice, customer_name: impl Into<String>) -> Self {
        Self {
            party_id: invoice.customer_id,
            party_name: customer_name.into(),
            due_date: invoice.due_date,
            amount_due: invoice.amount_due,
        }
    }

    pub fn from_bill(bill: &Bill, supplier_name: impl Into<String>) -> Self {
        Self {
            party_id: bill.supplier_id,
            party_name: supplier_name.into(),
            due_date: bill.due_date,
            amount_due: bill.amount_due,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BucketTotals {
    pub current: Money,
    pub days_1_30: Money,
    pub days_31_60: Money,
    pub days_61_90: Money,
    pub over_90: Money,
    pub total: Money,
}

impl BucketTotals {
    fn add(&mut self, bucket: AgingBucket, amount: Money) {
        let slot = match bucket {
            AgingBucket::Current => &mut self.current,
            AgingBucket::Days1To30 => &mut self.days_1_30,
            AgingBucket::Days31To60 => &mut self.days_31_60,
            AgingBucket::Days61To90 => &mut self.days_61_90,
            AgingBucket::Over90 => &mut self.over_90,
        };
        *slot += amount;
        self.total += amount;
    }

    pub fn get(&self, bucket: AgingBucket) -> Money {
        match bucket {
            AgingBucket::Current => self.current,
            AgingBucket::Days1To30 => self.days_1_30,
            AgingBucket::Days31To60 => self.days_31_60,
            AgingBucket::Days61To90 => self.days_61_90,
            AgingBucket::Over90 => self.over_90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgingRow {
    pub party_id: Uuid,
    pub name: String,
    pub buckets: BucketTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgingReport {
    pub as_of: NaiveDate,
    pub rows: Vec<AgingRow>,
    pub totals: BucketTotals,
}

impl AgingReport {
    /// Group items by party and band them by days past due. Rows are sorted
    /// by name.
    pub fn build(items: &[AgingItem], as_of: NaiveDate) -> Self {
        let mut rows: BTreeMap<(String, Uuid), BucketTotals> = BTreeMap::new();
        let mut totals = BucketTotals::default();

        for item in items.iter().filter(|i| i.amount_due.is_positive()) {
            let bucket = AgingBucket::classify(item.due_date, as_of);
            rows.entry((item.party_name.clone(), item.party_id))
                .or_default()
                .add(bucket, item.amount_due);
            totals.add(bucket, item.amount_due);
        }

        Self {
            as_of,
            rows: rows
                .into_iter()
                .map(|((name, party_id), buckets)| AgingRow {
                    party_id,
                    name,
                    buckets,
                })
                .collect(),
            totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(AgingBucket::for_days(-5), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days(0), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days(1), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::for_days(30), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::for_days(31), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_days(60), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_days(61), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_days(90), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_days(91), AgingBucket::Over90);
        assert_eq!(AgingBucket::classify(None, d(6, 1)), AgingBucket::Current);
        assert_eq!(AgingBucket::Over90.as_str(), "91+");
    }

    #[test]
    fn test_report_groups_by_party() {
        let acme = Uuid::new_v4();
        let zed = Uuid::new_v4();
        let items = vec![
            AgingItem { party_id: zed, party_name: "Zed Corp".into(), due_date: Some(d(3, 1)), amount_due: Money::from_cents(5000) },
            AgingItem { party_id: acme, party_name: "Acme".into(), due_date: Some(d(3, 25)), amount_due: Money::from_cents(1000) },
            AgingItem { party_id: acme, party_name: "Acme".into(), due_date: None, amount_due: Money::from_cents(2500) },
            AgingItem { party_id: acme, party_name: "Acme".into(), due_date: Some(d(1, 1)), amount_due: Money::ZERO },
        ];

        let report = AgingReport::build(&items, d(4, 1));
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].name, "Acme");
        assert_eq!(report.rows[0].buckets.current.cents(), 2500);
        assert_eq!(report.rows[0].buckets.days_1_30.cents(), 1000);
        assert_eq!(report.rows[1].buckets.days_31_60.cents(), 5000);
        assert_eq!(report.totals.total.cents(), 8500);
    }
}
