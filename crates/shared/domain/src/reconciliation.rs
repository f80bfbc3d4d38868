//! Bank reconciliation: matching a statement balance against cleared items.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bank::BankTransaction;
use crate::error::{DomainError, DomainResult};
use crate::money::Money;

labelled_enum! {
    pub enum ReconciliationStatus {
        InProgress => "In Progress",
        Completed => "Completed",
    }
}

/// Stored reconciliation session for one account and statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Reconciliation {
    pub id: Uuid,
    pub account_id: Uuid,
    pub statement_date: NaiveDate,
    pub statement_balance: Money,
    pub cleared_balance: Money,
    pub difference: Money,
    pub status: ReconciliationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reconciliation {
    pub fn start(
        id: Uuid,
        account_id: Uuid,
        statement_date: NaiveDate,
        statement_balance: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account_id,
            statement_date,
            statement_balance,
            cleared_balance: Money::ZERO,
            difference: statement_balance,
            status: ReconciliationStatus::InProgress,
            completed_at: None,
            created_at: now,
        }
    }

    /// Close the session against a freshly built workspace.
    pub fn complete(
        &mut self,
        workspace: &ReconciliationWorkspace,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.status == ReconciliationStatus::Completed {
            return Err(DomainError::conflict("Reconciliation is already completed"));
        }
        if !workspace.can_finish() {
            return Err(DomainError::validation(format!(
                "Cannot finish reconciliation: difference is {}",
                workspace.difference()
            )));
        }

        self.cleared_balance = workspace.cleared_total;
        self.difference = workspace.difference();
        self.status = ReconciliationStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }
}

/// Statement view of an account: what has cleared and what has not.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReconciliationWorkspace {
    pub account_id: Uuid,
    pub statement_date: NaiveDate,
    pub statement_balance: Money,
    pub cleared: Vec<BankTransaction>,
    pub uncleared: Vec<BankTransaction>,
    pub cleared_total: Money,
    pub uncleared_total: Money,
}

impl ReconciliationWorkspace {
    /// Build from the account's transactions. Items after the statement date
    /// are ignored; the rest are listed newest first.
    pub fn build(
        account_id: Uuid,
        statement_date: NaiveDate,
        statement_balance: Money,
        transactions: Vec<BankTransaction>,
    ) -> Self {
        let mut in_range: Vec<BankTransaction> = transactions
            .into_iter()
            .filter(|t| t.account_id == account_id && t.transaction_date <= statement_date)
            .collect();
        in_range.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));

        let (cleared, uncleared): (Vec<_>, Vec<_>) =
            in_range.into_iter().partition(|t| t.is_reconciled);
        let cleared_total = cleared.iter().map(|t| t.amount).sum();
        let uncleared_total = uncleared.iter().map(|t| t.amount).sum();

        Self {
            account_id,
            statement_date,
            statement_balance,
            cleared,
            uncleared,
            cleared_total,
            uncleared_total,
        }
    }

    pub fn difference(&self) -> Money {
        self.statement_balance - self.cleared_total
    }

    /// Finishing requires the difference to be under one cent.
    pub fn can_finish(&self) -> bool {
        self.difference().is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::BankTransactionStatus;

    fn tx(account_id: Uuid, day: u32, cents: i64, reconciled: bool) -> BankTransaction {
        BankTransaction {
            id: Uuid::new_v4(),
            account_id,
            transaction_date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            description: format!("tx {}", day),
            amount: Money::from_cents(cents),
            fit_id: format!("FIT-{}", day),
            status: BankTransactionStatus::Categorized,
            category_account_id: None,
            category: None,
            payee: None,
            applied_rule_id: None,
            memo: None,
            is_reconciled: reconciled,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_workspace_splits_and_totals() {
        let account = Uuid::new_v4();
        let ws = ReconciliationWorkspace::build(
            account,
            NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
            Money::from_cents(7500),
            vec![
                tx(account, 1, 10000, true),
                tx(account, 5, -2500, true),
                tx(account, 10, -1000, false),
                tx(account, 25, 99999, true),
                tx(Uuid::new_v4(), 2, 500, true),
            ],
        );

        assert_eq!(ws.cleared.len(), 2);
        assert_eq!(ws.uncleared.len(), 1);
        assert_eq!(ws.cleared_total.cents(), 7500);
        assert_eq!(ws.uncleared_total.cents(), -1000);
        assert_eq!(ws.difference(), Money::ZERO);
        assert!(ws.can_finish());
        assert_eq!(ws.cleared[0].transaction_date.to_string(), "2025-03-05");
    }

    #[test]
    fn test_one_cent_off_cannot_finish() {
        let account = Uuid::new_v4();
        let ws = ReconciliationWorkspace::build(
            account,
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            Money::from_cents(10001),
            vec![tx(account, 1, 10000, true)],
        );
        assert_eq!(ws.difference().cents(), 1);
        assert!(!ws.can_finish());

        let mut rec = Reconciliation::start(
            Uuid::new_v4(),
            account,
            ws.statement_date,
            ws.statement_balance,
            Utc::now(),
        );
        assert!(matches!(rec.complete(&ws, Utc::now()), Err(DomainError::Validation(_))));
        assert_eq!(rec.status, ReconciliationStatus::InProgress);
    }

    #[test]
    fn test_complete_records_balances_once() {
        let account = Uuid::new_v4();
        let ws = ReconciliationWorkspace::build(
            account,
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            Money::from_cents(-4200),
            vec![tx(account, 3, -4200, true), tx(account, 4, 800, false)],
        );
        let mut rec = Reconciliation::start(
            Uuid::new_v4(),
            account,
            ws.statement_date,
            ws.statement_balance,
            Utc::now(),
        );

        rec.complete(&ws, Utc::now()).unwrap();
        assert_eq!(rec.status, ReconciliationStatus::Completed);
        assert_eq!(rec.cleared_balance.cents(), -4200);
        assert!(rec.completed_at.is_some());
        assert!(matches!(rec.complete(&ws, Utc::now()), Err(DomainError::Conflict(_))));
    }
}
