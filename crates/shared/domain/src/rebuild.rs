//! Planning for a full ledger rebuild from source documents.
//!
//! The plan is computed without touching storage. The ledger service applies
//! it inside one transaction: drop duplicate expenses, persist account
//! assignments, wipe the journal, then insert the planned entries in order.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::SystemAccount;
use crate::error::DomainResult;
use crate::invoice::{Invoice, Payment};
use crate::journal::NewJournalEntry;
use crate::money::Money;
use crate::posting::{classify_unassigned_expense, PostingSource, SystemAccounts};
use crate::purchase::{Bill, BillPayment, Expense};
use crate::transfer::Transfer;

/// Every document that can post to the ledger.
#[derive(Debug, Clone, Default)]
pub struct RebuildSources {
    pub invoices: Vec<Invoice>,
    pub payments: Vec<Payment>,
    pub expenses: Vec<Expense>,
    pub bills: Vec<Bill>,
    pub bill_payments: Vec<BillPayment>,
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RebuildCounts {
    pub invoices: u32,
    pub expenses: u32,
    pub payments: u32,
    pub bills: u32,
    pub bill_payments: u32,
    pub transfers: u32,
    pub duplicates_removed: u32,
    pub accounts_assigned: u32,
}

impl RebuildCounts {
    pub fn entries(&self) -> u32 {
        self.invoices + self.expenses + self.payments + self.bills + self.bill_payments + self.transfers
    }
}

#[derive(Debug, Clone)]
pub struct RebuildPlan {
    /// Expenses to delete as duplicates of an earlier one
    pub duplicate_expense_ids: Vec<Uuid>,
    /// (expense id, account id) assignments for expenses recorded without one
    pub account_assignments: Vec<(Uuid, Uuid)>,
    /// Entries to insert, oldest first
    pub entries: Vec<NewJournalEntry>,
    pub counts: RebuildCounts,
    pub total_debits: Money,
    pub total_credits: Money,
}

impl RebuildPlan {
    /// System accounts the plan for these sources will need.
    pub fn required_accounts(sources: &RebuildSources) -> Vec<SystemAccount> {
        let mut needed: HashSet<SystemAccount> = HashSet::new();
        for_each_source(sources, |source| needed.extend(source.required_accounts()));
        for expense in sources.expenses.iter().filter(|e| e.account_id.is_none()) {
            needed.insert(classify_unassigned_expense(expense.payee_name.as_deref()));
        }
        SystemAccount::ALL
            .iter()
            .copied()
            .filter(|a| needed.contains(a))
            .collect()
    }

    pub fn build(mut sources: RebuildSources, accounts: &SystemAccounts) -> DomainResult<Self> {
        let duplicate_expense_ids = duplicate_expenses(&sources.expenses);
        let duplicates: HashSet<Uuid> = duplicate_expense_ids.iter().copied().collect();
        sources.expenses.retain(|e| !duplicates.contains(&e.id));

        let mut account_assignments = Vec::new();
        for expense in sources.expenses.iter_mut().filter(|e| e.account_id.is_none()) {
            let account_id = accounts.get(classify_unassigned_expense(expense.payee_name.as_deref()))?;
            expense.account_id = Some(account_id);
            account_assignments.push((expense.id, account_id));
        }

        let mut counts = RebuildCounts {
            duplicates_removed: duplicate_expense_ids.len() as u32,
            accounts_assigned: account_assignments.len() as u32,
            ..RebuildCounts::default()
        };

        let mut entries = Vec::new();
        let mut failure = None;
        for_each_source(&sources, |source| {
            if failure.is_some() {
                return;
            }
            match source.journal(accounts) {
                Ok(Some(entry)) => {
                    match source {
                        PostingSource::Invoice(_) => counts.invoices += 1,
                        PostingSource::Expense(_) => counts.expenses += 1,
                        PostingSource::Payment(_) => counts.payments += 1,
                        PostingSource::Bill(_) => counts.bills += 1,
                        PostingSource::BillPayment(_) => counts.bill_payments += 1,
                        PostingSource::Transfer(_) => counts.transfers += 1,
                    }
                    entries.push(entry);
                }
                Ok(None) => {}
                Err(e) => failure = Some(e),
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }

        // Stable sort keeps the per-kind order for entries on the same day.
        entries.sort_by_key(|e| e.entry_date);

        let total_debits = entries.iter().map(|e| e.total_debits()).sum();
        let total_credits = entries.iter().map(|e| e.total_credits()).sum();

        Ok(Self {
            duplicate_expense_ids,
            account_assignments,
            entries,
            counts,
            total_debits,
            total_credits,
        })
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debits == self.total_credits
    }
}

/// Outcome of a rebuild, as stored (or, for a dry run, as it would be).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RejournalizeReport {
    pub dry_run: bool,
    pub counts: RebuildCounts,
    pub total_debits: Money,
    pub total_credits: Money,
    pub net_income: Money,
}

impl RejournalizeReport {
    pub fn balanced(&self) -> bool {
        self.total_debits == self.total_credits
    }
}

/// Visit postable documents in rebuild order: invoices, expenses, payments,
/// bills, bill payments, transfers.
fn for_each_source<'a>(sources: &'a RebuildSources, mut visit: impl FnMut(PostingSource<'a>)) {
    sources
        .invoices
        .iter()
        .filter(|i| i.is_postable())
        .for_each(|i| visit(PostingSource::Invoice(i)));
    sources
        .expenses
        .iter()
        .for_each(|e| visit(PostingSource::Expense(e)));
    sources
        .payments
        .iter()
        .for_each(|p| visit(PostingSource::Payment(p)));
    sources
        .bills
        .iter()
        .filter(|b| b.is_postable())
        .for_each(|b| visit(PostingSource::Bill(b)));
    sources
        .bill_payments
        .iter()
        .for_each(|bp| visit(PostingSource::BillPayment(bp)));
    sources
        .transfers
        .iter()
        .for_each(|t| visit(PostingSource::Transfer(t)));
}

/// Expenses sharing payee, total and date with an earlier-created one.
pub fn duplicate_expenses(expenses: &[Expense]) -> Vec<Uuid> {
    let mut ordered: Vec<&Expense> = expenses.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut first_seen: HashMap<(Option<&str>, Money, NaiveDate), Uuid> = HashMap::new();
    let mut duplicates = Vec::new();
    for expense in ordered {
        let key = (expense.payee_name.as_deref(), expense.total, expense.expense_date);
        if first_seen.contains_key(&key) {
            duplicates.push(expense.id);
        } else {
            first_seen.insert(key, expense.id);
        }
    }
    duplicates
}
