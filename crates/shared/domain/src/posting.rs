//! Posting rules: how each source document becomes a journal entry.
//!
//! The same generators back live posting and the ledger rebuild, so a rebuilt
//! ledger matches what incremental posting would have produced.

use std::collections::HashMap;

use uuid::Uuid;

use crate::account::SystemAccount;
use crate::constants::PAYMENT_PROCESSOR_PAYEE;
use crate::error::{DomainError, DomainResult};
use crate::invoice::{Invoice, Payment};
use crate::journal::{JournalLine, NewJournalEntry, SourceType};
use crate::purchase::{Bill, BillPayment, Expense};
use crate::transfer::Transfer;

/// Resolved ids of the system accounts a posting needs.
#[derive(Debug, Clone, Default)]
pub struct SystemAccounts {
    ids: HashMap<SystemAccount, Uuid>,
}

impl SystemAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, account: SystemAccount, id: Uuid) {
        self.ids.insert(account, id);
    }

    pub fn with(mut self, account: SystemAccount, id: Uuid) -> Self {
        self.insert(account, id);
        self
    }

    pub fn get(&self, account: SystemAccount) -> DomainResult<Uuid> {
        self.ids.get(&account).copied().ok_or_else(|| {
            DomainError::internal(format!("System account '{}' was not resolved", account.name()))
        })
    }
}

/// A document that posts to the ledger.
#[derive(Debug, Clone, Copy)]
pub enum PostingSource<'a> {
    Invoice(&'a Invoice),
    Payment(&'a Payment),
    Expense(&'a Expense),
    Bill(&'a Bill),
    BillPayment(&'a BillPayment),
    Transfer(&'a Transfer),
}

impl PostingSource<'_> {
    pub fn source_type(&self) -> SourceType {
        match self {
            PostingSource::Invoice(_) => SourceType::Invoice,
            PostingSource::Payment(_) => SourceType::Payment,
            PostingSource::Expense(_) => SourceType::Expense,
            PostingSource::Bill(_) => SourceType::Bill,
            PostingSource::BillPayment(_) => SourceType::BillPayment,
            PostingSource::Transfer(_) => SourceType::Transfer,
        }
    }

    /// System accounts that must be resolved before calling [`Self::journal`].
    pub fn required_accounts(&self) -> Vec<SystemAccount> {
        match self {
            PostingSource::Invoice(inv) => {
                let mut accounts = vec![SystemAccount::AccountsReceivable];
                if (inv.total - inv.tax_amount).is_positive() {
                    accounts.push(SystemAccount::Sales);
                }
                if inv.tax_amount.is_positive() {
                    accounts.push(SystemAccount::SalesTaxPayable);
                }
                accounts
            }
            PostingSource::Payment(pmt) => {
                let mut accounts = vec![SystemAccount::AccountsReceivable];
                if pmt.deposit_to_account_id.is_none() {
                    accounts.push(SystemAccount::UndepositedFunds);
                }
                accounts
            }
            PostingSource::Expense(exp) => {
                let mut accounts = Vec::new();
                if exp.account_id.is_none() {
                    accounts.push(classify_unassigned_expense(exp.payee_name.as_deref()));
                }
                if exp.tax_amount.is_positive() {
                    accounts.push(SystemAccount::SalesTaxReceivable);
                }
                if exp.payment_account_id.is_none() {
                    accounts.push(SystemAccount::OperatingBank);
                }
                accounts
            }
            PostingSource::Bill(bill) => {
                let mut accounts = vec![SystemAccount::AccountsPayable];
                if bill.account_id.is_none() {
                    accounts.push(SystemAccount::MiscellaneousExpenses);
                }
                if bill.tax_amount.is_positive() {
                    accounts.push(SystemAccount::SalesTaxReceivable);
                }
                accounts
            }
            PostingSource::BillPayment(_) => vec![SystemAccount::AccountsPayable],
            PostingSource::Transfer(_) => Vec::new(),
        }
    }

    /// Journal entry for the document, or `None` when there is nothing to post.
    pub fn journal(&self, accounts: &SystemAccounts) -> DomainResult<Option<NewJournalEntry>> {
        let entry = match self {
            PostingSource::Invoice(inv) => invoice_entry(inv, accounts)?,
            PostingSource::Payment(pmt) => payment_entry(pmt, accounts)?,
            PostingSource::Expense(exp) => expense_entry(exp, accounts)?,
            PostingSource::Bill(bill) => bill_entry(bill, accounts)?,
            PostingSource::BillPayment(bp) => bill_payment_entry(bp, accounts)?,
            PostingSource::Transfer(t) => transfer_entry(t),
        };

        if let Some(ref e) = entry {
            e.validate()?;
        }
        Ok(entry)
    }
}

/// Expense account for an expense recorded without one.
pub fn classify_unassigned_expense(payee: Option<&str>) -> SystemAccount {
    match payee {
        Some(p) if p.to_lowercase().contains(PAYMENT_PROCESSOR_PAYEE) => {
            SystemAccount::PaymentProcessingFees
        }
        _ => SystemAccount::MiscellaneousExpenses,
    }
}

/// Dr Accounts Receivable / Cr Sales (+ Cr sales tax payable).
fn invoice_entry(inv: &Invoice, accounts: &SystemAccounts) -> DomainResult<Option<NewJournalEntry>> {
    if inv.total.is_zero() {
        return Ok(None);
    }

    let no = &inv.invoice_number;
    let net_sales = inv.total - inv.tax_amount;
    let mut lines = vec![JournalLine::debit(
        accounts.get(SystemAccount::AccountsReceivable)?,
        inv.total,
        format!("Invoice {}", no),
    )
    .with_customer(inv.customer_id)];
    if net_sales.is_positive() {
        lines.push(JournalLine::credit(
            accounts.get(SystemAccount::Sales)?,
            net_sales,
            format!("Invoice {} - Sales", no),
        ));
    }
    if inv.tax_amount.is_positive() {
        lines.push(JournalLine::credit(
            accounts.get(SystemAccount::SalesTaxPayable)?,
            inv.tax_amount,
            format!("Invoice {} - Tax", no),
        ));
    }

    Ok(Some(
        NewJournalEntry::new(inv.invoice_date, format!("Invoice {}", no), lines)
            .with_source(SourceType::Invoice, inv.id),
    ))
}

/// Dr deposit account (Undeposited Funds by default) / Cr Accounts Receivable.
fn payment_entry(pmt: &Payment, accounts: &SystemAccounts) -> DomainResult<Option<NewJournalEntry>> {
    if pmt.amount.is_zero() {
        return Ok(None);
    }

    let deposit = match pmt.deposit_to_account_id {
        Some(id) => id,
        None => accounts.get(SystemAccount::UndepositedFunds)?,
    };
    let lines = vec![
        JournalLine::debit(deposit, pmt.amount, "Payment received").with_customer(pmt.customer_id),
        JournalLine::credit(
            accounts.get(SystemAccount::AccountsReceivable)?,
            pmt.amount,
            "Payment applied",
        )
        .with_customer(pmt.customer_id),
    ];

    let memo = match pmt.reference_number.as_deref().filter(|r| !r.is_empty()) {
        Some(reference) => format!("Payment received ({})", reference),
        None => "Payment received".to_string(),
    };

    Ok(Some(
        NewJournalEntry::new(pmt.payment_date, memo, lines).with_source(SourceType::Payment, pmt.id),
    ))
}

/// Dr expense (+ Dr sales tax receivable) / Cr payment account.
fn expense_entry(exp: &Expense, accounts: &SystemAccounts) -> DomainResult<Option<NewJournalEntry>> {
    if exp.total.is_zero() {
        return Ok(None);
    }

    let expense_account = match exp.account_id {
        Some(id) => id,
        None => accounts.get(classify_unassigned_expense(exp.payee_name.as_deref()))?,
    };
    let payment_account = match exp.payment_account_id {
        Some(id) => id,
        None => accounts.get(SystemAccount::OperatingBank)?,
    };
    let payee = exp.payee_label();
    let supplier = exp.supplier_id();

    let mut lines = Vec::with_capacity(3);
    if exp.subtotal.is_positive() {
        lines.push(JournalLine::debit(
            expense_account,
            exp.subtotal,
            format!("Expense: {}", payee),
        ));
    }
    if exp.tax_amount.is_positive() {
        lines.push(JournalLine::debit(
            accounts.get(SystemAccount::SalesTaxReceivable)?,
            exp.tax_amount,
            "Tax on expense",
        ));
    }
    lines.push(JournalLine::credit(
        payment_account,
        exp.total,
        "Payment for expense",
    ));

    if let Some(supplier_id) = supplier {
        lines = lines.into_iter().map(|l| l.with_supplier(supplier_id)).collect();
    }

    Ok(Some(
        NewJournalEntry::new(exp.expense_date, format!("Expense paid to {}", payee), lines)
            .with_source(SourceType::Expense, exp.id),
    ))
}

/// Dr expense (+ Dr sales tax receivable) / Cr Accounts Payable.
fn bill_entry(bill: &Bill, accounts: &SystemAccounts) -> DomainResult<Option<NewJournalEntry>> {
    if bill.total.is_zero() {
        return Ok(None);
    }

    let reference = bill.reference();
    let expense_account = match bill.account_id {
        Some(id) => id,
        None => accounts.get(SystemAccount::MiscellaneousExpenses)?,
    };

    let mut lines = Vec::with_capacity(3);
    if bill.subtotal.is_positive() {
        lines.push(
            JournalLine::debit(expense_account, bill.subtotal, format!("Bill {}", reference))
                .with_supplier(bill.supplier_id),
        );
    }
    if bill.tax_amount.is_positive() {
        lines.push(
            JournalLine::debit(
                accounts.get(SystemAccount::SalesTaxReceivable)?,
                bill.tax_amount,
                format!("Bill {} - Tax", reference),
            )
            .with_supplier(bill.supplier_id),
        );
    }
    lines.push(
        JournalLine::credit(
            accounts.get(SystemAccount::AccountsPayable)?,
            bill.total,
            format!("Bill {}", reference),
        )
        .with_supplier(bill.supplier_id),
    );

    Ok(Some(
        NewJournalEntry::new(bill.bill_date, format!("Bill {}", reference), lines)
            .with_source(SourceType::Bill, bill.id),
    ))
}

/// Dr Accounts Payable / Cr payment account.
fn bill_payment_entry(
    bp: &BillPayment,
    accounts: &SystemAccounts,
) -> DomainResult<Option<NewJournalEntry>> {
    if bp.amount.is_zero() {
        return Ok(None);
    }

    let lines = vec![
        JournalLine::debit(
            accounts.get(SystemAccount::AccountsPayable)?,
            bp.amount,
            format!("Payment on Bill #{}", bp.bill_reference),
        )
        .with_supplier(bp.supplier_id),
        JournalLine::credit(bp.payment_account_id, bp.amount, "Payment from account"),
    ];

    Ok(Some(
        NewJournalEntry::new(
            bp.payment_date,
            format!("Bill payment for Bill #{}", bp.bill_reference),
            lines,
        )
        .with_source(SourceType::BillPayment, bp.id),
    ))
}

/// Dr destination / Cr source.
fn transfer_entry(t: &Transfer) -> Option<NewJournalEntry> {
    if t.amount.is_zero() {
        return None;
    }

    let lines = vec![
        JournalLine::debit(t.to_account_id, t.amount, "Transfer in"),
        JournalLine::credit(t.from_account_id, t.amount, "Transfer out"),
    ];
    let memo = t
        .memo
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "Transfer between accounts".to_string());

    Some(
        NewJournalEntry::new(t.transfer_date, memo, lines).with_source(SourceType::Transfer, t.id),
    )
}
