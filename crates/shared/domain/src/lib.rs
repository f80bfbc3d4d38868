//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the double-entry ledger rules, the documents that post to it, bank rules,
//! reconciliation, reporting, and the course publishing lifecycle.
//! All types here are shared across microservices via the proto crate.

#[macro_use]
mod label;

pub mod account;
pub mod aging;
pub mod bank;
pub mod constants;
pub mod course;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod invoice;
pub mod journal;
pub mod money;
pub mod party;
pub mod posting;
pub mod purchase;
pub mod rebuild;
pub mod reconciliation;
pub mod reports;
pub mod role;
pub mod transfer;
pub mod trend;

pub use account::{Account, AccountType, NewAccount, NormalBalance, SystemAccount};
pub use aging::{AgingBucket, AgingItem, AgingKind, AgingReport, AgingRow, BucketTotals};
pub use bank::{
    BankRule, BankTransaction, BankTransactionStatus, ImportedTransaction, NewBankRule,
    NewBankTransaction, RuleCondition, RuleField, RuleOperator, RuleOutcome,
};
pub use constants::*;
pub use course::{BulkStatusOutcome, Course, CourseStats, CourseStatus, NewCourse, PublishFields};
pub use dashboard::{Dashboard, Metric};
pub use error::{DomainError, DomainResult};
pub use invoice::{Invoice, InvoiceStatus, NewInvoice, NewPayment, Payment, PaymentApplication};
pub use journal::{JournalEntry, JournalLine, NewJournalEntry, SourceRef, SourceType};
pub use money::{format_bps, format_cents, Money};
pub use party::{Customer, NewParty, Supplier};
pub use posting::{PostingSource, SystemAccounts};
pub use purchase::{
    Bill, BillPayment, BillStatus, Expense, ExpenseType, NewBill, NewBillPayment, NewExpense,
    PayeeType,
};
pub use rebuild::{RebuildCounts, RebuildPlan, RebuildSources, RejournalizeReport};
pub use reconciliation::{Reconciliation, ReconciliationStatus, ReconciliationWorkspace};
pub use reports::{
    BalanceSheet, LedgerLine, MonthlyBalance, MonthlyProfitAndLoss, ProfitAndLoss, ReportRow,
    TrialBalance, TrialBalanceRow,
};
pub use role::UserRole;
pub use transfer::{NewTransfer, Transfer};
pub use trend::{calc_trend, PeriodRanges, ReportPeriod, Trend, TrendDirection};
