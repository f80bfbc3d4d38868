//! Ledger business logic.

mod account_service;
mod banking_service;
mod billing_service;
mod journal_service;
mod maintenance_service;
mod report_service;

pub use account_service::{AccountBalance, AccountManager, AccountService};
pub use banking_service::{BankingManager, BankingService, ImportSummary};
pub use billing_service::{BillingManager, BillingService};
pub use journal_service::{JournalManager, JournalService};
pub use maintenance_service::{MaintenanceManager, MaintenanceService};
pub use report_service::{ReportManager, ReportService};
