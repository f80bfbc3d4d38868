//! gRPC clients for calling microservices.

mod convert;
mod course_client;
mod ledger_client;

pub use course_client::CourseClient;
pub use ledger_client::{
    AccountView, ImportSummary, LedgerClient, MonthlyBalanceReport, MonthlyProfitAndLossReport,
    PartyBalance, RuleRunSummary, WorkspaceView,
};
