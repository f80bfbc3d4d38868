//! HTTP handlers, one module per resource group.

pub mod account_handler;
pub mod bank_handler;
pub mod course_handler;
pub mod health_handler;
pub mod journal_handler;
pub mod maintenance_handler;
pub mod purchase_handler;
pub mod report_handler;
pub mod sales_handler;

use chrono::NaiveDate;

pub use account_handler::{account_routes, customer_routes, supplier_routes};
pub use bank_handler::{bank_rule_routes, bank_transaction_routes, reconciliation_routes};
pub use course_handler::course_routes;
pub use health_handler::health_routes;
pub use journal_handler::journal_routes;
pub use maintenance_handler::maintenance_routes;
pub use purchase_handler::{bill_routes, expense_routes, transfer_routes};
pub use report_handler::report_routes;
pub use sales_handler::{invoice_routes, payment_routes};

/// Wire format for dates sent to the backing services.
pub(crate) fn date_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
