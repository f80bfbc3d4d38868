//! SeaORM entities for the ledger schema.

pub mod account;
pub mod bank_rule;
pub mod bank_transaction;
pub mod bill;
pub mod bill_payment;
pub mod customer;
pub mod expense;
pub mod invoice;
pub mod journal_entry;
pub mod journal_entry_line;
pub mod payment;
pub mod payment_application;
pub mod reconciliation;
pub mod supplier;
pub mod transfer;

use std::str::FromStr;

use common::{AppError, AppResult};
use domain::DomainError;

/// Parse a stored label column back into its domain enum.
pub(crate) fn parse_label<T>(column: &str, value: &str) -> AppResult<T>
where
    T: FromStr<Err = DomainError>,
{
    value
        .parse()
        .map_err(|_| AppError::internal(format!("Unexpected {} '{}' in storage", column, value)))
}
