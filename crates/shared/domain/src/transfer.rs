//! Transfers between two balance-sheet accounts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Transfer {
    pub id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Money,
    pub transfer_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransfer {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Money,
    pub transfer_date: NaiveDate,
    pub memo: Option<String>,
}

impl NewTransfer {
    pub fn into_transfer(self, id: Uuid, now: DateTime<Utc>) -> DomainResult<Transfer> {
        if self.from_account_id == self.to_account_id {
            return Err(DomainError::validation(
                "Transfer accounts must be different",
            ));
        }
        if !self.amount.is_positive() {
            return Err(DomainError::validation("Transfer amount must be positive"));
        }
        self.amount.ensure_entered("Transfer amount")?;
        Ok(Transfer {
            id,
            from_account_id: self.from_account_id,
            to_account_id: self.to_account_id,
            amount: self.amount,
            transfer_date: self.transfer_date,
            memo: self.memo,
            created_at: now,
        })
    }
}
