//! Invoices, customer payments, and how payments settle invoices.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::PAID_TOLERANCE_CENTS;
use crate::error::{DomainError, DomainResult};
use crate::money::{document_total, Money};

labelled_enum! {
    /// Invoice lifecycle status.
    pub enum InvoiceStatus {
        Draft => "Draft",
        Sent => "Sent",
        Viewed => "Viewed",
        Partial => "Partial",
        Paid => "Paid",
        Overdue => "Overdue",
        Deposited => "Deposited",
        Voided => "Voided",
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

/// Invoice domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub total: Money,
    pub amount_paid: Money,
    pub amount_due: Money,
    pub status: InvoiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invoice creation data
#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
}

impl NewInvoice {
    /// Validate amounts and build the invoice with derived totals.
    pub fn into_invoice(self, id: Uuid, now: DateTime<Utc>) -> DomainResult<Invoice> {
        if self.invoice_number.trim().is_empty() {
            return Err(DomainError::validation("Invoice number is required"));
        }
        if self.subtotal.is_negative() || self.tax_amount.is_negative() {
            return Err(DomainError::validation(
                "Invoice amounts must be non-negative",
            ));
        }
        if let Some(due) = self.due_date {
            if due < self.invoice_date {
                return Err(DomainError::validation(
                    "Due date cannot be before the invoice date",
                ));
            }
        }

        let total = document_total(self.subtotal, self.tax_amount)?;
        Ok(Invoice {
            id,
            invoice_number: self.invoice_number.trim().to_string(),
            customer_id: self.customer_id,
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            total,
            amount_paid: Money::ZERO,
            amount_due: total,
            status: self.status.unwrap_or_default(),
            notes: self.notes,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Invoice {
    /// Whether the invoice posts to the ledger.
    pub fn is_postable(&self) -> bool {
        !matches!(self.status, InvoiceStatus::Draft | InvoiceStatus::Voided)
            && self.total.is_positive()
    }

    /// Whether the invoice still has an outstanding balance for aging.
    pub fn is_open(&self) -> bool {
        !matches!(
            self.status,
            InvoiceStatus::Paid | InvoiceStatus::Voided | InvoiceStatus::Deposited
        ) && self.amount_due.is_positive()
    }

    /// Record a payment against this invoice.
    pub fn apply_payment(&mut self, amount: Money, now: DateTime<Utc>) -> DomainResult<()> {
        if !amount.is_positive() {
            return Err(DomainError::validation("Payment amount must be positive"));
        }
        amount.ensure_entered("Payment amount")?;
        match self.status {
            InvoiceStatus::Voided => {
                return Err(DomainError::validation(
                    "Cannot record a payment on a voided invoice",
                ))
            }
            InvoiceStatus::Draft => {
                return Err(DomainError::validation(
                    "Cannot record a payment on a draft invoice",
                ))
            }
            _ => {}
        }

        let paid = self
            .amount_paid
            .checked_add(amount)
            .ok_or_else(|| DomainError::validation("Amount paid is out of range"))?;
        let remaining = self.total - paid;

        self.amount_paid = paid;
        self.amount_due = remaining.clamp_non_negative();
        self.status = if remaining.cents() <= PAID_TOLERANCE_CENTS {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Partial
        };
        self.updated_at = now;
        Ok(())
    }

    /// Move a draft invoice to Sent, which makes it postable.
    pub fn mark_sent(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != InvoiceStatus::Draft {
            return Err(DomainError::conflict(format!(
                "Only draft invoices can be sent (status is {})",
                self.status
            )));
        }
        self.status = InvoiceStatus::Sent;
        self.updated_at = now;
        Ok(())
    }

    /// Mark the invoice voided. Invoices with payments applied cannot be voided.
    pub fn void(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            InvoiceStatus::Voided => Err(DomainError::conflict("Invoice is already voided")),
            _ if self.amount_paid.is_positive() => Err(DomainError::validation(
                "Cannot void an invoice with payments applied",
            )),
            _ => {
                self.status = InvoiceStatus::Voided;
                self.amount_due = Money::ZERO;
                self.updated_at = now;
                Ok(())
            }
        }
    }
}

/// Customer payment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Payment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    /// Defaults to Undeposited Funds when empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_to_account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payment creation data (applied to a single invoice)
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    pub invoice_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount: Money,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub deposit_to_account_id: Option<Uuid>,
    pub memo: Option<String>,
}

/// Link between a payment and the invoice it settles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentApplication {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(total: i64, status: InvoiceStatus) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: Uuid::new_v4(),
            invoice_number: "INV-1001".to_string(),
            customer_id: Uuid::new_v4(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            due_date: None,
            subtotal: Money::from_cents(total),
            tax_amount: Money::ZERO,
            total: Money::from_cents(total),
            amount_paid: Money::ZERO,
            amount_due: Money::from_cents(total),
            status,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_new_invoice_derives_totals() {
        let new = NewInvoice {
            invoice_number: " INV-7 ".to_string(),
            customer_id: Uuid::new_v4(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 31),
            subtotal: Money::from_cents(10000),
            tax_amount: Money::from_cents(1300),
            status: None,
            notes: None,
        };
        let inv = new.into_invoice(Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(inv.total.cents(), 11300);
        assert_eq!(inv.amount_due.cents(), 11300);
        assert_eq!(inv.status, InvoiceStatus::Draft);
        assert_eq!(inv.invoice_number, "INV-7");
    }

    #[test]
    fn test_oversized_amounts_rejected() {
        let new = NewInvoice {
            invoice_number: "INV-8".to_string(),
            customer_id: Uuid::new_v4(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            due_date: None,
            subtotal: Money::from_cents(i64::MAX),
            tax_amount: Money::from_cents(1),
            status: None,
            notes: None,
        };
        assert!(matches!(
            new.into_invoice(Uuid::new_v4(), Utc::now()),
            Err(DomainError::Validation(_))
        ));

        let mut inv = invoice(10000, InvoiceStatus::Sent);
        assert!(inv.apply_payment(Money::from_cents(i64::MAX), Utc::now()).is_err());
        assert_eq!(inv.amount_paid, Money::ZERO);
    }

    #[test]
    fn test_partial_then_full_payment() {
        let mut inv = invoice(10000, InvoiceStatus::Sent);

        inv.apply_payment(Money::from_cents(4000), Utc::now()).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Partial);
        assert_eq!(inv.amount_due.cents(), 6000);

        inv.apply_payment(Money::from_cents(6000), Utc::now()).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert_eq!(inv.amount_due, Money::ZERO);
    }

    #[test]
    fn test_payment_within_a_cent_marks_paid() {
        let mut inv = invoice(10000, InvoiceStatus::Sent);
        inv.apply_payment(Money::from_cents(9999), Utc::now()).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert_eq!(inv.amount_due.cents(), 1);
    }

    #[test]
    fn test_overpayment_clamps_due() {
        let mut inv = invoice(10000, InvoiceStatus::Overdue);
        inv.apply_payment(Money::from_cents(12000), Utc::now()).unwrap();
        assert_eq!(inv.amount_due, Money::ZERO);
        assert_eq!(inv.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_payment_rejected_on_voided_or_draft() {
        let mut voided = invoice(10000, InvoiceStatus::Voided);
        assert!(voided.apply_payment(Money::from_cents(100), Utc::now()).is_err());

        let mut draft = invoice(10000, InvoiceStatus::Draft);
        assert!(draft.apply_payment(Money::from_cents(100), Utc::now()).is_err());

        let mut sent = invoice(10000, InvoiceStatus::Sent);
        assert!(sent.apply_payment(Money::ZERO, Utc::now()).is_err());
    }

    #[test]
    fn test_void_rules() {
        let mut inv = invoice(10000, InvoiceStatus::Sent);
        inv.void(Utc::now()).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Voided);
        assert!(matches!(inv.void(Utc::now()), Err(DomainError::Conflict(_))));

        let mut paid = invoice(10000, InvoiceStatus::Sent);
        paid.apply_payment(Money::from_cents(500), Utc::now()).unwrap();
        assert!(matches!(paid.void(Utc::now()), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_mark_sent_only_from_draft() {
        let mut inv = invoice(10000, InvoiceStatus::Draft);
        inv.mark_sent(Utc::now()).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Sent);
        assert!(inv.is_postable());
        assert!(matches!(inv.mark_sent(Utc::now()), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn test_open_and_postable() {
        assert!(invoice(100, InvoiceStatus::Sent).is_open());
        assert!(!invoice(100, InvoiceStatus::Deposited).is_open());
        assert!(!invoice(0, InvoiceStatus::Sent).is_open());
        assert!(invoice(100, InvoiceStatus::Paid).is_postable());
        assert!(!invoice(100, InvoiceStatus::Draft).is_postable());
        assert!(!invoice(0, InvoiceStatus::Sent).is_postable());
    }
}
