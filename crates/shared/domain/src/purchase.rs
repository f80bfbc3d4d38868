//! Expenses, supplier bills, and bill payments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::money::{document_total, Money};

labelled_enum! {
    pub enum ExpenseType {
        Expense => "Expense",
        ChequeExpense => "Cheque Expense",
    }
}

labelled_enum! {
    pub enum PayeeType {
        Supplier => "supplier",
        Customer => "customer",
        Other => "other",
    }
}

labelled_enum! {
    /// Bill lifecycle status.
    pub enum BillStatus {
        Draft => "Draft",
        Open => "Open",
        Partial => "Partial",
        Paid => "Paid",
        Overdue => "Overdue",
        Voided => "Voided",
    }
}

/// Expense paid directly from a bank or card account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Expense {
    pub id: Uuid,
    pub expense_type: ExpenseType,
    pub payee_type: PayeeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_name: Option<String>,
    /// Expense category account; unset means Miscellaneous Expenses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    /// Account the money left from; unset means the operating bank
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_account_id: Option<Uuid>,
    pub expense_date: NaiveDate,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub total: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Supplier to tag ledger lines with, when the payee is one.
    pub fn supplier_id(&self) -> Option<Uuid> {
        match self.payee_type {
            PayeeType::Supplier => self.payee_id,
            _ => None,
        }
    }

    pub fn payee_label(&self) -> &str {
        self.payee_name
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or("Unknown")
    }
}

/// Expense creation data
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub expense_type: Option<ExpenseType>,
    pub payee_type: Option<PayeeType>,
    pub payee_id: Option<Uuid>,
    pub payee_name: Option<String>,
    pub account_id: Option<Uuid>,
    pub payment_account_id: Option<Uuid>,
    pub expense_date: NaiveDate,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub memo: Option<String>,
}

impl NewExpense {
    pub fn into_expense(self, id: Uuid, now: DateTime<Utc>) -> DomainResult<Expense> {
        if self.subtotal.is_negative() || self.tax_amount.is_negative() {
            return Err(DomainError::validation(
                "Expense amounts must be non-negative",
            ));
        }
        let total = document_total(self.subtotal, self.tax_amount)?;
        let payee_type = self.payee_type.unwrap_or(PayeeType::Other);
        if payee_type != PayeeType::Other && self.payee_id.is_none() {
            return Err(DomainError::validation(format!(
                "A {} payee requires a payee id",
                payee_type
            )));
        }

        Ok(Expense {
            id,
            expense_type: self.expense_type.unwrap_or(ExpenseType::Expense),
            payee_type,
            payee_id: self.payee_id,
            payee_name: self.payee_name,
            account_id: self.account_id,
            payment_account_id: self.payment_account_id,
            expense_date: self.expense_date,
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            total,
            memo: self.memo,
            created_at: now,
        })
    }
}

/// Supplier bill, payable later
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Bill {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_number: Option<String>,
    pub supplier_id: Uuid,
    /// Expense category account; unset means Miscellaneous Expenses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    pub bill_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub total: Money,
    pub amount_paid: Money,
    pub amount_due: Money,
    pub status: BillStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Display reference used in journal memos.
    pub fn reference(&self) -> String {
        match self.bill_number.as_deref().filter(|n| !n.is_empty()) {
            Some(number) => number.to_string(),
            None => self.id.simple().to_string()[..8].to_string(),
        }
    }

    pub fn is_postable(&self) -> bool {
        !matches!(self.status, BillStatus::Draft | BillStatus::Voided) && self.total.is_positive()
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.status, BillStatus::Paid | BillStatus::Voided)
            && self.amount_due.is_positive()
    }

    /// Record a payment against the bill.
    pub fn apply_payment(&mut self, amount: Money, now: DateTime<Utc>) -> DomainResult<()> {
        if !amount.is_positive() {
            return Err(DomainError::validation("Payment amount must be positive"));
        }
        amount.ensure_entered("Payment amount")?;
        if matches!(self.status, BillStatus::Voided | BillStatus::Draft) {
            return Err(DomainError::validation(format!(
                "Cannot pay a {} bill",
                self.status.as_str().to_lowercase()
            )));
        }

        self.amount_paid = self
            .amount_paid
            .checked_add(amount)
            .ok_or_else(|| DomainError::validation("Amount paid is out of range"))?;
        self.amount_due = (self.total - self.amount_paid).clamp_non_negative();
        self.status = if self.amount_paid >= self.total {
            BillStatus::Paid
        } else {
            BillStatus::Partial
        };
        self.updated_at = now;
        Ok(())
    }
}

/// Bill creation data
#[derive(Debug, Clone, Deserialize)]
pub struct NewBill {
    pub bill_number: Option<String>,
    pub supplier_id: Uuid,
    pub account_id: Option<Uuid>,
    pub bill_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub memo: Option<String>,
}

impl NewBill {
    /// New bills are entered as Open.
    pub fn into_bill(self, id: Uuid, now: DateTime<Utc>) -> DomainResult<Bill> {
        if self.subtotal.is_negative() || self.tax_amount.is_negative() {
            return Err(DomainError::validation("Bill amounts must be non-negative"));
        }
        let total = document_total(self.subtotal, self.tax_amount)?;
        Ok(Bill {
            id,
            bill_number: self.bill_number,
            supplier_id: self.supplier_id,
            account_id: self.account_id,
            bill_date: self.bill_date,
            due_date: self.due_date,
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            total,
            amount_paid: Money::ZERO,
            amount_due: total,
            status: BillStatus::Open,
            memo: self.memo,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Payment made against a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BillPayment {
    pub id: Uuid,
    pub bill_id: Uuid,
    pub supplier_id: Uuid,
    pub payment_account_id: Uuid,
    pub amount: Money,
    pub payment_date: NaiveDate,
    /// Bill reference at the time of payment, used in journal memos
    pub bill_reference: String,
    pub created_at: DateTime<Utc>,
}

/// Bill payment creation data
#[derive(Debug, Clone, Deserialize)]
pub struct NewBillPayment {
    pub bill_id: Uuid,
    pub payment_account_id: Uuid,
    pub amount: Money,
    pub payment_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bill(total: i64) -> Bill {
        NewBill {
            bill_number: Some("B-12".to_string()),
            supplier_id: Uuid::new_v4(),
            account_id: None,
            bill_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            due_date: None,
            subtotal: Money::from_cents(total),
            tax_amount: Money::ZERO,
            memo: None,
        }
        .into_bill(Uuid::new_v4(), Utc::now())
        .unwrap()
    }

    #[test]
    fn test_bill_payment_statuses() {
        let mut b = bill(5000);
        assert_eq!(b.status, BillStatus::Open);

        b.apply_payment(Money::from_cents(2000), Utc::now()).unwrap();
        assert_eq!(b.status, BillStatus::Partial);
        assert_eq!(b.amount_due.cents(), 3000);

        b.apply_payment(Money::from_cents(3000), Utc::now()).unwrap();
        assert_eq!(b.status, BillStatus::Paid);
        assert!(!b.is_open());
    }

    #[test]
    fn test_oversized_bill_rejected() {
        let result = NewBill {
            bill_number: None,
            supplier_id: Uuid::new_v4(),
            account_id: None,
            bill_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            due_date: None,
            subtotal: Money::from_cents(1),
            tax_amount: Money::from_cents(i64::MAX),
            memo: None,
        }
        .into_bill(Uuid::new_v4(), Utc::now());
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_voided_bill_rejects_payment() {
        let mut b = bill(5000);
        b.status = BillStatus::Voided;
        assert!(b.apply_payment(Money::from_cents(100), Utc::now()).is_err());
    }

    #[test]
    fn test_expense_requires_payee_id_for_supplier() {
        let new = NewExpense {
            expense_type: None,
            payee_type: Some(PayeeType::Supplier),
            payee_id: None,
            payee_name: Some("Office Depot".to_string()),
            account_id: None,
            payment_account_id: None,
            expense_date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            subtotal: Money::from_cents(1000),
            tax_amount: Money::from_cents(130),
            memo: None,
        };
        assert!(new.into_expense(Uuid::new_v4(), Utc::now()).is_err());
    }

    #[test]
    fn test_expense_totals_and_labels() {
        let supplier = Uuid::new_v4();
        let expense = NewExpense {
            expense_type: None,
            payee_type: Some(PayeeType::Supplier),
            payee_id: Some(supplier),
            payee_name: None,
            account_id: None,
            payment_account_id: None,
            expense_date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            subtotal: Money::from_cents(1000),
            tax_amount: Money::from_cents(130),
            memo: None,
        }
        .into_expense(Uuid::new_v4(), Utc::now())
        .unwrap();

        assert_eq!(expense.total.cents(), 1130);
        assert_eq!(expense.supplier_id(), Some(supplier));
        assert_eq!(expense.payee_label(), "Unknown");
        assert_eq!(expense.expense_type, ExpenseType::Expense);
    }
}
