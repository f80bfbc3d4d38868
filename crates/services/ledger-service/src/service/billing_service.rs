//! Sales and purchase documents.
//!
//! Documents are checked against their customer, supplier and accounts here.
//! Posting happens in the repository, inside the same transaction as the
//! document write.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use common::{AppResult, OptionExt};
use domain::{
    Bill, BillPayment, Expense, Invoice, JournalEntry, NewBill, NewBillPayment, NewExpense,
    NewInvoice, NewPayment, NewTransfer, PayeeType, Payment, Transfer,
};

use crate::repository::{AccountRepository, BillFilter, DocumentRepository, InvoiceFilter};

#[async_trait]
pub trait BillingService: Send + Sync {
    async fn create_invoice(&self, invoice: NewInvoice) -> AppResult<Invoice>;

    async fn get_invoice(&self, id: Uuid) -> AppResult<Invoice>;

    async fn list_invoices(&self, filter: InvoiceFilter) -> AppResult<Vec<Invoice>>;

    async fn send_invoice(&self, id: Uuid) -> AppResult<Invoice>;

    async fn void_invoice(&self, id: Uuid, reason: Option<String>) -> AppResult<Invoice>;

    async fn record_payment(&self, payment: NewPayment) -> AppResult<Payment>;

    async fn list_payments(&self, customer_id: Option<Uuid>) -> AppResult<Vec<Payment>>;

    async fn create_expense(&self, expense: NewExpense) -> AppResult<Expense>;

    async fn list_expenses(&self) -> AppResult<Vec<Expense>>;

    async fn create_bill(&self, bill: NewBill) -> AppResult<Bill>;

    async fn list_bills(&self, filter: BillFilter) -> AppResult<Vec<Bill>>;

    async fn pay_bill(&self, payment: NewBillPayment) -> AppResult<BillPayment>;

    async fn create_transfer(&self, transfer: NewTransfer) -> AppResult<Transfer>;

    async fn list_transfers(&self) -> AppResult<Vec<Transfer>>;
}

pub struct BillingManager {
    documents: Arc<dyn DocumentRepository>,
    accounts: Arc<dyn AccountRepository>,
}

impl BillingManager {
    pub fn new(documents: Arc<dyn DocumentRepository>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self {
            documents,
            accounts,
        }
    }

    async fn require_account(&self, id: Option<Uuid>) -> AppResult<()> {
        if let Some(id) = id {
            self.accounts
                .find_account(id)
                .await?
                .ok_or_not_found("Account")?;
        }
        Ok(())
    }

    async fn require_customer(&self, id: Uuid) -> AppResult<()> {
        self.accounts
            .find_customer(id)
            .await?
            .ok_or_not_found("Customer")
            .map(|_| ())
    }

    async fn require_supplier(&self, id: Uuid) -> AppResult<()> {
        self.accounts
            .find_supplier(id)
            .await?
            .ok_or_not_found("Supplier")
            .map(|_| ())
    }
}

fn log_posting(document: &str, entry: Option<&JournalEntry>) {
    match entry {
        Some(entry) => tracing::info!("{} posted as {}", document, entry.entry_number),
        None => tracing::debug!("{} stored without posting", document),
    }
}

#[async_trait]
impl BillingService for BillingManager {
    async fn create_invoice(&self, invoice: NewInvoice) -> AppResult<Invoice> {
        self.require_customer(invoice.customer_id).await?;

        let invoice = invoice.into_invoice(Uuid::new_v4(), Utc::now())?;
        let posted = self.documents.create_invoice(invoice).await?;
        log_posting(
            &format!("Invoice {}", posted.document.invoice_number),
            posted.entry.as_ref(),
        );
        Ok(posted.document)
    }

    async fn get_invoice(&self, id: Uuid) -> AppResult<Invoice> {
        self.documents
            .find_invoice(id)
            .await?
            .ok_or_not_found("Invoice")
    }

    async fn list_invoices(&self, filter: InvoiceFilter) -> AppResult<Vec<Invoice>> {
        self.documents.list_invoices(filter).await
    }

    async fn send_invoice(&self, id: Uuid) -> AppResult<Invoice> {
        let posted = self.documents.send_invoice(id, Utc::now()).await?;
        log_posting(
            &format!("Invoice {}", posted.document.invoice_number),
            posted.entry.as_ref(),
        );
        Ok(posted.document)
    }

    async fn void_invoice(&self, id: Uuid, reason: Option<String>) -> AppResult<Invoice> {
        let now = Utc::now();
        let voided = self
            .documents
            .void_invoice(id, reason, now.date_naive(), now)
            .await?;
        tracing::info!(
            "Voided invoice {} ({} reversing entries)",
            voided.invoice.invoice_number,
            voided.reversals.len()
        );
        Ok(voided.invoice)
    }

    async fn record_payment(&self, payment: NewPayment) -> AppResult<Payment> {
        self.require_account(payment.deposit_to_account_id).await?;

        let receipt = self.documents.record_payment(payment, Utc::now()).await?;
        log_posting(
            &format!(
                "Payment on invoice {} ({})",
                receipt.invoice.invoice_number, receipt.invoice.status
            ),
            receipt.entry.as_ref(),
        );
        Ok(receipt.payment)
    }

    async fn list_payments(&self, customer_id: Option<Uuid>) -> AppResult<Vec<Payment>> {
        self.documents.list_payments(customer_id).await
    }

    async fn create_expense(&self, expense: NewExpense) -> AppResult<Expense> {
        self.require_account(expense.account_id).await?;
        self.require_account(expense.payment_account_id).await?;
        match (expense.payee_type, expense.payee_id) {
            (Some(PayeeType::Supplier), Some(id)) => self.require_supplier(id).await?,
            (Some(PayeeType::Customer), Some(id)) => self.require_customer(id).await?,
            _ => {}
        }

        let expense = expense.into_expense(Uuid::new_v4(), Utc::now())?;
        let posted = self.documents.create_expense(expense).await?;
        log_posting(
            &format!("Expense to {}", posted.document.payee_label()),
            posted.entry.as_ref(),
        );
        Ok(posted.document)
    }

    async fn list_expenses(&self) -> AppResult<Vec<Expense>> {
        self.documents.list_expenses().await
    }

    async fn create_bill(&self, bill: NewBill) -> AppResult<Bill> {
        self.require_supplier(bill.supplier_id).await?;
        self.require_account(bill.account_id).await?;

        let bill = bill.into_bill(Uuid::new_v4(), Utc::now())?;
        let posted = self.documents.create_bill(bill).await?;
        log_posting(
            &format!("Bill {}", posted.document.reference()),
            posted.entry.as_ref(),
        );
        Ok(posted.document)
    }

    async fn list_bills(&self, filter: BillFilter) -> AppResult<Vec<Bill>> {
        self.documents.list_bills(filter).await
    }

    async fn pay_bill(&self, payment: NewBillPayment) -> AppResult<BillPayment> {
        self.require_account(Some(payment.payment_account_id)).await?;

        let receipt = self.documents.pay_bill(payment, Utc::now()).await?;
        log_posting(
            &format!("Payment on bill {}", receipt.payment.bill_reference),
            receipt.entry.as_ref(),
        );
        Ok(receipt.payment)
    }

    async fn create_transfer(&self, transfer: NewTransfer) -> AppResult<Transfer> {
        self.require_account(Some(transfer.from_account_id)).await?;
        self.require_account(Some(transfer.to_account_id)).await?;

        let transfer = transfer.into_transfer(Uuid::new_v4(), Utc::now())?;
        let posted = self.documents.create_transfer(transfer).await?;
        log_posting("Transfer", posted.entry.as_ref());
        Ok(posted.document)
    }

    async fn list_transfers(&self) -> AppResult<Vec<Transfer>> {
        self.documents.list_transfers().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::AppError;
    use domain::{Customer, InvoiceStatus, Money};

    use crate::repository::{MockAccountRepository, MockDocumentRepository, Posted};

    fn customer(id: Uuid) -> Customer {
        Customer {
            id,
            display_name: "Ana Lima".to_string(),
            company: None,
            email: Some("ana@example.com".to_string()),
            phone: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn new_invoice(customer_id: Uuid, status: Option<InvoiceStatus>) -> NewInvoice {
        NewInvoice {
            invoice_number: "INV-1001".to_string(),
            customer_id,
            invoice_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            subtotal: Money::from_cents(20_000),
            tax_amount: Money::from_cents(2_600),
            status,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_invoice_requires_customer() {
        let mut accounts = MockAccountRepository::new();
        accounts.expect_find_customer().returning(|_| Ok(None));
        let mut documents = MockDocumentRepository::new();
        documents.expect_create_invoice().never();

        let service = BillingManager::new(Arc::new(documents), Arc::new(accounts));
        let result = service
            .create_invoice(new_invoice(Uuid::new_v4(), None))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_invoice_derives_totals_before_storing() {
        let customer_id = Uuid::new_v4();

        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_customer()
            .returning(|id| Ok(Some(customer(id))));
        let mut documents = MockDocumentRepository::new();
        documents
            .expect_create_invoice()
            .withf(|inv| inv.total == Money::from_cents(22_600) && inv.amount_due == inv.total)
            .returning(|inv| {
                Ok(Posted {
                    document: inv,
                    entry: None,
                })
            });

        let service = BillingManager::new(Arc::new(documents), Arc::new(accounts));
        let invoice = service
            .create_invoice(new_invoice(customer_id, Some(InvoiceStatus::Sent)))
            .await
            .unwrap();

        assert_eq!(invoice.customer_id, customer_id);
        assert_eq!(invoice.status, InvoiceStatus::Sent);
    }

    #[tokio::test]
    async fn test_create_invoice_rejects_negative_amounts() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_customer()
            .returning(|id| Ok(Some(customer(id))));
        let mut documents = MockDocumentRepository::new();
        documents.expect_create_invoice().never();

        let mut invoice = new_invoice(Uuid::new_v4(), None);
        invoice.subtotal = Money::from_cents(-1);

        let service = BillingManager::new(Arc::new(documents), Arc::new(accounts));
        let result = service.create_invoice(invoice).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_transfer_requires_both_accounts() {
        let known = Uuid::new_v4();

        let mut accounts = MockAccountRepository::new();
        accounts.expect_find_account().returning(move |id| {
            if id == known {
                Ok(Some(domain::Account {
                    id,
                    name: "Operating Account".to_string(),
                    account_type: domain::AccountType::Bank,
                    detail_type: None,
                    description: None,
                    account_number: None,
                    is_active: true,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                }))
            } else {
                Ok(None)
            }
        });
        let mut documents = MockDocumentRepository::new();
        documents.expect_create_transfer().never();

        let service = BillingManager::new(Arc::new(documents), Arc::new(accounts));
        let result = service
            .create_transfer(NewTransfer {
                from_account_id: known,
                to_account_id: Uuid::new_v4(),
                amount: Money::from_cents(5_000),
                transfer_date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
                memo: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
