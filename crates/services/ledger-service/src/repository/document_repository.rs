//! Source documents and their postings.
//!
//! Every write here runs in a ReadCommitted transaction that covers the
//! document row and the journal entry it posts.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IsolationLevel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::{bill, bill_payment, expense, invoice, payment, payment_application, transfer};
use super::ledger_tx;
use common::{AppError, AppResult, OptionExt};
use domain::{
    Bill, BillPayment, BillStatus, Expense, Invoice, InvoiceStatus, JournalEntry, NewBillPayment,
    NewPayment, Payment, PostingSource, SourceType, Transfer,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// A stored document and the entry it posted, if any.
#[derive(Debug, Clone)]
pub struct Posted<T> {
    pub document: T,
    pub entry: Option<JournalEntry>,
}

/// Outcome of recording a customer payment.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub invoice: Invoice,
    pub entry: Option<JournalEntry>,
}

/// Outcome of paying a bill.
#[derive(Debug, Clone)]
pub struct BillPaymentReceipt {
    pub payment: BillPayment,
    pub bill: Bill,
    pub entry: Option<JournalEntry>,
}

/// Outcome of voiding an invoice.
#[derive(Debug, Clone)]
pub struct VoidedInvoice {
    pub invoice: Invoice,
    pub reversals: Vec<JournalEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub status: Option<BillStatus>,
    pub supplier_id: Option<Uuid>,
}

/// Document repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Store an invoice, posting it unless it is a draft
    async fn create_invoice(&self, invoice: Invoice) -> AppResult<Posted<Invoice>>;

    async fn find_invoice(&self, id: Uuid) -> AppResult<Option<Invoice>>;

    async fn list_invoices(&self, filter: InvoiceFilter) -> AppResult<Vec<Invoice>>;

    /// Move a draft to Sent and post it
    async fn send_invoice(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Posted<Invoice>>;

    /// Void an invoice and reverse everything posted from it
    async fn void_invoice(
        &self,
        id: Uuid,
        reason: Option<String>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<VoidedInvoice>;

    /// Store a payment, apply it to its invoice and post it
    async fn record_payment(&self, payment: NewPayment, now: DateTime<Utc>) -> AppResult<PaymentReceipt>;

    async fn list_payments(&self, customer_id: Option<Uuid>) -> AppResult<Vec<Payment>>;

    async fn create_expense(&self, expense: Expense) -> AppResult<Posted<Expense>>;

    async fn list_expenses(&self) -> AppResult<Vec<Expense>>;

    /// Store a bill, posting it unless it is a draft
    async fn create_bill(&self, bill: Bill) -> AppResult<Posted<Bill>>;

    async fn list_bills(&self, filter: BillFilter) -> AppResult<Vec<Bill>>;

    /// Store a bill payment, apply it to the bill and post it
    async fn pay_bill(&self, payment: NewBillPayment, now: DateTime<Utc>) -> AppResult<BillPaymentReceipt>;

    async fn create_transfer(&self, transfer: Transfer) -> AppResult<Posted<Transfer>>;

    async fn list_transfers(&self) -> AppResult<Vec<Transfer>>;
}

/// SeaORM implementation of DocumentRepository
pub struct DocumentStore {
    db: DatabaseConnection,
    operating_bank: String,
}

impl DocumentStore {
    pub fn new(db: DatabaseConnection, operating_bank: impl Into<String>) -> Self {
        Self {
            db,
            operating_bank: operating_bank.into(),
        }
    }
}

#[async_trait]
impl DocumentRepository for DocumentStore {
    async fn create_invoice(&self, inv: Invoice) -> AppResult<Posted<Invoice>> {
        let txn = ledger_tx::begin(&self.db, IsolationLevel::ReadCommitted).await?;
        let result: AppResult<_> = async {
            let taken = invoice::Entity::find()
                .filter(invoice::Column::InvoiceNumber.eq(inv.invoice_number.as_str()))
                .one(&txn)
                .await?;
            if taken.is_some() {
                return Err(AppError::conflict(format!(
                    "Invoice number {} is already in use",
                    inv.invoice_number
                )));
            }

            invoice::ActiveModel::from(&inv).insert(&txn).await?;
            let entry = if inv.is_postable() {
                ledger_tx::post(&txn, PostingSource::Invoice(&inv), &self.operating_bank).await?
            } else {
                None
            };
            Ok(Posted { document: inv, entry })
        }
        .await;
        ledger_tx::finish(txn, result).await
    }

    async fn find_invoice(&self, id: Uuid) -> AppResult<Option<Invoice>> {
        invoice::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Invoice::try_from)
            .transpose()
    }

    async fn list_invoices(&self, filter: InvoiceFilter) -> AppResult<Vec<Invoice>> {
        let mut query = invoice::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(invoice::Column::Status.eq(status.as_str()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(invoice::Column::CustomerId.eq(customer_id));
        }

        query
            .order_by_desc(invoice::Column::InvoiceDate)
            .order_by_desc(invoice::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Invoice::try_from)
            .collect()
    }

    async fn send_invoice(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Posted<Invoice>> {
        let txn = ledger_tx::begin(&self.db, IsolationLevel::ReadCommitted).await?;
        let result: AppResult<_> = async {
            let model = invoice::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_not_found("Invoice")?;
            let mut inv = Invoice::try_from(model)?;
            inv.mark_sent(now)?;

            invoice::ActiveModel::from(&inv).update(&txn).await?;
            let entry = if inv.is_postable() {
                ledger_tx::post(&txn, PostingSource::Invoice(&inv), &self.operating_bank).await?
            } else {
                None
            };
            Ok(Posted { document: inv, entry })
        }
        .await;
        ledger_tx::finish(txn, result).await
    }

    async fn void_invoice(
        &self,
        id: Uuid,
        reason: Option<String>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<VoidedInvoice> {
        let txn = ledger_tx::begin(&self.db, IsolationLevel::ReadCommitted).await?;
        let result: AppResult<_> = async {
            let model = invoice::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_not_found("Invoice")?;
            let mut inv = Invoice::try_from(model)?;
            inv.void(now)?;
            invoice::ActiveModel::from(&inv).update(&txn).await?;

            let entries = ledger_tx::entries_for_source(&txn, SourceType::Invoice, id).await?;
            let already_reversed: HashSet<Uuid> =
                entries.iter().filter_map(|e| e.reversed_entry_id).collect();

            let mut reversals = Vec::new();
            for entry in entries
                .iter()
                .filter(|e| !e.is_reversal() && !already_reversed.contains(&e.id))
            {
                reversals.push(
                    ledger_tx::reverse_entry(&txn, entry, reason.as_deref(), date).await?,
                );
            }

            Ok(VoidedInvoice { invoice: inv, reversals })
        }
        .await;
        ledger_tx::finish(txn, result).await
    }

    async fn record_payment(&self, new: NewPayment, now: DateTime<Utc>) -> AppResult<PaymentReceipt> {
        let txn = ledger_tx::begin(&self.db, IsolationLevel::ReadCommitted).await?;
        let result: AppResult<_> = async {
            let model = invoice::Entity::find_by_id(new.invoice_id)
                .one(&txn)
                .await?
                .ok_or_not_found("Invoice")?;
            let mut inv = Invoice::try_from(model)?;
            inv.apply_payment(new.amount, now)?;

            let pmt = Payment {
                id: Uuid::new_v4(),
                customer_id: inv.customer_id,
                payment_date: new.payment_date,
                amount: new.amount,
                payment_method: new.payment_method,
                reference_number: new.reference_number,
                deposit_to_account_id: new.deposit_to_account_id,
                memo: new.memo,
                created_at: now,
            };
            payment::ActiveModel::from(&pmt).insert(&txn).await?;

            payment_application::ActiveModel {
                id: Set(Uuid::new_v4()),
                payment_id: Set(pmt.id),
                invoice_id: Set(inv.id),
                amount: Set(pmt.amount.cents()),
            }
            .insert(&txn)
            .await?;

            invoice::ActiveModel::from(&inv).update(&txn).await?;
            let entry =
                ledger_tx::post(&txn, PostingSource::Payment(&pmt), &self.operating_bank).await?;

            Ok(PaymentReceipt {
                payment: pmt,
                invoice: inv,
                entry,
            })
        }
        .await;
        ledger_tx::finish(txn, result).await
    }

    async fn list_payments(&self, customer_id: Option<Uuid>) -> AppResult<Vec<Payment>> {
        let mut query = payment::Entity::find();
        if let Some(customer_id) = customer_id {
            query = query.filter(payment::Column::CustomerId.eq(customer_id));
        }
        let models = query
            .order_by_desc(payment::Column::PaymentDate)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Payment::from).collect())
    }

    async fn create_expense(&self, exp: Expense) -> AppResult<Posted<Expense>> {
        let txn = ledger_tx::begin(&self.db, IsolationLevel::ReadCommitted).await?;
        let result: AppResult<_> = async {
            expense::ActiveModel::from(&exp).insert(&txn).await?;
            let entry =
                ledger_tx::post(&txn, PostingSource::Expense(&exp), &self.operating_bank).await?;
            Ok(Posted { document: exp, entry })
        }
        .await;
        ledger_tx::finish(txn, result).await
    }

    async fn list_expenses(&self) -> AppResult<Vec<Expense>> {
        expense::Entity::find()
            .order_by_desc(expense::Column::ExpenseDate)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect()
    }

    async fn create_bill(&self, b: Bill) -> AppResult<Posted<Bill>> {
        let txn = ledger_tx::begin(&self.db, IsolationLevel::ReadCommitted).await?;
        let result: AppResult<_> = async {
            bill::ActiveModel::from(&b).insert(&txn).await?;
            let entry = if b.is_postable() {
                ledger_tx::post(&txn, PostingSource::Bill(&b), &self.operating_bank).await?
            } else {
                None
            };
            Ok(Posted { document: b, entry })
        }
        .await;
        ledger_tx::finish(txn, result).await
    }

    async fn list_bills(&self, filter: BillFilter) -> AppResult<Vec<Bill>> {
        let mut query = bill::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(bill::Column::Status.eq(status.as_str()));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(bill::Column::SupplierId.eq(supplier_id));
        }

        query
            .order_by_desc(bill::Column::BillDate)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Bill::try_from)
            .collect()
    }

    async fn pay_bill(&self, new: NewBillPayment, now: DateTime<Utc>) -> AppResult<BillPaymentReceipt> {
        let txn = ledger_tx::begin(&self.db, IsolationLevel::ReadCommitted).await?;
        let result: AppResult<_> = async {
            let model = bill::Entity::find_by_id(new.bill_id)
                .one(&txn)
                .await?
                .ok_or_not_found("Bill")?;
            let mut b = Bill::try_from(model)?;
            b.apply_payment(new.amount, now)?;

            let bp = BillPayment {
                id: Uuid::new_v4(),
                bill_id: b.id,
                supplier_id: b.supplier_id,
                payment_account_id: new.payment_account_id,
                amount: new.amount,
                payment_date: new.payment_date,
                bill_reference: b.reference(),
                created_at: now,
            };
            bill_payment::ActiveModel::from(&bp).insert(&txn).await?;
            bill::ActiveModel::from(&b).update(&txn).await?;

            let entry =
                ledger_tx::post(&txn, PostingSource::BillPayment(&bp), &self.operating_bank).await?;

            Ok(BillPaymentReceipt {
                payment: bp,
                bill: b,
                entry,
            })
        }
        .await;
        ledger_tx::finish(txn, result).await
    }

    async fn create_transfer(&self, t: Transfer) -> AppResult<Posted<Transfer>> {
        let txn = ledger_tx::begin(&self.db, IsolationLevel::ReadCommitted).await?;
        let result: AppResult<_> = async {
            transfer::ActiveModel::from(&t).insert(&txn).await?;
            let entry =
                ledger_tx::post(&txn, PostingSource::Transfer(&t), &self.operating_bank).await?;
            Ok(Posted { document: t, entry })
        }
        .await;
        ledger_tx::finish(txn, result).await
    }

    async fn list_transfers(&self) -> AppResult<Vec<Transfer>> {
        let models = transfer::Entity::find()
            .order_by_desc(transfer::Column::TransferDate)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Transfer::from).collect())
    }
}
