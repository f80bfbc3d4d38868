//! Repository layer for data access.

pub mod entities;
mod ledger_tx;

mod account_repository;
mod bank_repository;
mod document_repository;
mod journal_repository;

pub use account_repository::{AccountRepository, AccountStore};
pub use bank_repository::{BankRepository, BankStore};
pub use document_repository::{
    BillFilter, BillPaymentReceipt, DocumentRepository, DocumentStore, InvoiceFilter,
    PaymentReceipt, Posted, VoidedInvoice,
};
pub use journal_repository::{JournalRepository, JournalStore};

#[cfg(any(test, feature = "test-utils"))]
pub use account_repository::MockAccountRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use bank_repository::MockBankRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use document_repository::MockDocumentRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use journal_repository::MockJournalRepository;
