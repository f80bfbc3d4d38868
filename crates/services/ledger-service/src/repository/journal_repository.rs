//! Journal entries, ledger lines for reporting, and the ledger rebuild.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    ConnectionTrait, IsolationLevel, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
};
use uuid::Uuid;

use super::entities::{
    account, bill, bill_payment, expense, invoice, journal_entry, journal_entry_line, payment,
    transfer,
};
use super::entities::parse_label;
use super::ledger_tx;
use common::{AppError, AppResult, OptionExt};
use domain::reports::net_income_through;
use domain::{
    Bill, Expense, Invoice, JournalEntry, LedgerLine, Money, NewJournalEntry, RebuildPlan,
    RebuildSources, RejournalizeReport,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Journal repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait JournalRepository: Send + Sync {
    /// Store a manual entry
    async fn create_entry(&self, entry: NewJournalEntry) -> AppResult<JournalEntry>;

    async fn find_entry(&self, id: Uuid) -> AppResult<Option<JournalEntry>>;

    /// Entries within an inclusive date range, newest first
    async fn list_entries(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<Vec<JournalEntry>>;

    /// Post the reversal of an entry
    async fn reverse_entry(
        &self,
        id: Uuid,
        reason: Option<String>,
        date: NaiveDate,
    ) -> AppResult<JournalEntry>;

    /// Every posted line dated on or before `through` (all lines when unset)
    async fn ledger_lines(&self, through: Option<NaiveDate>) -> AppResult<Vec<LedgerLine>>;

    /// Rebuild the journal from source documents.
    ///
    /// A dry run performs the full rebuild and then rolls it back.
    async fn rejournalize(&self, dry_run: bool) -> AppResult<RejournalizeReport>;
}

/// SeaORM implementation of JournalRepository
pub struct JournalStore {
    db: DatabaseConnection,
    operating_bank: String,
}

impl JournalStore {
    pub fn new(db: DatabaseConnection, operating_bank: impl Into<String>) -> Self {
        Self {
            db,
            operating_bank: operating_bank.into(),
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct LedgerRow {
    account_id: Uuid,
    account_name: String,
    account_type: String,
    entry_date: NaiveDate,
    debit: i64,
    credit: i64,
    customer_id: Option<Uuid>,
    supplier_id: Option<Uuid>,
}

impl TryFrom<LedgerRow> for LedgerLine {
    type Error = AppError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        Ok(LedgerLine {
            account_id: row.account_id,
            account_type: parse_label("account type", &row.account_type)?,
            account_name: row.account_name,
            entry_date: row.entry_date,
            debit: Money::from_cents(row.debit),
            credit: Money::from_cents(row.credit),
            customer_id: row.customer_id,
            supplier_id: row.supplier_id,
        })
    }
}

async fn load_ledger_lines<C: ConnectionTrait>(
    conn: &C,
    through: Option<NaiveDate>,
) -> AppResult<Vec<LedgerLine>> {
    let mut query = journal_entry_line::Entity::find()
        .select_only()
        .column(journal_entry_line::Column::AccountId)
        .column_as(account::Column::Name, "account_name")
        .column_as(account::Column::AccountType, "account_type")
        .column_as(journal_entry::Column::EntryDate, "entry_date")
        .column(journal_entry_line::Column::Debit)
        .column(journal_entry_line::Column::Credit)
        .column(journal_entry_line::Column::CustomerId)
        .column(journal_entry_line::Column::SupplierId)
        .join(JoinType::InnerJoin, journal_entry_line::Relation::JournalEntry.def())
        .join(JoinType::InnerJoin, journal_entry_line::Relation::Account.def());

    if let Some(through) = through {
        query = query.filter(journal_entry::Column::EntryDate.lte(through));
    }

    query
        .into_model::<LedgerRow>()
        .all(conn)
        .await?
        .into_iter()
        .map(LedgerLine::try_from)
        .collect()
}

async fn load_rebuild_sources<C: ConnectionTrait>(conn: &C) -> AppResult<RebuildSources> {
    Ok(RebuildSources {
        invoices: invoice::Entity::find()
            .order_by_asc(invoice::Column::InvoiceDate)
            .order_by_asc(invoice::Column::CreatedAt)
            .all(conn)
            .await?
            .into_iter()
            .map(Invoice::try_from)
            .collect::<AppResult<_>>()?,
        payments: payment::Entity::find()
            .order_by_asc(payment::Column::PaymentDate)
            .order_by_asc(payment::Column::CreatedAt)
            .all(conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect(),
        expenses: expense::Entity::find()
            .order_by_asc(expense::Column::ExpenseDate)
            .order_by_asc(expense::Column::CreatedAt)
            .all(conn)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect::<AppResult<_>>()?,
        bills: bill::Entity::find()
            .order_by_asc(bill::Column::BillDate)
            .order_by_asc(bill::Column::CreatedAt)
            .all(conn)
            .await?
            .into_iter()
            .map(Bill::try_from)
            .collect::<AppResult<_>>()?,
        bill_payments: bill_payment::Entity::find()
            .order_by_asc(bill_payment::Column::PaymentDate)
            .order_by_asc(bill_payment::Column::CreatedAt)
            .all(conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect(),
        transfers: transfer::Entity::find()
            .order_by_asc(transfer::Column::TransferDate)
            .order_by_asc(transfer::Column::CreatedAt)
            .all(conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect(),
    })
}

#[async_trait]
impl JournalRepository for JournalStore {
    async fn create_entry(&self, entry: NewJournalEntry) -> AppResult<JournalEntry> {
        let txn = ledger_tx::begin(&self.db, IsolationLevel::ReadCommitted).await?;
        let result = ledger_tx::insert_entry(&txn, entry).await;
        ledger_tx::finish(txn, result).await
    }

    async fn find_entry(&self, id: Uuid) -> AppResult<Option<JournalEntry>> {
        ledger_tx::load_entry(&self.db, id).await
    }

    async fn list_entries(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<Vec<JournalEntry>> {
        let mut query = journal_entry::Entity::find();
        if let Some(start) = start {
            query = query.filter(journal_entry::Column::EntryDate.gte(start));
        }
        if let Some(end) = end {
            query = query.filter(journal_entry::Column::EntryDate.lte(end));
        }

        let headers = query
            .order_by_desc(journal_entry::Column::EntryDate)
            .order_by_desc(journal_entry::Column::EntryNumber)
            .all(&self.db)
            .await?;
        ledger_tx::with_lines(&self.db, headers).await
    }

    async fn reverse_entry(
        &self,
        id: Uuid,
        reason: Option<String>,
        date: NaiveDate,
    ) -> AppResult<JournalEntry> {
        let txn = ledger_tx::begin(&self.db, IsolationLevel::ReadCommitted).await?;
        let result: AppResult<_> = async {
            let entry = ledger_tx::load_entry(&txn, id)
                .await?
                .ok_or_not_found("Journal entry")?;
            ledger_tx::reverse_entry(&txn, &entry, reason.as_deref(), date).await
        }
        .await;
        ledger_tx::finish(txn, result).await
    }

    async fn ledger_lines(&self, through: Option<NaiveDate>) -> AppResult<Vec<LedgerLine>> {
        load_ledger_lines(&self.db, through).await
    }

    async fn rejournalize(&self, dry_run: bool) -> AppResult<RejournalizeReport> {
        let txn = ledger_tx::begin(&self.db, IsolationLevel::Serializable).await?;
        let result: AppResult<_> = async {
            ledger_tx::lock_entry_numbers(&txn).await?;
            let sources = load_rebuild_sources(&txn).await?;
            let accounts = ledger_tx::resolve_system_accounts(
                &txn,
                &RebuildPlan::required_accounts(&sources),
                &self.operating_bank,
            )
            .await?;
            let plan = RebuildPlan::build(sources, &accounts)?;
            if !plan.is_balanced() {
                return Err(AppError::internal(format!(
                    "Rebuild plan is unbalanced: debits={}, credits={}",
                    plan.total_debits.to_decimal_string(),
                    plan.total_credits.to_decimal_string()
                )));
            }

            if !plan.duplicate_expense_ids.is_empty() {
                expense::Entity::delete_many()
                    .filter(expense::Column::Id.is_in(plan.duplicate_expense_ids.clone()))
                    .exec(&txn)
                    .await?;
            }
            for (expense_id, account_id) in &plan.account_assignments {
                expense::ActiveModel {
                    id: Set(*expense_id),
                    account_id: Set(Some(*account_id)),
                    ..Default::default()
                }
                .update(&txn)
                .await?;
            }

            journal_entry_line::Entity::delete_many().exec(&txn).await?;
            journal_entry::Entity::delete_many().exec(&txn).await?;

            for entry in plan.entries.iter().cloned() {
                ledger_tx::insert_entry(&txn, entry).await?;
            }

            let lines = load_ledger_lines(&txn, None).await?;
            let total_debits: Money = lines.iter().map(|l| l.debit).sum();
            let total_credits: Money = lines.iter().map(|l| l.credit).sum();
            if total_debits != total_credits {
                return Err(AppError::internal(format!(
                    "Rebuilt ledger is unbalanced: debits={}, credits={}",
                    total_debits.to_decimal_string(),
                    total_credits.to_decimal_string()
                )));
            }

            Ok(RejournalizeReport {
                dry_run,
                counts: plan.counts,
                total_debits,
                total_credits,
                net_income: net_income_through(&lines, NaiveDate::MAX),
            })
        }
        .await;

        match result {
            Ok(report) if dry_run => {
                txn.rollback().await.map_err(AppError::from)?;
                Ok(report)
            }
            other => ledger_tx::finish(txn, other).await,
        }
    }
}
