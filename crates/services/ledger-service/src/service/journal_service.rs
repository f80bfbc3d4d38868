//! Manual journal entries and reversals.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::{JournalEntry, NewJournalEntry};

use crate::repository::{AccountRepository, JournalRepository};

#[async_trait]
pub trait JournalService: Send + Sync {
    /// Post a manual entry. Lines must balance and name active accounts.
    async fn create_entry(&self, entry: NewJournalEntry) -> AppResult<JournalEntry>;

    async fn get_entry(&self, id: Uuid) -> AppResult<JournalEntry>;

    async fn list_entries(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<Vec<JournalEntry>>;

    /// Reverse an entry, dated today unless a date is given
    async fn reverse_entry(
        &self,
        id: Uuid,
        reason: Option<String>,
        date: Option<NaiveDate>,
    ) -> AppResult<JournalEntry>;
}

pub struct JournalManager {
    journal: Arc<dyn JournalRepository>,
    accounts: Arc<dyn AccountRepository>,
}

impl JournalManager {
    pub fn new(journal: Arc<dyn JournalRepository>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { journal, accounts }
    }
}

#[async_trait]
impl JournalService for JournalManager {
    async fn create_entry(&self, mut entry: NewJournalEntry) -> AppResult<JournalEntry> {
        entry.validate()?;
        entry.source = None;
        entry.reversed_entry_id = None;

        let ids: HashSet<Uuid> = entry.lines.iter().map(|l| l.account_id).collect();
        for id in ids {
            let account = self
                .accounts
                .find_account(id)
                .await?
                .ok_or_not_found("Account")?;
            if !account.is_active {
                return Err(AppError::validation(format!(
                    "Account '{}' is inactive",
                    account.name
                )));
            }
        }

        let posted = self.journal.create_entry(entry).await?;
        tracing::info!(
            "Posted manual entry {} for {}",
            posted.entry_number,
            posted.total_debits()
        );
        Ok(posted)
    }

    async fn get_entry(&self, id: Uuid) -> AppResult<JournalEntry> {
        self.journal
            .find_entry(id)
            .await?
            .ok_or_not_found("Journal entry")
    }

    async fn list_entries(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<Vec<JournalEntry>> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(AppError::validation("Start date must not be after end date"));
            }
        }
        self.journal.list_entries(start, end).await
    }

    async fn reverse_entry(
        &self,
        id: Uuid,
        reason: Option<String>,
        date: Option<NaiveDate>,
    ) -> AppResult<JournalEntry> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        self.journal.reverse_entry(id, reason, date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Account, AccountType, JournalLine, Money};

    use crate::repository::{MockAccountRepository, MockJournalRepository};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn active_account(id: Uuid, active: bool) -> Account {
        Account {
            id,
            name: "Office Supplies".to_string(),
            account_type: AccountType::Expenses,
            detail_type: None,
            description: None,
            account_number: None,
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn entry(debit_account: Uuid, credit_account: Uuid, credit: i64) -> NewJournalEntry {
        NewJournalEntry::new(
            d(10),
            "Accrue supplies",
            vec![
                JournalLine::debit(debit_account, Money::from_cents(4_500), "Supplies"),
                JournalLine::credit(credit_account, Money::from_cents(credit), "Accrued"),
            ],
        )
    }

    #[tokio::test]
    async fn test_create_entry_rejects_unbalanced_lines() {
        let accounts = MockAccountRepository::new();
        let mut journal = MockJournalRepository::new();
        journal.expect_create_entry().never();

        let service = JournalManager::new(Arc::new(journal), Arc::new(accounts));
        let result = service
            .create_entry(entry(Uuid::new_v4(), Uuid::new_v4(), 4_000))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_entry_rejects_inactive_account() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_account()
            .returning(|id| Ok(Some(active_account(id, false))));
        let mut journal = MockJournalRepository::new();
        journal.expect_create_entry().never();

        let service = JournalManager::new(Arc::new(journal), Arc::new(accounts));
        let result = service
            .create_entry(entry(Uuid::new_v4(), Uuid::new_v4(), 4_500))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_entry_strips_source_links() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_account()
            .returning(|id| Ok(Some(active_account(id, true))));
        let mut journal = MockJournalRepository::new();
        journal
            .expect_create_entry()
            .withf(|e| e.source.is_none() && e.reversed_entry_id.is_none())
            .returning(|e| {
                Ok(JournalEntry {
                    id: Uuid::new_v4(),
                    entry_number: "JE-0001".to_string(),
                    entry_date: e.entry_date,
                    memo: e.memo,
                    is_adjusting: e.is_adjusting,
                    source: e.source,
                    reversed_entry_id: e.reversed_entry_id,
                    lines: e.lines,
                    created_at: Utc::now(),
                })
            });

        let mut new_entry = entry(Uuid::new_v4(), Uuid::new_v4(), 4_500)
            .with_source(domain::SourceType::Invoice, Uuid::new_v4());
        new_entry.reversed_entry_id = Some(Uuid::new_v4());

        let service = JournalManager::new(Arc::new(journal), Arc::new(accounts));
        let posted = service.create_entry(new_entry).await.unwrap();

        assert_eq!(posted.entry_number, "JE-0001");
        assert_eq!(posted.total_debits(), posted.total_credits());
    }

    #[tokio::test]
    async fn test_list_entries_rejects_inverted_range() {
        let accounts = MockAccountRepository::new();
        let journal = MockJournalRepository::new();

        let service = JournalManager::new(Arc::new(journal), Arc::new(accounts));
        let result = service.list_entries(Some(d(20)), Some(d(1))).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reverse_entry_passes_given_date() {
        let accounts = MockAccountRepository::new();
        let mut journal = MockJournalRepository::new();
        journal
            .expect_reverse_entry()
            .withf(|_, reason, date| reason.as_deref() == Some("Duplicate") && *date == d(15))
            .returning(|_, _, _| Err(AppError::conflict("Journal entry JE-0003 has already been reversed")));

        let service = JournalManager::new(Arc::new(journal), Arc::new(accounts));
        let result = service
            .reverse_entry(Uuid::new_v4(), Some("Duplicate".to_string()), Some(d(15)))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
