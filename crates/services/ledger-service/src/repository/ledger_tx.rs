//! Journal writes shared by every store that posts to the ledger.
//!
//! Everything here is generic over [`ConnectionTrait`] so it can run inside
//! the caller's open transaction. The document write and the entry it
//! produces then commit or roll back together.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend,
    DatabaseConnection, DatabaseTransaction, EntityTrait, IsolationLevel, PaginatorTrait,
    QueryFilter, QueryOrder, Set, Statement, TransactionTrait, Value,
};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::journal::entry_number;
use domain::{JournalEntry, NewJournalEntry, PostingSource, SourceType, SystemAccount, SystemAccounts};

use super::entities::{account, journal_entry, journal_entry_line};

/// Advisory lock key held while an entry number is allocated.
pub const ENTRY_NUMBER_LOCK_KEY: i64 = 0x4a45_0001;

/// SQL taking the entry-numbering lock for the rest of the transaction,
/// or `None` on backends without advisory locks.
pub fn entry_number_lock(backend: DatabaseBackend) -> Option<Statement> {
    match backend {
        DatabaseBackend::Postgres => Some(Statement::from_sql_and_values(
            backend,
            "SELECT pg_advisory_xact_lock($1)",
            [Value::from(ENTRY_NUMBER_LOCK_KEY)],
        )),
        _ => None,
    }
}

/// Serialize entry numbering until the caller's transaction ends.
///
/// Concurrent posters block here, so each one counts only committed entries.
pub async fn lock_entry_numbers<C: ConnectionTrait>(conn: &C) -> AppResult<()> {
    if let Some(stmt) = entry_number_lock(conn.get_database_backend()) {
        conn.execute(stmt).await?;
    }
    Ok(())
}

/// Open a read-write transaction at the given isolation level.
pub async fn begin(
    db: &DatabaseConnection,
    isolation: IsolationLevel,
) -> AppResult<DatabaseTransaction> {
    db.begin_with_config(Some(isolation), Some(AccessMode::ReadWrite))
        .await
        .map_err(AppError::from)
}

/// Commit on success, roll back on error.
pub async fn finish<T>(txn: DatabaseTransaction, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await.map_err(AppError::from)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

async fn find_account<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    account_type: &str,
) -> AppResult<Option<Uuid>> {
    let found = account::Entity::find()
        .filter(account::Column::Name.eq(name))
        .filter(account::Column::AccountType.eq(account_type))
        .one(conn)
        .await?;
    Ok(found.map(|m| m.id))
}

/// Find each system account by (name, type), creating the ones that are missing.
///
/// Creation skips rows a concurrent caller inserted first and then re-reads,
/// so two postings never create the same system account twice.
pub async fn resolve_system_accounts<C: ConnectionTrait>(
    conn: &C,
    needed: &[SystemAccount],
    operating_bank: &str,
) -> AppResult<SystemAccounts> {
    let mut resolved = SystemAccounts::new();

    for system in needed {
        let name = system.name_with(operating_bank);
        let account_type = system.account_type().as_str();

        if let Some(id) = find_account(conn, name, account_type).await? {
            resolved.insert(*system, id);
            continue;
        }

        let now = Utc::now();
        let model = account::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            account_type: Set(account_type.to_string()),
            detail_type: Set(None),
            description: Set(None),
            account_number: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = account::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([account::Column::Name, account::Column::AccountType])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        if inserted > 0 {
            tracing::info!("Created system account '{}' ({})", name, account_type);
        }

        let id = find_account(conn, name, account_type).await?.ok_or_else(|| {
            AppError::internal(format!("System account '{}' could not be created", name))
        })?;
        resolved.insert(*system, id);
    }

    Ok(resolved)
}

/// Validate and store an entry with its lines, numbering it `JE-NNNN`.
pub async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    entry: NewJournalEntry,
) -> AppResult<JournalEntry> {
    entry.validate()?;

    lock_entry_numbers(conn).await?;
    let existing = journal_entry::Entity::find().count(conn).await?;
    let number = entry_number(existing);
    let id = Uuid::new_v4();

    let header = journal_entry::ActiveModel {
        id: Set(id),
        entry_number: Set(number.clone()),
        entry_date: Set(entry.entry_date),
        memo: Set(entry.memo.clone()),
        is_adjusting: Set(entry.is_adjusting),
        source_type: Set(entry.source.map(|s| s.kind.as_str().to_string())),
        source_id: Set(entry.source.map(|s| s.id)),
        reversed_entry_id: Set(entry.reversed_entry_id),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;

    let lines: Vec<journal_entry_line::ActiveModel> = entry
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| journal_entry_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            journal_entry_id: Set(id),
            account_id: Set(line.account_id),
            debit: Set(line.debit.cents()),
            credit: Set(line.credit.cents()),
            description: Set(line.description.clone()),
            customer_id: Set(line.customer_id),
            supplier_id: Set(line.supplier_id),
            sort_order: Set(i as i32),
        })
        .collect();
    journal_entry_line::Entity::insert_many(lines).exec(conn).await?;

    tracing::debug!(
        "Posted {} dated {} ({} lines)",
        number,
        entry.entry_date,
        entry.lines.len()
    );

    Ok(JournalEntry {
        id,
        entry_number: number,
        entry_date: entry.entry_date,
        memo: entry.memo,
        is_adjusting: entry.is_adjusting,
        source: entry.source,
        reversed_entry_id: entry.reversed_entry_id,
        lines: entry.lines,
        created_at: header.created_at,
    })
}

/// Post a document's journal entry, if it produces one.
pub async fn post<C: ConnectionTrait>(
    conn: &C,
    source: PostingSource<'_>,
    operating_bank: &str,
) -> AppResult<Option<JournalEntry>> {
    let accounts = resolve_system_accounts(conn, &source.required_accounts(), operating_bank).await?;
    match source.journal(&accounts)? {
        Some(entry) => insert_entry(conn, entry).await.map(Some),
        None => Ok(None),
    }
}

/// Load one entry with its lines.
pub async fn load_entry<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<Option<JournalEntry>> {
    let Some(header) = journal_entry::Entity::find_by_id(id).one(conn).await? else {
        return Ok(None);
    };
    let lines = journal_entry_line::Entity::find()
        .filter(journal_entry_line::Column::JournalEntryId.eq(id))
        .all(conn)
        .await?;
    header.into_entry(lines).map(Some)
}

/// Attach lines to a batch of headers, keeping header order.
pub async fn with_lines<C: ConnectionTrait>(
    conn: &C,
    headers: Vec<journal_entry::Model>,
) -> AppResult<Vec<JournalEntry>> {
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
    let mut grouped: HashMap<Uuid, Vec<journal_entry_line::Model>> = HashMap::new();
    for line in journal_entry_line::Entity::find()
        .filter(journal_entry_line::Column::JournalEntryId.is_in(ids))
        .all(conn)
        .await?
    {
        grouped.entry(line.journal_entry_id).or_default().push(line);
    }

    headers
        .into_iter()
        .map(|header| {
            let lines = grouped.remove(&header.id).unwrap_or_default();
            header.into_entry(lines)
        })
        .collect()
}

/// Entries posted from a given document, oldest first.
pub async fn entries_for_source<C: ConnectionTrait>(
    conn: &C,
    kind: SourceType,
    source_id: Uuid,
) -> AppResult<Vec<JournalEntry>> {
    let headers = journal_entry::Entity::find()
        .filter(journal_entry::Column::SourceType.eq(kind.as_str()))
        .filter(journal_entry::Column::SourceId.eq(source_id))
        .order_by_asc(journal_entry::Column::CreatedAt)
        .all(conn)
        .await?;
    with_lines(conn, headers).await
}

/// Post the reversal of `entry`. An entry can be reversed once.
pub async fn reverse_entry<C: ConnectionTrait>(
    conn: &C,
    entry: &JournalEntry,
    reason: Option<&str>,
    date: NaiveDate,
) -> AppResult<JournalEntry> {
    let already = journal_entry::Entity::find()
        .filter(journal_entry::Column::ReversedEntryId.eq(entry.id))
        .count(conn)
        .await?;
    if already > 0 {
        return Err(AppError::conflict(format!(
            "Journal entry {} has already been reversed",
            entry.entry_number
        )));
    }

    let reversal = insert_entry(conn, entry.reversal(reason, date)?).await?;
    tracing::info!("Reversed {} with {}", entry.entry_number, reversal.entry_number);
    Ok(reversal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_number_lock_is_transaction_scoped() {
        let stmt = entry_number_lock(DatabaseBackend::Postgres).unwrap();
        assert_eq!(stmt.sql, "SELECT pg_advisory_xact_lock($1)");
        assert_eq!(
            stmt.values,
            Some(sea_orm::sea_query::Values(vec![Value::from(ENTRY_NUMBER_LOCK_KEY)]))
        );
    }

    #[test]
    fn test_no_lock_without_advisory_locks() {
        assert!(entry_number_lock(DatabaseBackend::Sqlite).is_none());
        assert!(entry_number_lock(DatabaseBackend::MySql).is_none());
    }
}
