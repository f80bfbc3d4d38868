//! Migration: journal entries and their lines.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JournalEntries::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(JournalEntries::EntryNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(JournalEntries::EntryDate).date().not_null())
                    .col(ColumnDef::new(JournalEntries::Memo).text().null())
                    .col(
                        ColumnDef::new(JournalEntries::IsAdjusting)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(JournalEntries::SourceType).string().null())
                    .col(ColumnDef::new(JournalEntries::SourceId).uuid().null())
                    .col(ColumnDef::new(JournalEntries::ReversedEntryId).uuid().null())
                    .col(
                        ColumnDef::new(JournalEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_entries_source")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::SourceType)
                    .col(JournalEntries::SourceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalEntryLines::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JournalEntryLines::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(JournalEntryLines::JournalEntryId).uuid().not_null())
                    .col(ColumnDef::new(JournalEntryLines::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(JournalEntryLines::Debit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::Credit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(JournalEntryLines::Description).text().null())
                    .col(ColumnDef::new(JournalEntryLines::CustomerId).uuid().null())
                    .col(ColumnDef::new(JournalEntryLines::SupplierId).uuid().null())
                    .col(ColumnDef::new(JournalEntryLines::SortOrder).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_entry_lines_entry")
                            .from(JournalEntryLines::Table, JournalEntryLines::JournalEntryId)
                            .to(JournalEntries::Table, JournalEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_entry_lines_account")
                            .from(JournalEntryLines::Table, JournalEntryLines::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_entry_lines_account")
                    .table(JournalEntryLines::Table)
                    .col(JournalEntryLines::AccountId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JournalEntryLines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum JournalEntries {
    Table,
    Id,
    EntryNumber,
    EntryDate,
    Memo,
    IsAdjusting,
    SourceType,
    SourceId,
    ReversedEntryId,
    CreatedAt,
}

#[derive(Iden)]
enum JournalEntryLines {
    Table,
    Id,
    JournalEntryId,
    AccountId,
    Debit,
    Credit,
    Description,
    CustomerId,
    SupplierId,
    SortOrder,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
}
