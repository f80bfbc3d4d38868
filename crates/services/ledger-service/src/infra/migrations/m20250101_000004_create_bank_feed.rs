//! Migration: bank transactions, bank rules and reconciliations.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BankRules::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BankRules::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(BankRules::Name).string().not_null())
                    .col(ColumnDef::new(BankRules::Priority).integer().not_null().default(0))
                    .col(ColumnDef::new(BankRules::Conditions).json_binary().not_null())
                    .col(ColumnDef::new(BankRules::AssignAccountId).uuid().null())
                    .col(ColumnDef::new(BankRules::AssignCategory).string().null())
                    .col(ColumnDef::new(BankRules::AssignPayee).string().null())
                    .col(
                        ColumnDef::new(BankRules::AutoConfirm)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(BankRules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(BankRules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BankRules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BankTransactions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BankTransactions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(BankTransactions::AccountId).uuid().not_null())
                    .col(ColumnDef::new(BankTransactions::TransactionDate).date().not_null())
                    .col(ColumnDef::new(BankTransactions::Description).text().not_null())
                    .col(ColumnDef::new(BankTransactions::Amount).big_integer().not_null())
                    .col(ColumnDef::new(BankTransactions::FitId).string().not_null())
                    .col(ColumnDef::new(BankTransactions::Status).string().not_null())
                    .col(ColumnDef::new(BankTransactions::CategoryAccountId).uuid().null())
                    .col(ColumnDef::new(BankTransactions::Category).string().null())
                    .col(ColumnDef::new(BankTransactions::Payee).string().null())
                    .col(ColumnDef::new(BankTransactions::AppliedRuleId).uuid().null())
                    .col(ColumnDef::new(BankTransactions::Memo).text().null())
                    .col(
                        ColumnDef::new(BankTransactions::IsReconciled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(BankTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Import de-duplication key
        manager
            .create_index(
                Index::create()
                    .name("idx_bank_transactions_account_fit_id")
                    .table(BankTransactions::Table)
                    .col(BankTransactions::AccountId)
                    .col(BankTransactions::FitId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reconciliations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reconciliations::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Reconciliations::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Reconciliations::StatementDate).date().not_null())
                    .col(
                        ColumnDef::new(Reconciliations::StatementBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reconciliations::ClearedBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Reconciliations::Difference)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Reconciliations::Status).string().not_null())
                    .col(
                        ColumnDef::new(Reconciliations::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Reconciliations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reconciliations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankRules::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BankRules {
    Table,
    Id,
    Name,
    Priority,
    Conditions,
    AssignAccountId,
    AssignCategory,
    AssignPayee,
    AutoConfirm,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BankTransactions {
    Table,
    Id,
    AccountId,
    TransactionDate,
    Description,
    Amount,
    FitId,
    Status,
    CategoryAccountId,
    Category,
    Payee,
    AppliedRuleId,
    Memo,
    IsReconciled,
    CreatedAt,
}

#[derive(Iden)]
enum Reconciliations {
    Table,
    Id,
    AccountId,
    StatementDate,
    StatementBalance,
    ClearedBalance,
    Difference,
    Status,
    CompletedAt,
    CreatedAt,
}
