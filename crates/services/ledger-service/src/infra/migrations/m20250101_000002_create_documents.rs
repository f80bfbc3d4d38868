//! Migration: source documents that post to the ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Invoices::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Invoices::InvoiceNumber).string().not_null().unique_key())
                    .col(ColumnDef::new(Invoices::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::InvoiceDate).date().not_null())
                    .col(ColumnDef::new(Invoices::DueDate).date().null())
                    .col(ColumnDef::new(Invoices::Subtotal).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::TaxAmount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Invoices::Total).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::AmountPaid).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Invoices::AmountDue).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::Status).string().not_null())
                    .col(ColumnDef::new(Invoices::Notes).text().null())
                    .col(
                        ColumnDef::new(Invoices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Invoices::UpdatedAt)
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
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Payments::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Payments::PaymentDate).date().not_null())
                    .col(ColumnDef::new(Payments::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Payments::PaymentMethod).string().null())
                    .col(ColumnDef::new(Payments::ReferenceNumber).string().null())
                    .col(ColumnDef::new(Payments::DepositToAccountId).uuid().null())
                    .col(ColumnDef::new(Payments::Memo).text().null())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
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
                    .table(PaymentApplications::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PaymentApplications::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(PaymentApplications::PaymentId).uuid().not_null())
                    .col(ColumnDef::new(PaymentApplications::InvoiceId).uuid().not_null())
                    .col(ColumnDef::new(PaymentApplications::Amount).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_applications_payment")
                            .from(PaymentApplications::Table, PaymentApplications::PaymentId)
                            .to(Payments::Table, Payments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::ExpenseType).string().not_null())
                    .col(ColumnDef::new(Expenses::PayeeType).string().not_null())
                    .col(ColumnDef::new(Expenses::PayeeId).uuid().null())
                    .col(ColumnDef::new(Expenses::PayeeName).string().null())
                    .col(ColumnDef::new(Expenses::AccountId).uuid().null())
                    .col(ColumnDef::new(Expenses::PaymentAccountId).uuid().null())
                    .col(ColumnDef::new(Expenses::ExpenseDate).date().not_null())
                    .col(ColumnDef::new(Expenses::Subtotal).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::TaxAmount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Expenses::Total).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::Memo).text().null())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
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
                    .table(Bills::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bills::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bills::BillNumber).string().null())
                    .col(ColumnDef::new(Bills::SupplierId).uuid().not_null())
                    .col(ColumnDef::new(Bills::AccountId).uuid().null())
                    .col(ColumnDef::new(Bills::BillDate).date().not_null())
                    .col(ColumnDef::new(Bills::DueDate).date().null())
                    .col(ColumnDef::new(Bills::Subtotal).big_integer().not_null())
                    .col(ColumnDef::new(Bills::TaxAmount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Bills::Total).big_integer().not_null())
                    .col(ColumnDef::new(Bills::AmountPaid).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Bills::AmountDue).big_integer().not_null())
                    .col(ColumnDef::new(Bills::Status).string().not_null())
                    .col(ColumnDef::new(Bills::Memo).text().null())
                    .col(
                        ColumnDef::new(Bills::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Bills::UpdatedAt)
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
                    .table(BillPayments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BillPayments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(BillPayments::BillId).uuid().not_null())
                    .col(ColumnDef::new(BillPayments::SupplierId).uuid().not_null())
                    .col(ColumnDef::new(BillPayments::PaymentAccountId).uuid().not_null())
                    .col(ColumnDef::new(BillPayments::Amount).big_integer().not_null())
                    .col(ColumnDef::new(BillPayments::PaymentDate).date().not_null())
                    .col(ColumnDef::new(BillPayments::BillReference).string().not_null())
                    .col(
                        ColumnDef::new(BillPayments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bill_payments_bill")
                            .from(BillPayments::Table, BillPayments::BillId)
                            .to(Bills::Table, Bills::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Transfers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Transfers::FromAccountId).uuid().not_null())
                    .col(ColumnDef::new(Transfers::ToAccountId).uuid().not_null())
                    .col(ColumnDef::new(Transfers::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Transfers::TransferDate).date().not_null())
                    .col(ColumnDef::new(Transfers::Memo).text().null())
                    .col(
                        ColumnDef::new(Transfers::CreatedAt)
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
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentApplications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Invoices {
    Table,
    Id,
    InvoiceNumber,
    CustomerId,
    InvoiceDate,
    DueDate,
    Subtotal,
    TaxAmount,
    Total,
    AmountPaid,
    AmountDue,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    CustomerId,
    PaymentDate,
    Amount,
    PaymentMethod,
    ReferenceNumber,
    DepositToAccountId,
    Memo,
    CreatedAt,
}

#[derive(Iden)]
enum PaymentApplications {
    Table,
    Id,
    PaymentId,
    InvoiceId,
    Amount,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    ExpenseType,
    PayeeType,
    PayeeId,
    PayeeName,
    AccountId,
    PaymentAccountId,
    ExpenseDate,
    Subtotal,
    TaxAmount,
    Total,
    Memo,
    CreatedAt,
}

#[derive(Iden)]
enum Bills {
    Table,
    Id,
    BillNumber,
    SupplierId,
    AccountId,
    BillDate,
    DueDate,
    Subtotal,
    TaxAmount,
    Total,
    AmountPaid,
    AmountDue,
    Status,
    Memo,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BillPayments {
    Table,
    Id,
    BillId,
    SupplierId,
    PaymentAccountId,
    Amount,
    PaymentDate,
    BillReference,
    CreatedAt,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    FromAccountId,
    ToAccountId,
    Amount,
    TransferDate,
    Memo,
    CreatedAt,
}
