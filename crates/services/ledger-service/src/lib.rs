//! Ledger Service Library
//!
//! Double-entry bookkeeping over gRPC: chart of accounts, sales and purchase
//! documents, the journal, bank feed and reconciliation, and reports.
//! It can be run as a standalone service or embedded in the combined binary.

pub mod config;
pub mod grpc;
pub mod infra;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::Server;
use tracing::info;

use crate::config::LedgerServiceConfig;
use crate::grpc::LedgerGrpcService;
use crate::infra::Database;
use crate::repository::{AccountStore, BankStore, DocumentStore, JournalStore};
use crate::service::{
    AccountManager, BankingManager, BillingManager, JournalManager, MaintenanceManager,
    MaintenanceService, ReportManager,
};

/// Run the ledger service as an embedded component (for combined binary).
pub async fn run_embedded(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = LedgerServiceConfig::from_env();
    run_server_with_config(host, port, config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = LedgerServiceConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Rebuild the journal from source documents and print a summary (for CLI commands).
pub async fn rejournalize(dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = LedgerServiceConfig::from_env();
    let db = Database::connect(&config.database).await?;

    let journal = Arc::new(JournalStore::new(
        db.get_connection(),
        config.operating_bank_account.clone(),
    ));
    let report = MaintenanceManager::new(journal).rejournalize(dry_run).await?;

    let c = &report.counts;
    println!("{}", if dry_run { "Dry run, nothing saved" } else { "Journal rebuilt" });
    println!("  invoices       {}", c.invoices);
    println!("  expenses       {}", c.expenses);
    println!("  payments       {}", c.payments);
    println!("  bills          {}", c.bills);
    println!("  bill payments  {}", c.bill_payments);
    println!("  transfers      {}", c.transfers);
    println!("  duplicates     {}", c.duplicates_removed);
    println!("  assigned       {}", c.accounts_assigned);
    println!("  entries        {}", c.entries());
    println!(
        "  debits {} / credits {} ({})",
        report.total_debits,
        report.total_credits,
        if report.balanced() { "balanced" } else { "UNBALANCED" }
    );
    println!("  net income     {}", report.net_income);

    Ok(())
}

/// Run the gRPC server with the given configuration.
async fn run_server_with_config(
    host: &str,
    port: u16,
    config: LedgerServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let db = Database::connect(&config.database).await?;
    let db_conn = db.get_connection();
    let operating_bank = config.operating_bank_account.clone();
    info!("Operating bank account: {}", operating_bank);

    // Create repositories
    let accounts = Arc::new(AccountStore::new(db_conn.clone()));
    let documents = Arc::new(DocumentStore::new(db_conn.clone(), operating_bank.clone()));
    let journal = Arc::new(JournalStore::new(db_conn.clone(), operating_bank));
    let bank = Arc::new(BankStore::new(db_conn));

    // Create services
    let grpc_service = LedgerGrpcService::new(
        Arc::new(AccountManager::new(accounts.clone(), journal.clone())),
        Arc::new(BillingManager::new(documents.clone(), accounts.clone())),
        Arc::new(JournalManager::new(journal.clone(), accounts.clone())),
        Arc::new(BankingManager::new(bank.clone(), accounts.clone())),
        Arc::new(ReportManager::new(
            journal.clone(),
            documents,
            accounts,
            bank,
        )),
        Arc::new(MaintenanceManager::new(journal)),
    );

    // Build address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Ledger service listening on {}", addr);

    // Run server
    Server::builder()
        .add_service(proto::LedgerServiceServer::new(grpc_service))
        .serve(addr)
        .await?;

    Ok(())
}
