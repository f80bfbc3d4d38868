//! Database migrations.
//!
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_accounts_and_parties;
mod m20250101_000002_create_documents;
mod m20250101_000003_create_journal;
mod m20250101_000004_create_bank_feed;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_accounts_and_parties::Migration),
            Box::new(m20250101_000002_create_documents::Migration),
            Box::new(m20250101_000003_create_journal::Migration),
            Box::new(m20250101_000004_create_bank_feed::Migration),
        ]
    }
}
