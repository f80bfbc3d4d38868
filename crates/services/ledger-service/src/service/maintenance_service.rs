//! Ledger maintenance.

use std::sync::Arc;

use async_trait::async_trait;

use common::AppResult;
use domain::RejournalizeReport;

use crate::repository::JournalRepository;

#[async_trait]
pub trait MaintenanceService: Send + Sync {
    /// Rebuild every journal entry from the source documents.
    async fn rejournalize(&self, dry_run: bool) -> AppResult<RejournalizeReport>;
}

pub struct MaintenanceManager {
    journal: Arc<dyn JournalRepository>,
}

impl MaintenanceManager {
    pub fn new(journal: Arc<dyn JournalRepository>) -> Self {
        Self { journal }
    }
}

#[async_trait]
impl MaintenanceService for MaintenanceManager {
    async fn rejournalize(&self, dry_run: bool) -> AppResult<RejournalizeReport> {
        tracing::info!("Rejournalizing ledger (dry_run={})", dry_run);

        let report = self.journal.rejournalize(dry_run).await?;
        let c = &report.counts;
        tracing::info!(
            "Rejournalize {}: {} entries (invoices={}, expenses={}, payments={}, bills={}, bill_payments={}, transfers={}), {} duplicates removed, {} accounts assigned",
            if dry_run { "dry run finished" } else { "committed" },
            c.entries(),
            c.invoices,
            c.expenses,
            c.payments,
            c.bills,
            c.bill_payments,
            c.transfers,
            c.duplicates_removed,
            c.accounts_assigned
        );
        tracing::info!(
            "Ledger totals: debits={}, credits={}, net income={}",
            report.total_debits,
            report.total_credits,
            report.net_income
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AppError;
    use domain::{Money, RebuildCounts};
    use mockall::predicate::eq;

    use crate::repository::MockJournalRepository;

    #[tokio::test]
    async fn test_rejournalize_passes_dry_run_flag() {
        let mut journal = MockJournalRepository::new();
        journal
            .expect_rejournalize()
            .with(eq(true))
            .times(1)
            .returning(|dry_run| {
                Ok(RejournalizeReport {
                    dry_run,
                    counts: RebuildCounts {
                        invoices: 2,
                        payments: 1,
                        ..Default::default()
                    },
                    total_debits: Money::from_cents(30_000),
                    total_credits: Money::from_cents(30_000),
                    net_income: Money::from_cents(20_000),
                })
            });

        let service = MaintenanceManager::new(Arc::new(journal));
        let report = service.rejournalize(true).await.unwrap();

        assert!(report.dry_run);
        assert!(report.balanced());
        assert_eq!(report.counts.entries(), 3);
    }

    #[tokio::test]
    async fn test_rejournalize_propagates_failure() {
        let mut journal = MockJournalRepository::new();
        journal
            .expect_rejournalize()
            .returning(|_| Err(AppError::internal("Rebuilt ledger is unbalanced")));

        let service = MaintenanceManager::new(Arc::new(journal));
        let result = service.rejournalize(false).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
