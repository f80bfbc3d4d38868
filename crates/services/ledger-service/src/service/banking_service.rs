//! Bank feed import, rule-driven categorization and reconciliation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use common::{AppResult, OptionExt};
use domain::bank::{first_matching_rule, plan_import};
use domain::{
    BankRule, BankTransaction, BankTransactionStatus, ImportedTransaction, Money, NewBankRule,
    Reconciliation, ReconciliationWorkspace,
};

use crate::repository::{AccountRepository, BankRepository};

/// Counts returned by a statement import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

#[async_trait]
pub trait BankingService: Send + Sync {
    /// Import statement rows for an account, skipping fit ids already on
    /// file and applying rules to what is new.
    async fn import_transactions(
        &self,
        account_id: Uuid,
        rows: Vec<ImportedTransaction>,
    ) -> AppResult<ImportSummary>;

    async fn list_transactions(
        &self,
        account_id: Option<Uuid>,
        status: Option<BankTransactionStatus>,
    ) -> AppResult<Vec<BankTransaction>>;

    async fn categorize(&self, id: Uuid, category_account_id: Uuid) -> AppResult<BankTransaction>;

    async fn exclude(&self, id: Uuid) -> AppResult<BankTransaction>;

    /// Run the rules over every For Review transaction. Returns how many matched.
    async fn apply_rules(&self, account_id: Option<Uuid>) -> AppResult<usize>;

    async fn create_rule(&self, rule: NewBankRule) -> AppResult<BankRule>;

    async fn list_rules(&self) -> AppResult<Vec<BankRule>>;

    async fn update_rule(&self, id: Uuid, rule: NewBankRule) -> AppResult<BankRule>;

    async fn delete_rule(&self, id: Uuid) -> AppResult<()>;

    async fn workspace(
        &self,
        account_id: Uuid,
        statement_date: NaiveDate,
        statement_balance: Money,
    ) -> AppResult<ReconciliationWorkspace>;

    async fn toggle_reconciled(&self, id: Uuid, reconciled: bool) -> AppResult<BankTransaction>;

    async fn start_reconciliation(
        &self,
        account_id: Uuid,
        statement_date: NaiveDate,
        statement_balance: Money,
    ) -> AppResult<Reconciliation>;

    async fn finish_reconciliation(&self, id: Uuid) -> AppResult<Reconciliation>;

    async fn list_reconciliations(&self, account_id: Option<Uuid>)
        -> AppResult<Vec<Reconciliation>>;
}

pub struct BankingManager {
    bank: Arc<dyn BankRepository>,
    accounts: Arc<dyn AccountRepository>,
}

impl BankingManager {
    pub fn new(bank: Arc<dyn BankRepository>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { bank, accounts }
    }

    async fn require_account(&self, id: Uuid) -> AppResult<()> {
        self.accounts
            .find_account(id)
            .await?
            .ok_or_not_found("Account")
            .map(|_| ())
    }

    async fn transaction(&self, id: Uuid) -> AppResult<BankTransaction> {
        self.bank
            .find_transaction(id)
            .await?
            .ok_or_not_found("Bank transaction")
    }

    async fn build_workspace(
        &self,
        account_id: Uuid,
        statement_date: NaiveDate,
        statement_balance: Money,
    ) -> AppResult<ReconciliationWorkspace> {
        let transactions = self.bank.list_transactions(Some(account_id), None).await?;
        Ok(ReconciliationWorkspace::build(
            account_id,
            statement_date,
            statement_balance,
            transactions,
        ))
    }

    async fn validate_rule(&self, rule: &NewBankRule) -> AppResult<()> {
        rule.validate()?;
        if let Some(account_id) = rule.assign_account_id {
            self.require_account(account_id).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BankingService for BankingManager {
    async fn import_transactions(
        &self,
        account_id: Uuid,
        rows: Vec<ImportedTransaction>,
    ) -> AppResult<ImportSummary> {
        self.require_account(account_id).await?;

        let (existing, rules) = futures::try_join!(
            self.bank.existing_fit_ids(account_id),
            self.bank.list_rules()
        )?;

        let mut plan = plan_import(account_id, &existing, rows);
        let mut matched = 0;
        for row in &mut plan.rows {
            if let Some(rule) = first_matching_rule(&rules, &row.description, row.amount) {
                row.apply(&rule.outcome());
                matched += 1;
            }
        }

        let imported = self.bank.insert_transactions(plan.rows).await?;
        tracing::info!(
            "Imported {} bank transactions ({} skipped, {} matched a rule)",
            imported,
            plan.skipped,
            matched
        );

        Ok(ImportSummary {
            imported,
            skipped: plan.skipped,
        })
    }

    async fn list_transactions(
        &self,
        account_id: Option<Uuid>,
        status: Option<BankTransactionStatus>,
    ) -> AppResult<Vec<BankTransaction>> {
        self.bank.list_transactions(account_id, status).await
    }

    async fn categorize(&self, id: Uuid, category_account_id: Uuid) -> AppResult<BankTransaction> {
        self.require_account(category_account_id).await?;

        let mut tx = self.transaction(id).await?;
        tx.categorize(category_account_id)?;
        self.bank.update_transaction(&tx).await
    }

    async fn exclude(&self, id: Uuid) -> AppResult<BankTransaction> {
        let mut tx = self.transaction(id).await?;
        tx.exclude();
        self.bank.update_transaction(&tx).await
    }

    async fn apply_rules(&self, account_id: Option<Uuid>) -> AppResult<usize> {
        let (pending, rules) = futures::try_join!(
            self.bank
                .list_transactions(account_id, Some(BankTransactionStatus::ForReview)),
            self.bank.list_rules()
        )?;

        let mut matched = 0;
        for mut tx in pending {
            let Some(rule) = first_matching_rule(&rules, &tx.description, tx.amount) else {
                continue;
            };
            tx.apply(&rule.outcome());
            self.bank.update_transaction(&tx).await?;
            matched += 1;
        }

        tracing::info!("Bank rules matched {} transactions", matched);
        Ok(matched)
    }

    async fn create_rule(&self, rule: NewBankRule) -> AppResult<BankRule> {
        self.validate_rule(&rule).await?;
        self.bank.create_rule(rule).await
    }

    async fn list_rules(&self) -> AppResult<Vec<BankRule>> {
        self.bank.list_rules().await
    }

    async fn update_rule(&self, id: Uuid, rule: NewBankRule) -> AppResult<BankRule> {
        self.validate_rule(&rule).await?;
        self.bank.update_rule(id, rule).await
    }

    async fn delete_rule(&self, id: Uuid) -> AppResult<()> {
        self.bank.delete_rule(id).await
    }

    async fn workspace(
        &self,
        account_id: Uuid,
        statement_date: NaiveDate,
        statement_balance: Money,
    ) -> AppResult<ReconciliationWorkspace> {
        self.require_account(account_id).await?;
        self.build_workspace(account_id, statement_date, statement_balance)
            .await
    }

    async fn toggle_reconciled(&self, id: Uuid, reconciled: bool) -> AppResult<BankTransaction> {
        let mut tx = self.transaction(id).await?;
        tx.is_reconciled = reconciled;
        self.bank.update_transaction(&tx).await
    }

    async fn start_reconciliation(
        &self,
        account_id: Uuid,
        statement_date: NaiveDate,
        statement_balance: Money,
    ) -> AppResult<Reconciliation> {
        self.require_account(account_id).await?;

        let rec = Reconciliation::start(
            Uuid::new_v4(),
            account_id,
            statement_date,
            statement_balance,
            Utc::now(),
        );
        self.bank.create_reconciliation(&rec).await
    }

    async fn finish_reconciliation(&self, id: Uuid) -> AppResult<Reconciliation> {
        let mut rec = self
            .bank
            .find_reconciliation(id)
            .await?
            .ok_or_not_found("Reconciliation")?;

        let workspace = self
            .build_workspace(rec.account_id, rec.statement_date, rec.statement_balance)
            .await?;
        rec.complete(&workspace, Utc::now())?;

        let rec = self.bank.update_reconciliation(&rec).await?;
        tracing::info!(
            "Completed reconciliation {} as of {} ({} cleared)",
            rec.id,
            rec.statement_date,
            rec.cleared_balance
        );
        Ok(rec)
    }

    async fn list_reconciliations(
        &self,
        account_id: Option<Uuid>,
    ) -> AppResult<Vec<Reconciliation>> {
        self.bank.list_reconciliations(account_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use common::AppError;
    use domain::{Account, AccountType, RuleCondition, RuleField, RuleOperator};

    use crate::repository::{MockAccountRepository, MockBankRepository};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, day).unwrap()
    }

    fn known_accounts() -> MockAccountRepository {
        let mut accounts = MockAccountRepository::new();
        accounts.expect_find_account().returning(|id| {
            Ok(Some(Account {
                id,
                name: "Operating Account".to_string(),
                account_type: AccountType::Bank,
                detail_type: None,
                description: None,
                account_number: None,
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });
        accounts
    }

    fn rule(priority: i32, needle: &str, account_id: Uuid) -> BankRule {
        BankRule {
            id: Uuid::new_v4(),
            name: format!("Match {}", needle),
            priority,
            conditions: vec![RuleCondition {
                field: RuleField::Description,
                operator: RuleOperator::Contains,
                value: needle.to_string(),
            }],
            assign_account_id: Some(account_id),
            assign_category: None,
            assign_payee: None,
            auto_confirm: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn transaction(account_id: Uuid, day: u32, cents: i64, reconciled: bool) -> BankTransaction {
        BankTransaction {
            id: Uuid::new_v4(),
            account_id,
            transaction_date: d(day),
            description: "Deposit".to_string(),
            amount: Money::from_cents(cents),
            fit_id: format!("FIT-{}", day),
            status: BankTransactionStatus::ForReview,
            category_account_id: None,
            category: None,
            payee: None,
            applied_rule_id: None,
            memo: None,
            is_reconciled: reconciled,
            created_at: Utc::now(),
        }
    }

    fn row(description: &str, cents: i64, fit_id: Option<&str>) -> ImportedTransaction {
        ImportedTransaction {
            transaction_date: d(3),
            description: description.to_string(),
            amount: Money::from_cents(cents),
            fit_id: fit_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_import_skips_known_fit_ids_and_applies_rules() {
        let account_id = Uuid::new_v4();
        let software = Uuid::new_v4();
        let rules = vec![rule(1, "zoom", software)];

        let mut bank = MockBankRepository::new();
        bank.expect_existing_fit_ids()
            .returning(|_| Ok(HashSet::from(["FIT-1".to_string()])));
        bank.expect_list_rules().returning(move || Ok(rules.clone()));
        bank.expect_insert_transactions()
            .withf(move |rows| {
                rows.len() == 2
                    && rows[0].category_account_id == Some(software)
                    && rows[0].status == BankTransactionStatus::Categorized
                    && rows[1].status == BankTransactionStatus::ForReview
            })
            .returning(|rows| Ok(rows.len()));

        let service = BankingManager::new(Arc::new(bank), Arc::new(known_accounts()));
        let summary = service
            .import_transactions(
                account_id,
                vec![
                    row("ZOOM.US subscription", -1_599, Some("FIT-2")),
                    row("Client deposit", 50_000, None),
                    row("Already imported", 100, Some("FIT-1")),
                    row("Repeated in batch", -1_599, Some("FIT-2")),
                ],
            )
            .await
            .unwrap();

        assert_eq!(summary, ImportSummary { imported: 2, skipped: 2 });
    }

    #[tokio::test]
    async fn test_apply_rules_counts_matches() {
        let account_id = Uuid::new_v4();
        let target = Uuid::new_v4();
        let mut zoom = transaction(account_id, 4, -1_599, false);
        zoom.description = "ZOOM.US".to_string();
        let other = transaction(account_id, 5, 2_000, false);
        let pending = vec![zoom, other];
        let rules = vec![rule(1, "zoom", target)];

        let mut bank = MockBankRepository::new();
        bank.expect_list_transactions()
            .withf(|_, status| *status == Some(BankTransactionStatus::ForReview))
            .returning(move |_, _| Ok(pending.clone()));
        bank.expect_list_rules().returning(move || Ok(rules.clone()));
        bank.expect_update_transaction()
            .times(1)
            .returning(|tx| Ok(tx.clone()));

        let service = BankingManager::new(Arc::new(bank), Arc::new(known_accounts()));
        let matched = service.apply_rules(Some(account_id)).await.unwrap();

        assert_eq!(matched, 1);
    }

    #[tokio::test]
    async fn test_categorize_sets_category_account_only() {
        let account_id = Uuid::new_v4();
        let category = Uuid::new_v4();
        let tx = transaction(account_id, 2, -4_500, false);
        let tx_id = tx.id;

        let mut bank = MockBankRepository::new();
        bank.expect_find_transaction()
            .returning(move |_| Ok(Some(tx.clone())));
        bank.expect_update_transaction()
            .returning(|tx| Ok(tx.clone()));

        let service = BankingManager::new(Arc::new(bank), Arc::new(known_accounts()));
        let updated = service.categorize(tx_id, category).await.unwrap();

        assert_eq!(updated.account_id, account_id);
        assert_eq!(updated.category_account_id, Some(category));
        assert_eq!(updated.status, BankTransactionStatus::Categorized);
    }

    #[tokio::test]
    async fn test_finish_reconciliation_requires_zero_difference() {
        let account_id = Uuid::new_v4();
        let rec = Reconciliation::start(
            Uuid::new_v4(),
            account_id,
            d(31),
            Money::from_cents(10_000),
            Utc::now(),
        );
        let rec_id = rec.id;
        let txs = vec![
            transaction(account_id, 3, 6_000, true),
            transaction(account_id, 9, 3_999, true),
        ];

        let mut bank = MockBankRepository::new();
        bank.expect_find_reconciliation()
            .returning(move |_| Ok(Some(rec.clone())));
        bank.expect_list_transactions()
            .returning(move |_, _| Ok(txs.clone()));
        bank.expect_update_reconciliation().never();

        let service = BankingManager::new(Arc::new(bank), Arc::new(known_accounts()));
        let result = service.finish_reconciliation(rec_id).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_finish_reconciliation_completes_when_balanced() {
        let account_id = Uuid::new_v4();
        let rec = Reconciliation::start(
            Uuid::new_v4(),
            account_id,
            d(31),
            Money::from_cents(10_000),
            Utc::now(),
        );
        let rec_id = rec.id;
        let txs = vec![
            transaction(account_id, 3, 6_000, true),
            transaction(account_id, 9, 4_000, true),
            transaction(account_id, 12, -2_500, false),
        ];

        let mut bank = MockBankRepository::new();
        bank.expect_find_reconciliation()
            .returning(move |_| Ok(Some(rec.clone())));
        bank.expect_list_transactions()
            .returning(move |_, _| Ok(txs.clone()));
        bank.expect_update_reconciliation()
            .returning(|rec| Ok(rec.clone()));

        let service = BankingManager::new(Arc::new(bank), Arc::new(known_accounts()));
        let done = service.finish_reconciliation(rec_id).await.unwrap();

        assert_eq!(done.status, domain::ReconciliationStatus::Completed);
        assert_eq!(done.cleared_balance, Money::from_cents(10_000));
        assert!(done.difference.is_zero());
        assert!(done.completed_at.is_some());
    }
}
