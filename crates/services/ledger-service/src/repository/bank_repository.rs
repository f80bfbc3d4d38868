//! Bank feed transactions, categorization rules and reconciliations.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IsolationLevel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::{bank_rule, bank_transaction, reconciliation};
use super::ledger_tx;
use common::{AppError, AppResult, OptionExt};
use domain::{
    BankRule, BankTransaction, BankTransactionStatus, NewBankRule, NewBankTransaction,
    Reconciliation,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Bank repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait BankRepository: Send + Sync {
    /// Fit ids already stored for an account
    async fn existing_fit_ids(&self, account_id: Uuid) -> AppResult<HashSet<String>>;

    /// Store a de-duplicated import batch in one transaction
    async fn insert_transactions(&self, rows: Vec<NewBankTransaction>) -> AppResult<usize>;

    /// Transactions newest first, optionally narrowed by account and status
    async fn list_transactions(
        &self,
        account_id: Option<Uuid>,
        status: Option<BankTransactionStatus>,
    ) -> AppResult<Vec<BankTransaction>>;

    async fn find_transaction(&self, id: Uuid) -> AppResult<Option<BankTransaction>>;

    /// Persist categorization, status and reconciliation flags
    async fn update_transaction(&self, tx: &BankTransaction) -> AppResult<BankTransaction>;

    async fn count_for_review(&self) -> AppResult<u64>;

    /// Rules in evaluation order
    async fn list_rules(&self) -> AppResult<Vec<BankRule>>;

    async fn find_rule(&self, id: Uuid) -> AppResult<Option<BankRule>>;

    async fn create_rule(&self, rule: NewBankRule) -> AppResult<BankRule>;

    async fn update_rule(&self, id: Uuid, rule: NewBankRule) -> AppResult<BankRule>;

    async fn delete_rule(&self, id: Uuid) -> AppResult<()>;

    async fn create_reconciliation(&self, rec: &Reconciliation) -> AppResult<Reconciliation>;

    async fn find_reconciliation(&self, id: Uuid) -> AppResult<Option<Reconciliation>>;

    async fn update_reconciliation(&self, rec: &Reconciliation) -> AppResult<Reconciliation>;

    async fn list_reconciliations(&self, account_id: Option<Uuid>)
        -> AppResult<Vec<Reconciliation>>;
}

/// SeaORM implementation of BankRepository
pub struct BankStore {
    db: DatabaseConnection,
}

impl BankStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn conditions_json(rule: &NewBankRule) -> AppResult<serde_json::Value> {
    serde_json::to_value(&rule.conditions)
        .map_err(|e| AppError::internal(format!("Failed to encode rule conditions: {}", e)))
}

#[async_trait]
impl BankRepository for BankStore {
    async fn existing_fit_ids(&self, account_id: Uuid) -> AppResult<HashSet<String>> {
        let ids: Vec<String> = bank_transaction::Entity::find()
            .select_only()
            .column(bank_transaction::Column::FitId)
            .filter(bank_transaction::Column::AccountId.eq(account_id))
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_transactions(&self, rows: Vec<NewBankTransaction>) -> AppResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let count = rows.len();
        let now = Utc::now();
        let models: Vec<bank_transaction::ActiveModel> = rows
            .iter()
            .map(|row| bank_transaction::ActiveModel::from_new(row, now))
            .collect();

        let txn = ledger_tx::begin(&self.db, IsolationLevel::ReadCommitted).await?;
        let result: AppResult<_> = async {
            bank_transaction::Entity::insert_many(models).exec(&txn).await?;
            Ok(count)
        }
        .await;
        ledger_tx::finish(txn, result).await
    }

    async fn list_transactions(
        &self,
        account_id: Option<Uuid>,
        status: Option<BankTransactionStatus>,
    ) -> AppResult<Vec<BankTransaction>> {
        let mut query = bank_transaction::Entity::find();
        if let Some(account_id) = account_id {
            query = query.filter(bank_transaction::Column::AccountId.eq(account_id));
        }
        if let Some(status) = status {
            query = query.filter(bank_transaction::Column::Status.eq(status.as_str()));
        }

        query
            .order_by_desc(bank_transaction::Column::TransactionDate)
            .order_by_desc(bank_transaction::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(BankTransaction::try_from)
            .collect()
    }

    async fn find_transaction(&self, id: Uuid) -> AppResult<Option<BankTransaction>> {
        bank_transaction::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(BankTransaction::try_from)
            .transpose()
    }

    async fn update_transaction(&self, tx: &BankTransaction) -> AppResult<BankTransaction> {
        let model = bank_transaction::Entity::find_by_id(tx.id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Bank transaction")?;

        let mut active: bank_transaction::ActiveModel = model.into();
        active.status = Set(tx.status.as_str().to_string());
        active.category_account_id = Set(tx.category_account_id);
        active.category = Set(tx.category.clone());
        active.payee = Set(tx.payee.clone());
        active.applied_rule_id = Set(tx.applied_rule_id);
        active.memo = Set(tx.memo.clone());
        active.is_reconciled = Set(tx.is_reconciled);

        let model = active.update(&self.db).await?;
        BankTransaction::try_from(model)
    }

    async fn count_for_review(&self) -> AppResult<u64> {
        let count = bank_transaction::Entity::find()
            .filter(bank_transaction::Column::Status.eq(BankTransactionStatus::ForReview.as_str()))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn list_rules(&self) -> AppResult<Vec<BankRule>> {
        bank_rule::Entity::find()
            .order_by_asc(bank_rule::Column::Priority)
            .order_by_asc(bank_rule::Column::CreatedAt)
            .order_by_asc(bank_rule::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(BankRule::try_from)
            .collect()
    }

    async fn find_rule(&self, id: Uuid) -> AppResult<Option<BankRule>> {
        bank_rule::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(BankRule::try_from)
            .transpose()
    }

    async fn create_rule(&self, rule: NewBankRule) -> AppResult<BankRule> {
        rule.validate()?;

        let now = Utc::now();
        let model = bank_rule::ActiveModel {
            id: Set(Uuid::new_v4()),
            conditions: Set(conditions_json(&rule)?),
            name: Set(rule.name.trim().to_string()),
            priority: Set(rule.priority),
            assign_account_id: Set(rule.assign_account_id),
            assign_category: Set(rule.assign_category),
            assign_payee: Set(rule.assign_payee),
            auto_confirm: Set(rule.auto_confirm),
            is_active: Set(rule.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        BankRule::try_from(model)
    }

    async fn update_rule(&self, id: Uuid, rule: NewBankRule) -> AppResult<BankRule> {
        rule.validate()?;

        let model = bank_rule::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Bank rule")?;

        let mut active: bank_rule::ActiveModel = model.into();
        active.conditions = Set(conditions_json(&rule)?);
        active.name = Set(rule.name.trim().to_string());
        active.priority = Set(rule.priority);
        active.assign_account_id = Set(rule.assign_account_id);
        active.assign_category = Set(rule.assign_category);
        active.assign_payee = Set(rule.assign_payee);
        active.auto_confirm = Set(rule.auto_confirm);
        active.is_active = Set(rule.is_active);
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        BankRule::try_from(model)
    }

    async fn delete_rule(&self, id: Uuid) -> AppResult<()> {
        let result = bank_rule::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found("Bank rule"));
        }
        Ok(())
    }

    async fn create_reconciliation(&self, rec: &Reconciliation) -> AppResult<Reconciliation> {
        let model = reconciliation::ActiveModel::from(rec).insert(&self.db).await?;
        Reconciliation::try_from(model)
    }

    async fn find_reconciliation(&self, id: Uuid) -> AppResult<Option<Reconciliation>> {
        reconciliation::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Reconciliation::try_from)
            .transpose()
    }

    async fn update_reconciliation(&self, rec: &Reconciliation) -> AppResult<Reconciliation> {
        let model = reconciliation::ActiveModel::from(rec).update(&self.db).await?;
        Reconciliation::try_from(model)
    }

    async fn list_reconciliations(
        &self,
        account_id: Option<Uuid>,
    ) -> AppResult<Vec<Reconciliation>> {
        let mut query = reconciliation::Entity::find();
        if let Some(account_id) = account_id {
            query = query.filter(reconciliation::Column::AccountId.eq(account_id));
        }

        query
            .order_by_desc(reconciliation::Column::StatementDate)
            .order_by_desc(reconciliation::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Reconciliation::try_from)
            .collect()
    }
}
