//! Chart of accounts and parties, with balances derived from the journal.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::reports::{customer_balance, supplier_balance};
use domain::{Account, AccountType, Customer, Money, NewAccount, NewParty, Supplier, TrialBalance};

use crate::repository::{AccountRepository, JournalRepository};

/// An account with its current balance in its normal direction.
#[derive(Debug, Clone)]
pub struct AccountBalance {
    pub account: Account,
    pub balance: Money,
}

#[async_trait]
pub trait AccountService: Send + Sync {
    async fn create_account(&self, account: NewAccount) -> AppResult<AccountBalance>;

    async fn get_account(&self, id: Uuid) -> AppResult<AccountBalance>;

    /// Accounts with balances, optionally narrowed to one type
    async fn list_accounts(
        &self,
        include_inactive: bool,
        account_type: Option<AccountType>,
    ) -> AppResult<Vec<AccountBalance>>;

    async fn deactivate_account(&self, id: Uuid) -> AppResult<AccountBalance>;

    async fn create_customer(&self, party: NewParty) -> AppResult<Customer>;

    async fn list_customers(&self) -> AppResult<Vec<Customer>>;

    /// Receivable balance owed by a customer
    async fn customer_balance(&self, id: Uuid) -> AppResult<Money>;

    async fn create_supplier(&self, party: NewParty) -> AppResult<Supplier>;

    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>>;

    /// Payable balance owed to a supplier
    async fn supplier_balance(&self, id: Uuid) -> AppResult<Money>;
}

pub struct AccountManager {
    accounts: Arc<dyn AccountRepository>,
    journal: Arc<dyn JournalRepository>,
}

impl AccountManager {
    pub fn new(accounts: Arc<dyn AccountRepository>, journal: Arc<dyn JournalRepository>) -> Self {
        Self { accounts, journal }
    }

    async fn balances(&self) -> AppResult<HashMap<Uuid, Money>> {
        let lines = self.journal.ledger_lines(None).await?;
        Ok(TrialBalance::build(&lines)
            .rows
            .into_iter()
            .map(|row| (row.account_id, row.balance))
            .collect())
    }

    async fn with_balance(&self, account: Account) -> AppResult<AccountBalance> {
        let balance = self
            .balances()
            .await?
            .get(&account.id)
            .copied()
            .unwrap_or_default();
        Ok(AccountBalance { account, balance })
    }
}

fn require_name(name: &str, what: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation(format!("{} name is required", what)));
    }
    Ok(())
}

#[async_trait]
impl AccountService for AccountManager {
    async fn create_account(&self, account: NewAccount) -> AppResult<AccountBalance> {
        require_name(&account.name, "Account")?;

        let account = self.accounts.create_account(account).await?;
        tracing::info!("Created account '{}' ({})", account.name, account.account_type);
        Ok(AccountBalance {
            account,
            balance: Money::ZERO,
        })
    }

    async fn get_account(&self, id: Uuid) -> AppResult<AccountBalance> {
        let account = self
            .accounts
            .find_account(id)
            .await?
            .ok_or_not_found("Account")?;
        self.with_balance(account).await
    }

    async fn list_accounts(
        &self,
        include_inactive: bool,
        account_type: Option<AccountType>,
    ) -> AppResult<Vec<AccountBalance>> {
        let (accounts, balances) =
            futures::try_join!(self.accounts.list_accounts(include_inactive), self.balances())?;

        Ok(accounts
            .into_iter()
            .filter(|a| account_type.map_or(true, |t| a.account_type == t))
            .map(|account| AccountBalance {
                balance: balances.get(&account.id).copied().unwrap_or_default(),
                account,
            })
            .collect())
    }

    async fn deactivate_account(&self, id: Uuid) -> AppResult<AccountBalance> {
        let account = self.accounts.set_account_active(id, false).await?;
        self.with_balance(account).await
    }

    async fn create_customer(&self, party: NewParty) -> AppResult<Customer> {
        require_name(&party.display_name, "Customer")?;
        self.accounts.create_customer(party).await
    }

    async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        self.accounts.list_customers().await
    }

    async fn customer_balance(&self, id: Uuid) -> AppResult<Money> {
        self.accounts
            .find_customer(id)
            .await?
            .ok_or_not_found("Customer")?;
        let lines = self.journal.ledger_lines(None).await?;
        Ok(customer_balance(&lines, id))
    }

    async fn create_supplier(&self, party: NewParty) -> AppResult<Supplier> {
        require_name(&party.display_name, "Supplier")?;
        self.accounts.create_supplier(party).await
    }

    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        self.accounts.list_suppliers().await
    }

    async fn supplier_balance(&self, id: Uuid) -> AppResult<Money> {
        self.accounts
            .find_supplier(id)
            .await?
            .ok_or_not_found("Supplier")?;
        let lines = self.journal.ledger_lines(None).await?;
        Ok(supplier_balance(&lines, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use domain::LedgerLine;
    use mockall::predicate::eq;

    use crate::repository::{MockAccountRepository, MockJournalRepository};

    fn account(id: Uuid, name: &str, account_type: AccountType) -> Account {
        Account {
            id,
            name: name.to_string(),
            account_type,
            detail_type: None,
            description: None,
            account_number: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(account: &Account, debit: i64, credit: i64) -> LedgerLine {
        LedgerLine {
            account_id: account.id,
            account_name: account.name.clone(),
            account_type: account.account_type,
            entry_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            debit: Money::from_cents(debit),
            credit: Money::from_cents(credit),
            customer_id: None,
            supplier_id: None,
        }
    }

    #[tokio::test]
    async fn test_list_accounts_derives_balances_from_lines() {
        let bank = account(Uuid::new_v4(), "Operating Account", AccountType::Bank);
        let sales = account(Uuid::new_v4(), "Sales", AccountType::Income);
        let idle = account(Uuid::new_v4(), "Petty Cash", AccountType::Bank);

        let lines = vec![line(&bank, 25_050, 0), line(&sales, 0, 25_050)];
        let listed = vec![bank.clone(), sales.clone(), idle.clone()];

        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_list_accounts()
            .with(eq(false))
            .returning(move |_| Ok(listed.clone()));
        let mut journal = MockJournalRepository::new();
        journal
            .expect_ledger_lines()
            .returning(move |_| Ok(lines.clone()));

        let service = AccountManager::new(Arc::new(accounts), Arc::new(journal));
        let result = service.list_accounts(false, None).await.unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].balance, Money::from_cents(25_050));
        assert_eq!(result[1].balance, Money::from_cents(25_050));
        assert_eq!(result[2].balance, Money::ZERO);
    }

    #[tokio::test]
    async fn test_list_accounts_filters_by_type() {
        let bank = account(Uuid::new_v4(), "Operating Account", AccountType::Bank);
        let sales = account(Uuid::new_v4(), "Sales", AccountType::Income);
        let listed = vec![bank, sales];

        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_list_accounts()
            .returning(move |_| Ok(listed.clone()));
        let mut journal = MockJournalRepository::new();
        journal.expect_ledger_lines().returning(|_| Ok(vec![]));

        let service = AccountManager::new(Arc::new(accounts), Arc::new(journal));
        let result = service
            .list_accounts(true, Some(AccountType::Income))
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].account.name, "Sales");
    }

    #[tokio::test]
    async fn test_get_account_not_found() {
        let mut accounts = MockAccountRepository::new();
        accounts.expect_find_account().returning(|_| Ok(None));
        let journal = MockJournalRepository::new();

        let service = AccountManager::new(Arc::new(accounts), Arc::new(journal));
        let result = service.get_account(Uuid::new_v4()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_account_rejects_blank_name() {
        let accounts = MockAccountRepository::new();
        let journal = MockJournalRepository::new();

        let service = AccountManager::new(Arc::new(accounts), Arc::new(journal));
        let result = service
            .create_account(NewAccount {
                name: "   ".to_string(),
                account_type: AccountType::Expenses,
                detail_type: None,
                description: None,
                account_number: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_customer_balance_uses_receivable_lines() {
        let customer_id = Uuid::new_v4();
        let ar = account(Uuid::new_v4(), "Accounts Receivable", AccountType::AccountsReceivable);
        let mut invoiced = line(&ar, 10_000, 0);
        invoiced.customer_id = Some(customer_id);
        let mut paid = line(&ar, 0, 4_000);
        paid.customer_id = Some(customer_id);
        let other = line(&ar, 7_000, 0);
        let lines = vec![invoiced, paid, other];

        let mut accounts = MockAccountRepository::new();
        accounts.expect_find_customer().returning(|id| {
            Ok(Some(Customer {
                id,
                display_name: "Ana Lima".to_string(),
                company: None,
                email: None,
                phone: None,
                is_active: true,
                created_at: Utc::now(),
            }))
        });
        let mut journal = MockJournalRepository::new();
        journal
            .expect_ledger_lines()
            .returning(move |_| Ok(lines.clone()));

        let service = AccountManager::new(Arc::new(accounts), Arc::new(journal));
        let balance = service.customer_balance(customer_id).await.unwrap();

        assert_eq!(balance, Money::from_cents(6_000));
    }
}
