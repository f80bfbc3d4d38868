//! Chart of accounts, customers and suppliers.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::{account, customer, supplier};
use common::{AppError, AppResult, OptionExt};
use domain::{Account, Customer, NewAccount, NewParty, Supplier};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Account and party repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create an account; (name, type) must be unused
    async fn create_account(&self, account: NewAccount) -> AppResult<Account>;

    async fn find_account(&self, id: Uuid) -> AppResult<Option<Account>>;

    /// List accounts ordered by type then name
    async fn list_accounts(&self, include_inactive: bool) -> AppResult<Vec<Account>>;

    async fn set_account_active(&self, id: Uuid, active: bool) -> AppResult<Account>;

    async fn create_customer(&self, party: NewParty) -> AppResult<Customer>;

    async fn find_customer(&self, id: Uuid) -> AppResult<Option<Customer>>;

    async fn list_customers(&self) -> AppResult<Vec<Customer>>;

    async fn create_supplier(&self, party: NewParty) -> AppResult<Supplier>;

    async fn find_supplier(&self, id: Uuid) -> AppResult<Option<Supplier>>;

    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>>;
}

/// SeaORM implementation of AccountRepository
pub struct AccountStore {
    db: DatabaseConnection,
}

impl AccountStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountRepository for AccountStore {
    async fn create_account(&self, new: NewAccount) -> AppResult<Account> {
        let name = new.name.trim().to_string();
        let taken = account::Entity::find()
            .filter(account::Column::Name.eq(name.as_str()))
            .filter(account::Column::AccountType.eq(new.account_type.as_str()))
            .one(&self.db)
            .await?;
        if taken.is_some() {
            return Err(AppError::conflict(format!(
                "An {} account named '{}' already exists",
                new.account_type, name
            )));
        }

        let now = Utc::now();
        let model = account::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            account_type: Set(new.account_type.as_str().to_string()),
            detail_type: Set(new.detail_type),
            description: Set(new.description),
            account_number: Set(new.account_number),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        Account::try_from(model)
    }

    async fn find_account(&self, id: Uuid) -> AppResult<Option<Account>> {
        account::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn list_accounts(&self, include_inactive: bool) -> AppResult<Vec<Account>> {
        let mut query = account::Entity::find();
        if !include_inactive {
            query = query.filter(account::Column::IsActive.eq(true));
        }

        query
            .order_by_asc(account::Column::AccountType)
            .order_by_asc(account::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    async fn set_account_active(&self, id: Uuid, active: bool) -> AppResult<Account> {
        let model = account::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Account")?;

        let mut active_model: account::ActiveModel = model.into();
        active_model.is_active = Set(active);
        active_model.updated_at = Set(Utc::now());

        let model = active_model.update(&self.db).await?;
        Account::try_from(model)
    }

    async fn create_customer(&self, party: NewParty) -> AppResult<Customer> {
        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            display_name: Set(party.display_name.trim().to_string()),
            company: Set(party.company),
            email: Set(party.email),
            phone: Set(party.phone),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        Ok(Customer::from(model))
    }

    async fn find_customer(&self, id: Uuid) -> AppResult<Option<Customer>> {
        let result = customer::Entity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Customer::from))
    }

    async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        let models = customer::Entity::find()
            .order_by_asc(customer::Column::DisplayName)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Customer::from).collect())
    }

    async fn create_supplier(&self, party: NewParty) -> AppResult<Supplier> {
        let model = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            display_name: Set(party.display_name.trim().to_string()),
            company: Set(party.company),
            email: Set(party.email),
            phone: Set(party.phone),
            tax_id: Set(party.tax_id),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        Ok(Supplier::from(model))
    }

    async fn find_supplier(&self, id: Uuid) -> AppResult<Option<Supplier>> {
        let result = supplier::Entity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Supplier::from))
    }

    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        let models = supplier::Entity::find()
            .order_by_asc(supplier::Column::DisplayName)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Supplier::from).collect())
    }
}
