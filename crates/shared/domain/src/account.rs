//! Chart of accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_OPERATING_BANK_ACCOUNT;
use crate::money::Money;

labelled_enum! {
    /// QuickBooks-style account types.
    pub enum AccountType {
        Bank => "Bank",
        AccountsReceivable => "Accounts Receivable",
        OtherCurrentAssets => "Other Current Assets",
        FixedAssets => "Fixed Assets",
        OtherAssets => "Other Assets",
        AccountsPayable => "Accounts Payable",
        CreditCard => "Credit Card",
        OtherCurrentLiabilities => "Other Current Liabilities",
        LongTermLiabilities => "Long Term Liabilities",
        Equity => "Equity",
        Income => "Income",
        OtherIncome => "Other Income",
        CostOfGoodsSold => "Cost of Goods Sold",
        Expenses => "Expenses",
        OtherExpenses => "Other Expenses",
    }
}

/// Side on which an account type increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalBalance {
    Debit,
    Credit,
}

impl AccountType {
    pub fn normal_balance(&self) -> NormalBalance {
        match self {
            AccountType::Bank
            | AccountType::AccountsReceivable
            | AccountType::OtherCurrentAssets
            | AccountType::FixedAssets
            | AccountType::OtherAssets
            | AccountType::CostOfGoodsSold
            | AccountType::Expenses
            | AccountType::OtherExpenses => NormalBalance::Debit,
            _ => NormalBalance::Credit,
        }
    }

    /// Balance in the account's natural sign given its debit and credit totals.
    pub fn balance_from(&self, debits: Money, credits: Money) -> Money {
        match self.normal_balance() {
            NormalBalance::Debit => debits - credits,
            NormalBalance::Credit => credits - debits,
        }
    }

    pub fn is_asset(&self) -> bool {
        matches!(
            self,
            AccountType::Bank
                | AccountType::AccountsReceivable
                | AccountType::OtherCurrentAssets
                | AccountType::FixedAssets
                | AccountType::OtherAssets
        )
    }

    pub fn is_liability(&self) -> bool {
        matches!(
            self,
            AccountType::AccountsPayable
                | AccountType::CreditCard
                | AccountType::OtherCurrentLiabilities
                | AccountType::LongTermLiabilities
        )
    }

    pub fn is_equity(&self) -> bool {
        matches!(self, AccountType::Equity)
    }

    pub fn is_income(&self) -> bool {
        matches!(self, AccountType::Income | AccountType::OtherIncome)
    }

    pub fn is_expense(&self) -> bool {
        matches!(
            self,
            AccountType::Expenses | AccountType::OtherExpenses | AccountType::CostOfGoodsSold
        )
    }
}

/// Account domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub account_type: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account creation data
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub detail_type: Option<String>,
    pub description: Option<String>,
    pub account_number: Option<String>,
}

/// Accounts the posting rules find or create by name and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemAccount {
    AccountsReceivable,
    Sales,
    SalesTaxPayable,
    SalesTaxReceivable,
    UndepositedFunds,
    OperatingBank,
    MiscellaneousExpenses,
    PaymentProcessingFees,
    AccountsPayable,
}

impl SystemAccount {
    pub const ALL: &'static [SystemAccount] = &[
        SystemAccount::AccountsReceivable,
        SystemAccount::Sales,
        SystemAccount::SalesTaxPayable,
        SystemAccount::SalesTaxReceivable,
        SystemAccount::UndepositedFunds,
        SystemAccount::OperatingBank,
        SystemAccount::MiscellaneousExpenses,
        SystemAccount::PaymentProcessingFees,
        SystemAccount::AccountsPayable,
    ];

    /// Default account name. The operating bank name is configurable and
    /// resolved through [`SystemAccount::name_with`].
    pub fn name(&self) -> &'static str {
        match self {
            SystemAccount::AccountsReceivable => "Accounts Receivable",
            SystemAccount::Sales => "Sales",
            SystemAccount::SalesTaxPayable => "GST/HST Payable",
            SystemAccount::SalesTaxReceivable => "GST/HST Receivable",
            SystemAccount::UndepositedFunds => "Undeposited Funds",
            SystemAccount::OperatingBank => DEFAULT_OPERATING_BANK_ACCOUNT,
            SystemAccount::MiscellaneousExpenses => "Miscellaneous Expenses",
            SystemAccount::PaymentProcessingFees => "QuickBooks Payments Fees",
            SystemAccount::AccountsPayable => "Accounts Payable",
        }
    }

    /// Account name, substituting the configured operating bank name.
    pub fn name_with<'a>(&self, operating_bank: &'a str) -> &'a str {
        match self {
            SystemAccount::OperatingBank => operating_bank,
            other => other.name(),
        }
    }

    pub fn account_type(&self) -> AccountType {
        match self {
            SystemAccount::AccountsReceivable => AccountType::AccountsReceivable,
            SystemAccount::Sales => AccountType::Income,
            SystemAccount::SalesTaxPayable => AccountType::OtherCurrentLiabilities,
            SystemAccount::SalesTaxReceivable | SystemAccount::UndepositedFunds => {
                AccountType::OtherCurrentAssets
            }
            SystemAccount::OperatingBank => AccountType::Bank,
            SystemAccount::MiscellaneousExpenses | SystemAccount::PaymentProcessingFees => {
                AccountType::Expenses
            }
            SystemAccount::AccountsPayable => AccountType::AccountsPayable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_balances() {
        assert_eq!(AccountType::Bank.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountType::CostOfGoodsSold.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountType::CreditCard.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountType::OtherIncome.normal_balance(), NormalBalance::Credit);
    }

    #[test]
    fn test_balance_from_follows_normal_side() {
        let debits = Money::from_cents(1000);
        let credits = Money::from_cents(300);
        assert_eq!(AccountType::Expenses.balance_from(debits, credits).cents(), 700);
        assert_eq!(AccountType::Income.balance_from(debits, credits).cents(), -700);
    }

    #[test]
    fn test_labels_round_trip() {
        for ty in AccountType::ALL {
            assert_eq!(ty.as_str().parse::<AccountType>().unwrap(), *ty);
        }
        assert!("Revenue".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_system_account_operating_bank_name() {
        assert_eq!(SystemAccount::OperatingBank.name_with("Chequing"), "Chequing");
        assert_eq!(SystemAccount::Sales.name_with("Chequing"), "Sales");
    }
}
