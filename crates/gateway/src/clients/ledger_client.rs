//! gRPC client for ledger-service.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tonic::transport::{Channel, Endpoint};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use common::{AppError, AppResult, GrpcClientConfig};
use domain::{
    Account, AgingKind, AgingReport, BalanceSheet, BankRule, BankTransaction, Bill, BillPayment,
    Customer, Dashboard, Expense, Invoice, JournalEntry, Money, MonthlyBalance,
    MonthlyProfitAndLoss, Payment, ProfitAndLoss, Reconciliation, ReconciliationWorkspace,
    RejournalizeReport, Supplier, Transfer, TrialBalance,
};
use proto::ledger::{self as pb, ledger_service_client::LedgerServiceClient as ProtoLedgerClient};

use super::convert::*;

/// Account with its balance derived from posted lines.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountView {
    #[serde(flatten)]
    pub account: Account,
    #[schema(value_type = i64, example = 125000)]
    pub balance: Money,
}

/// Open balance of a customer or supplier.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartyBalance {
    pub id: Uuid,
    #[schema(value_type = i64)]
    pub balance: Money,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportSummary {
    pub imported: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RuleRunSummary {
    pub matched: u32,
}

/// Reconciliation workspace with the figures needed to finish.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkspaceView {
    #[serde(flatten)]
    pub workspace: ReconciliationWorkspace,
    #[schema(value_type = i64)]
    pub difference: Money,
    pub can_finish: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyProfitAndLossReport {
    pub year: i32,
    pub months: Vec<MonthlyProfitAndLoss>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyBalanceReport {
    pub year: i32,
    pub months: Vec<MonthlyBalance>,
}

fn fmt_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn fmt_opt_date(d: Option<NaiveDate>) -> Option<String> {
    d.map(fmt_date)
}

/// gRPC client wrapper for ledger-service.
pub struct LedgerClient {
    client: ProtoLedgerClient<Channel>,
}

impl LedgerClient {
    /// Connect to ledger-service.
    pub async fn connect(config: &GrpcClientConfig) -> Result<Self, tonic::transport::Error> {
        debug!("Connecting to ledger-service at {}", config.endpoint);
        let channel = Endpoint::from_shared(config.endpoint.clone())?
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect()
            .await?;
        Ok(Self {
            client: ProtoLedgerClient::new(channel),
        })
    }

    fn client(&self) -> ProtoLedgerClient<Channel> {
        self.client.clone()
    }

    /// Cheapest round trip that touches the ledger database.
    pub async fn ping(&self) -> AppResult<()> {
        self.client()
            .list_bank_rules(pb::Empty {})
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    // =========================================================================
    // Chart of accounts
    // =========================================================================

    pub async fn create_account(&self, request: pb::CreateAccountRequest) -> AppResult<AccountView> {
        let response = self
            .client()
            .create_account(request)
            .await
            .map_err(AppError::from)?;
        proto_to_account(response.into_inner())
    }

    pub async fn get_account(&self, id: Uuid) -> AppResult<AccountView> {
        let request = pb::IdRequest { id: id.to_string() };
        let response = self.client().get_account(request).await.map_err(AppError::from)?;
        proto_to_account(response.into_inner())
    }

    /// Every account, inactive ones included. Callers filter.
    pub async fn list_accounts(&self) -> AppResult<Vec<AccountView>> {
        let request = pb::ListAccountsRequest {
            include_inactive: true,
            account_type: None,
        };
        let response = self.client().list_accounts(request).await.map_err(AppError::from)?;
        response
            .into_inner()
            .accounts
            .into_iter()
            .map(proto_to_account)
            .collect()
    }

    pub async fn deactivate_account(&self, id: Uuid) -> AppResult<AccountView> {
        let request = pb::IdRequest { id: id.to_string() };
        let response = self
            .client()
            .deactivate_account(request)
            .await
            .map_err(AppError::from)?;
        proto_to_account(response.into_inner())
    }

    // =========================================================================
    // Customers and suppliers
    // =========================================================================

    pub async fn create_customer(&self, request: pb::CreatePartyRequest) -> AppResult<Customer> {
        let response = self
            .client()
            .create_customer(request)
            .await
            .map_err(AppError::from)?;
        proto_to_customer(response.into_inner())
    }

    pub async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        let response = self
            .client()
            .list_customers(pb::Empty {})
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .parties
            .into_iter()
            .map(proto_to_customer)
            .collect()
    }

    pub async fn customer_balance(&self, id: Uuid) -> AppResult<PartyBalance> {
        let request = pb::IdRequest { id: id.to_string() };
        let response = self
            .client()
            .get_customer_balance(request)
            .await
            .map_err(AppError::from)?;
        proto_to_party_balance(response.into_inner())
    }

    pub async fn create_supplier(&self, request: pb::CreatePartyRequest) -> AppResult<Supplier> {
        let response = self
            .client()
            .create_supplier(request)
            .await
            .map_err(AppError::from)?;
        proto_to_supplier(response.into_inner())
    }

    pub async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        let response = self
            .client()
            .list_suppliers(pb::Empty {})
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .parties
            .into_iter()
            .map(proto_to_supplier)
            .collect()
    }

    pub async fn supplier_balance(&self, id: Uuid) -> AppResult<PartyBalance> {
        let request = pb::IdRequest { id: id.to_string() };
        let response = self
            .client()
            .get_supplier_balance(request)
            .await
            .map_err(AppError::from)?;
        proto_to_party_balance(response.into_inner())
    }

    // =========================================================================
    // Sales
    // =========================================================================

    pub async fn create_invoice(&self, request: pb::CreateInvoiceRequest) -> AppResult<Invoice> {
        let response = self
            .client()
            .create_invoice(request)
            .await
            .map_err(AppError::from)?;
        proto_to_invoice(response.into_inner())
    }

    pub async fn get_invoice(&self, id: Uuid) -> AppResult<Invoice> {
        let request = pb::IdRequest { id: id.to_string() };
        let response = self.client().get_invoice(request).await.map_err(AppError::from)?;
        proto_to_invoice(response.into_inner())
    }

    pub async fn list_invoices(
        &self,
        status: Option<String>,
        customer_id: Option<Uuid>,
    ) -> AppResult<Vec<Invoice>> {
        let request = pb::ListInvoicesRequest {
            status,
            customer_id: customer_id.map(|id| id.to_string()),
        };
        let response = self.client().list_invoices(request).await.map_err(AppError::from)?;
        response
            .into_inner()
            .invoices
            .into_iter()
            .map(proto_to_invoice)
            .collect()
    }

    pub async fn send_invoice(&self, id: Uuid) -> AppResult<Invoice> {
        let request = pb::IdRequest { id: id.to_string() };
        let response = self.client().send_invoice(request).await.map_err(AppError::from)?;
        proto_to_invoice(response.into_inner())
    }

    pub async fn void_invoice(&self, id: Uuid, reason: Option<String>) -> AppResult<Invoice> {
        let request = pb::VoidInvoiceRequest {
            id: id.to_string(),
            reason,
        };
        let response = self.client().void_invoice(request).await.map_err(AppError::from)?;
        proto_to_invoice(response.into_inner())
    }

    pub async fn record_payment(&self, request: pb::RecordPaymentRequest) -> AppResult<Payment> {
        let response = self
            .client()
            .record_payment(request)
            .await
            .map_err(AppError::from)?;
        proto_to_payment(response.into_inner())
    }

    pub async fn list_payments(&self) -> AppResult<Vec<Payment>> {
        let response = self
            .client()
            .list_payments(pb::Empty {})
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .payments
            .into_iter()
            .map(proto_to_payment)
            .collect()
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    pub async fn create_expense(&self, request: pb::CreateExpenseRequest) -> AppResult<Expense> {
        let response = self
            .client()
            .create_expense(request)
            .await
            .map_err(AppError::from)?;
        proto_to_expense(response.into_inner())
    }

    pub async fn list_expenses(&self) -> AppResult<Vec<Expense>> {
        let response = self
            .client()
            .list_expenses(pb::Empty {})
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .expenses
            .into_iter()
            .map(proto_to_expense)
            .collect()
    }

    pub async fn create_bill(&self, request: pb::CreateBillRequest) -> AppResult<Bill> {
        let response = self.client().create_bill(request).await.map_err(AppError::from)?;
        proto_to_bill(response.into_inner())
    }

    pub async fn list_bills(
        &self,
        status: Option<String>,
        supplier_id: Option<Uuid>,
    ) -> AppResult<Vec<Bill>> {
        let request = pb::ListBillsRequest {
            status,
            supplier_id: supplier_id.map(|id| id.to_string()),
        };
        let response = self.client().list_bills(request).await.map_err(AppError::from)?;
        response
            .into_inner()
            .bills
            .into_iter()
            .map(proto_to_bill)
            .collect()
    }

    pub async fn pay_bill(&self, request: pb::PayBillRequest) -> AppResult<BillPayment> {
        let response = self.client().pay_bill(request).await.map_err(AppError::from)?;
        proto_to_bill_payment(response.into_inner())
    }

    pub async fn create_transfer(&self, request: pb::CreateTransferRequest) -> AppResult<Transfer> {
        let response = self
            .client()
            .create_transfer(request)
            .await
            .map_err(AppError::from)?;
        proto_to_transfer(response.into_inner())
    }

    pub async fn list_transfers(&self) -> AppResult<Vec<Transfer>> {
        let response = self
            .client()
            .list_transfers(pb::Empty {})
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .transfers
            .into_iter()
            .map(proto_to_transfer)
            .collect()
    }

    // =========================================================================
    // Journal
    // =========================================================================

    pub async fn create_journal_entry(
        &self,
        request: pb::CreateJournalEntryRequest,
    ) -> AppResult<JournalEntry> {
        let response = self
            .client()
            .create_journal_entry(request)
            .await
            .map_err(AppError::from)?;
        proto_to_journal_entry(response.into_inner())
    }

    pub async fn get_journal_entry(&self, id: Uuid) -> AppResult<JournalEntry> {
        let request = pb::IdRequest { id: id.to_string() };
        let response = self
            .client()
            .get_journal_entry(request)
            .await
            .map_err(AppError::from)?;
        proto_to_journal_entry(response.into_inner())
    }

    pub async fn list_journal_entries(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<Vec<JournalEntry>> {
        let request = pb::DateRangeRequest {
            start_date: fmt_opt_date(start),
            end_date: fmt_opt_date(end),
        };
        let response = self
            .client()
            .list_journal_entries(request)
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .entries
            .into_iter()
            .map(proto_to_journal_entry)
            .collect()
    }

    pub async fn reverse_journal_entry(
        &self,
        id: Uuid,
        reason: Option<String>,
        entry_date: Option<NaiveDate>,
    ) -> AppResult<JournalEntry> {
        let request = pb::ReverseJournalEntryRequest {
            id: id.to_string(),
            reason,
            entry_date: fmt_opt_date(entry_date),
        };
        let response = self
            .client()
            .reverse_journal_entry(request)
            .await
            .map_err(AppError::from)?;
        proto_to_journal_entry(response.into_inner())
    }

    // =========================================================================
    // Bank feed
    // =========================================================================

    pub async fn import_bank_transactions(
        &self,
        account_id: Uuid,
        rows: Vec<pb::ImportedRow>,
    ) -> AppResult<ImportSummary> {
        let request = pb::ImportBankTransactionsRequest {
            account_id: account_id.to_string(),
            rows,
        };
        let response = self
            .client()
            .import_bank_transactions(request)
            .await
            .map_err(AppError::from)?
            .into_inner();
        Ok(ImportSummary {
            imported: response.imported,
            skipped: response.skipped,
        })
    }

    pub async fn list_bank_transactions(
        &self,
        account_id: Option<Uuid>,
        status: Option<String>,
    ) -> AppResult<Vec<BankTransaction>> {
        let request = pb::ListBankTransactionsRequest {
            account_id: account_id.map(|id| id.to_string()),
            status,
        };
        let response = self
            .client()
            .list_bank_transactions(request)
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .transactions
            .into_iter()
            .map(proto_to_bank_transaction)
            .collect()
    }

    pub async fn categorize_bank_transaction(
        &self,
        id: Uuid,
        category_account_id: Uuid,
    ) -> AppResult<BankTransaction> {
        let request = pb::CategorizeBankTransactionRequest {
            id: id.to_string(),
            category_account_id: category_account_id.to_string(),
        };
        let response = self
            .client()
            .categorize_bank_transaction(request)
            .await
            .map_err(AppError::from)?;
        proto_to_bank_transaction(response.into_inner())
    }

    pub async fn exclude_bank_transaction(&self, id: Uuid) -> AppResult<BankTransaction> {
        let request = pb::IdRequest { id: id.to_string() };
        let response = self
            .client()
            .exclude_bank_transaction(request)
            .await
            .map_err(AppError::from)?;
        proto_to_bank_transaction(response.into_inner())
    }

    pub async fn apply_bank_rules(&self, account_id: Option<Uuid>) -> AppResult<RuleRunSummary> {
        let request = pb::ApplyBankRulesRequest {
            account_id: account_id.map(|id| id.to_string()),
        };
        let response = self
            .client()
            .apply_bank_rules(request)
            .await
            .map_err(AppError::from)?;
        Ok(RuleRunSummary {
            matched: response.into_inner().matched,
        })
    }

    pub async fn create_bank_rule(&self, rule: pb::BankRuleInput) -> AppResult<BankRule> {
        let response = self
            .client()
            .create_bank_rule(rule)
            .await
            .map_err(AppError::from)?;
        proto_to_bank_rule(response.into_inner())
    }

    pub async fn list_bank_rules(&self) -> AppResult<Vec<BankRule>> {
        let response = self
            .client()
            .list_bank_rules(pb::Empty {})
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .rules
            .into_iter()
            .map(proto_to_bank_rule)
            .collect()
    }

    pub async fn update_bank_rule(&self, id: Uuid, rule: pb::BankRuleInput) -> AppResult<BankRule> {
        let request = pb::UpdateBankRuleRequest {
            id: id.to_string(),
            rule: Some(rule),
        };
        let response = self
            .client()
            .update_bank_rule(request)
            .await
            .map_err(AppError::from)?;
        proto_to_bank_rule(response.into_inner())
    }

    pub async fn delete_bank_rule(&self, id: Uuid) -> AppResult<()> {
        let request = pb::IdRequest { id: id.to_string() };
        self.client()
            .delete_bank_rule(request)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    pub async fn reconciliation_workspace(
        &self,
        account_id: Uuid,
        statement_date: NaiveDate,
        statement_balance: Money,
    ) -> AppResult<WorkspaceView> {
        let request = pb::WorkspaceRequest {
            account_id: account_id.to_string(),
            statement_date: fmt_date(statement_date),
            statement_balance: statement_balance.cents(),
        };
        let response = self
            .client()
            .get_reconciliation_workspace(request)
            .await
            .map_err(AppError::from)?;
        proto_to_workspace(response.into_inner())
    }

    pub async fn toggle_reconciled(
        &self,
        transaction_id: Uuid,
        reconciled: bool,
    ) -> AppResult<BankTransaction> {
        let request = pb::ToggleReconciledRequest {
            transaction_id: transaction_id.to_string(),
            reconciled,
        };
        let response = self
            .client()
            .toggle_reconciled(request)
            .await
            .map_err(AppError::from)?;
        proto_to_bank_transaction(response.into_inner())
    }

    pub async fn start_reconciliation(
        &self,
        account_id: Uuid,
        statement_date: NaiveDate,
        statement_balance: Money,
    ) -> AppResult<Reconciliation> {
        let request = pb::StartReconciliationRequest {
            account_id: account_id.to_string(),
            statement_date: fmt_date(statement_date),
            statement_balance: statement_balance.cents(),
        };
        let response = self
            .client()
            .start_reconciliation(request)
            .await
            .map_err(AppError::from)?;
        proto_to_reconciliation(response.into_inner())
    }

    pub async fn finish_reconciliation(&self, id: Uuid) -> AppResult<Reconciliation> {
        let request = pb::IdRequest { id: id.to_string() };
        let response = self
            .client()
            .finish_reconciliation(request)
            .await
            .map_err(AppError::from)?;
        proto_to_reconciliation(response.into_inner())
    }

    pub async fn list_reconciliations(&self, account_id: Option<Uuid>) -> AppResult<Vec<Reconciliation>> {
        let request = pb::ListReconciliationsRequest {
            account_id: account_id.map(|id| id.to_string()).unwrap_or_default(),
        };
        let response = self
            .client()
            .list_reconciliations(request)
            .await
            .map_err(AppError::from)?;
        response
            .into_inner()
            .reconciliations
            .into_iter()
            .map(proto_to_reconciliation)
            .collect()
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub async fn trial_balance(&self, as_of: Option<NaiveDate>) -> AppResult<TrialBalance> {
        let request = pb::AsOfRequest {
            as_of: fmt_opt_date(as_of),
        };
        let response = self
            .client()
            .get_trial_balance(request)
            .await
            .map_err(AppError::from)?;
        proto_to_trial_balance(response.into_inner())
    }

    pub async fn profit_and_loss(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<ProfitAndLoss> {
        let request = pb::DateRangeRequest {
            start_date: fmt_opt_date(start),
            end_date: fmt_opt_date(end),
        };
        let response = self
            .client()
            .get_profit_and_loss(request)
            .await
            .map_err(AppError::from)?;
        proto_to_profit_and_loss(response.into_inner())
    }

    pub async fn balance_sheet(&self, as_of: Option<NaiveDate>) -> AppResult<BalanceSheet> {
        let request = pb::AsOfRequest {
            as_of: fmt_opt_date(as_of),
        };
        let response = self
            .client()
            .get_balance_sheet(request)
            .await
            .map_err(AppError::from)?;
        proto_to_balance_sheet(response.into_inner())
    }

    pub async fn monthly_profit_and_loss(
        &self,
        year: Option<i32>,
    ) -> AppResult<MonthlyProfitAndLossReport> {
        let response = self
            .client()
            .get_monthly_profit_and_loss(pb::YearRequest { year })
            .await
            .map_err(AppError::from)?
            .into_inner();
        Ok(MonthlyProfitAndLossReport {
            year: response.year,
            months: response
                .months
                .into_iter()
                .map(proto_to_monthly_profit_and_loss)
                .collect(),
        })
    }

    pub async fn monthly_balance_sheet(&self, year: Option<i32>) -> AppResult<MonthlyBalanceReport> {
        let response = self
            .client()
            .get_monthly_balance_sheet(pb::YearRequest { year })
            .await
            .map_err(AppError::from)?
            .into_inner();
        Ok(MonthlyBalanceReport {
            year: response.year,
            months: response
                .months
                .into_iter()
                .map(proto_to_monthly_balance)
                .collect(),
        })
    }

    pub async fn aging_report(
        &self,
        kind: AgingKind,
        as_of: Option<NaiveDate>,
    ) -> AppResult<AgingReport> {
        let request = pb::AgingRequest {
            kind: kind.as_str().to_string(),
            as_of: fmt_opt_date(as_of),
        };
        let response = self
            .client()
            .get_aging_report(request)
            .await
            .map_err(AppError::from)?;
        proto_to_aging_report(response.into_inner())
    }

    pub async fn dashboard(&self, period: Option<String>) -> AppResult<Dashboard> {
        let response = self
            .client()
            .get_dashboard(pb::DashboardRequest { period })
            .await
            .map_err(AppError::from)?;
        proto_to_dashboard(response.into_inner())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    pub async fn rejournalize(&self, dry_run: bool) -> AppResult<RejournalizeReport> {
        let response = self
            .client()
            .rejournalize(pb::RejournalizeRequest { dry_run })
            .await
            .map_err(AppError::from)?;
        Ok(proto_to_rejournalize_report(response.into_inner()))
    }
}
