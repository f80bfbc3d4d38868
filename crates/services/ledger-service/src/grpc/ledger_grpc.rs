//! gRPC implementation for LedgerService.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use tonic::{Request, Response, Status};

use domain::{AgingKind, Money, ReportPeriod};
use proto::ledger::{self as pb, ledger_service_server::LedgerService as LedgerServiceProto};

use super::convert::*;
use crate::repository::{BillFilter, InvoiceFilter};
use crate::service::{
    AccountService, BankingService, BillingService, JournalService, MaintenanceService,
    ReportService,
};

/// gRPC service wrapper for the ledger services.
pub struct LedgerGrpcService {
    accounts: Arc<dyn AccountService>,
    billing: Arc<dyn BillingService>,
    journal: Arc<dyn JournalService>,
    banking: Arc<dyn BankingService>,
    reports: Arc<dyn ReportService>,
    maintenance: Arc<dyn MaintenanceService>,
}

impl LedgerGrpcService {
    /// Create a new gRPC service wrapper.
    pub fn new(
        accounts: Arc<dyn AccountService>,
        billing: Arc<dyn BillingService>,
        journal: Arc<dyn JournalService>,
        banking: Arc<dyn BankingService>,
        reports: Arc<dyn ReportService>,
        maintenance: Arc<dyn MaintenanceService>,
    ) -> Self {
        Self {
            accounts,
            billing,
            journal,
            banking,
            reports,
            maintenance,
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[tonic::async_trait]
impl LedgerServiceProto for LedgerGrpcService {
    // -------------------------------------------------------------------------
    // Chart of accounts
    // -------------------------------------------------------------------------

    async fn create_account(
        &self,
        request: Request<pb::CreateAccountRequest>,
    ) -> Result<Response<pb::Account>, Status> {
        let account = new_account(request.into_inner())?;

        let account = self
            .accounts
            .create_account(account)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(account_to_proto(&account)))
    }

    async fn get_account(
        &self,
        request: Request<pb::IdRequest>,
    ) -> Result<Response<pb::Account>, Status> {
        let id = parse_uuid(&request.into_inner().id)?;

        let account = self.accounts.get_account(id).await.map_err(Status::from)?;
        Ok(Response::new(account_to_proto(&account)))
    }

    async fn list_accounts(
        &self,
        request: Request<pb::ListAccountsRequest>,
    ) -> Result<Response<pb::ListAccountsResponse>, Status> {
        let req = request.into_inner();
        let account_type = parse_opt_label(req.account_type)?;

        let accounts = self
            .accounts
            .list_accounts(req.include_inactive, account_type)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::ListAccountsResponse {
            accounts: accounts.iter().map(account_to_proto).collect(),
        }))
    }

    async fn deactivate_account(
        &self,
        request: Request<pb::IdRequest>,
    ) -> Result<Response<pb::Account>, Status> {
        let id = parse_uuid(&request.into_inner().id)?;

        let account = self
            .accounts
            .deactivate_account(id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(account_to_proto(&account)))
    }

    // -------------------------------------------------------------------------
    // Customers and suppliers
    // -------------------------------------------------------------------------

    async fn create_customer(
        &self,
        request: Request<pb::CreatePartyRequest>,
    ) -> Result<Response<pb::Party>, Status> {
        let customer = self
            .accounts
            .create_customer(new_party(request.into_inner()))
            .await
            .map_err(Status::from)?;
        Ok(Response::new(customer_to_proto(&customer)))
    }

    async fn list_customers(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::ListPartiesResponse>, Status> {
        let customers = self.accounts.list_customers().await.map_err(Status::from)?;
        Ok(Response::new(pb::ListPartiesResponse {
            parties: customers.iter().map(customer_to_proto).collect(),
        }))
    }

    async fn get_customer_balance(
        &self,
        request: Request<pb::IdRequest>,
    ) -> Result<Response<pb::PartyBalance>, Status> {
        let id = parse_uuid(&request.into_inner().id)?;

        let balance = self
            .accounts
            .customer_balance(id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::PartyBalance {
            id: id.to_string(),
            balance: balance.cents(),
        }))
    }

    async fn create_supplier(
        &self,
        request: Request<pb::CreatePartyRequest>,
    ) -> Result<Response<pb::Party>, Status> {
        let supplier = self
            .accounts
            .create_supplier(new_party(request.into_inner()))
            .await
            .map_err(Status::from)?;
        Ok(Response::new(supplier_to_proto(&supplier)))
    }

    async fn list_suppliers(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::ListPartiesResponse>, Status> {
        let suppliers = self.accounts.list_suppliers().await.map_err(Status::from)?;
        Ok(Response::new(pb::ListPartiesResponse {
            parties: suppliers.iter().map(supplier_to_proto).collect(),
        }))
    }

    async fn get_supplier_balance(
        &self,
        request: Request<pb::IdRequest>,
    ) -> Result<Response<pb::PartyBalance>, Status> {
        let id = parse_uuid(&request.into_inner().id)?;

        let balance = self
            .accounts
            .supplier_balance(id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::PartyBalance {
            id: id.to_string(),
            balance: balance.cents(),
        }))
    }

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    async fn create_invoice(
        &self,
        request: Request<pb::CreateInvoiceRequest>,
    ) -> Result<Response<pb::Invoice>, Status> {
        let invoice = new_invoice(request.into_inner())?;

        let invoice = self
            .billing
            .create_invoice(invoice)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(invoice_to_proto(&invoice)))
    }

    async fn get_invoice(
        &self,
        request: Request<pb::IdRequest>,
    ) -> Result<Response<pb::Invoice>, Status> {
        let id = parse_uuid(&request.into_inner().id)?;

        let invoice = self.billing.get_invoice(id).await.map_err(Status::from)?;
        Ok(Response::new(invoice_to_proto(&invoice)))
    }

    async fn list_invoices(
        &self,
        request: Request<pb::ListInvoicesRequest>,
    ) -> Result<Response<pb::ListInvoicesResponse>, Status> {
        let req = request.into_inner();
        let filter = InvoiceFilter {
            status: parse_opt_label(req.status)?,
            customer_id: parse_opt_uuid(req.customer_id)?,
        };

        let invoices = self
            .billing
            .list_invoices(filter)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::ListInvoicesResponse {
            invoices: invoices.iter().map(invoice_to_proto).collect(),
        }))
    }

    async fn send_invoice(
        &self,
        request: Request<pb::IdRequest>,
    ) -> Result<Response<pb::Invoice>, Status> {
        let id = parse_uuid(&request.into_inner().id)?;

        let invoice = self.billing.send_invoice(id).await.map_err(Status::from)?;
        Ok(Response::new(invoice_to_proto(&invoice)))
    }

    async fn void_invoice(
        &self,
        request: Request<pb::VoidInvoiceRequest>,
    ) -> Result<Response<pb::Invoice>, Status> {
        let req = request.into_inner();
        let id = parse_uuid(&req.id)?;

        let invoice = self
            .billing
            .void_invoice(id, non_empty(req.reason))
            .await
            .map_err(Status::from)?;
        Ok(Response::new(invoice_to_proto(&invoice)))
    }

    async fn record_payment(
        &self,
        request: Request<pb::RecordPaymentRequest>,
    ) -> Result<Response<pb::Payment>, Status> {
        let payment = new_payment(request.into_inner())?;

        let payment = self
            .billing
            .record_payment(payment)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(payment_to_proto(&payment)))
    }

    async fn list_payments(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::ListPaymentsResponse>, Status> {
        let payments = self
            .billing
            .list_payments(None)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::ListPaymentsResponse {
            payments: payments.iter().map(payment_to_proto).collect(),
        }))
    }

    // -------------------------------------------------------------------------
    // Purchases
    // -------------------------------------------------------------------------

    async fn create_expense(
        &self,
        request: Request<pb::CreateExpenseRequest>,
    ) -> Result<Response<pb::Expense>, Status> {
        let expense = new_expense(request.into_inner())?;

        let expense = self
            .billing
            .create_expense(expense)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(expense_to_proto(&expense)))
    }

    async fn list_expenses(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::ListExpensesResponse>, Status> {
        let expenses = self.billing.list_expenses().await.map_err(Status::from)?;
        Ok(Response::new(pb::ListExpensesResponse {
            expenses: expenses.iter().map(expense_to_proto).collect(),
        }))
    }

    async fn create_bill(
        &self,
        request: Request<pb::CreateBillRequest>,
    ) -> Result<Response<pb::Bill>, Status> {
        let bill = new_bill(request.into_inner())?;

        let bill = self.billing.create_bill(bill).await.map_err(Status::from)?;
        Ok(Response::new(bill_to_proto(&bill)))
    }

    async fn list_bills(
        &self,
        request: Request<pb::ListBillsRequest>,
    ) -> Result<Response<pb::ListBillsResponse>, Status> {
        let req = request.into_inner();
        let filter = BillFilter {
            status: parse_opt_label(req.status)?,
            supplier_id: parse_opt_uuid(req.supplier_id)?,
        };

        let bills = self.billing.list_bills(filter).await.map_err(Status::from)?;
        Ok(Response::new(pb::ListBillsResponse {
            bills: bills.iter().map(bill_to_proto).collect(),
        }))
    }

    async fn pay_bill(
        &self,
        request: Request<pb::PayBillRequest>,
    ) -> Result<Response<pb::BillPayment>, Status> {
        let payment = new_bill_payment(request.into_inner())?;

        let payment = self.billing.pay_bill(payment).await.map_err(Status::from)?;
        Ok(Response::new(bill_payment_to_proto(&payment)))
    }

    async fn create_transfer(
        &self,
        request: Request<pb::CreateTransferRequest>,
    ) -> Result<Response<pb::Transfer>, Status> {
        let transfer = new_transfer(request.into_inner())?;

        let transfer = self
            .billing
            .create_transfer(transfer)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(transfer_to_proto(&transfer)))
    }

    async fn list_transfers(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::ListTransfersResponse>, Status> {
        let transfers = self.billing.list_transfers().await.map_err(Status::from)?;
        Ok(Response::new(pb::ListTransfersResponse {
            transfers: transfers.iter().map(transfer_to_proto).collect(),
        }))
    }

    // -------------------------------------------------------------------------
    // Journal
    // -------------------------------------------------------------------------

    async fn create_journal_entry(
        &self,
        request: Request<pb::CreateJournalEntryRequest>,
    ) -> Result<Response<pb::JournalEntry>, Status> {
        let entry = new_journal_entry(request.into_inner())?;

        let entry = self
            .journal
            .create_entry(entry)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(journal_entry_to_proto(&entry)))
    }

    async fn get_journal_entry(
        &self,
        request: Request<pb::IdRequest>,
    ) -> Result<Response<pb::JournalEntry>, Status> {
        let id = parse_uuid(&request.into_inner().id)?;

        let entry = self.journal.get_entry(id).await.map_err(Status::from)?;
        Ok(Response::new(journal_entry_to_proto(&entry)))
    }

    async fn list_journal_entries(
        &self,
        request: Request<pb::DateRangeRequest>,
    ) -> Result<Response<pb::ListJournalEntriesResponse>, Status> {
        let req = request.into_inner();
        let start = parse_opt_date(req.start_date, "start_date")?;
        let end = parse_opt_date(req.end_date, "end_date")?;

        let entries = self
            .journal
            .list_entries(start, end)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::ListJournalEntriesResponse {
            entries: entries.iter().map(journal_entry_to_proto).collect(),
        }))
    }

    async fn reverse_journal_entry(
        &self,
        request: Request<pb::ReverseJournalEntryRequest>,
    ) -> Result<Response<pb::JournalEntry>, Status> {
        let req = request.into_inner();
        let id = parse_uuid(&req.id)?;
        let date = parse_opt_date(req.entry_date, "entry_date")?;

        let entry = self
            .journal
            .reverse_entry(id, non_empty(req.reason), date)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(journal_entry_to_proto(&entry)))
    }

    // -------------------------------------------------------------------------
    // Bank feed
    // -------------------------------------------------------------------------

    async fn import_bank_transactions(
        &self,
        request: Request<pb::ImportBankTransactionsRequest>,
    ) -> Result<Response<pb::ImportBankTransactionsResponse>, Status> {
        let req = request.into_inner();
        let account_id = parse_uuid(&req.account_id)?;
        let rows = req
            .rows
            .into_iter()
            .map(imported_row)
            .collect::<Result<Vec<_>, _>>()?;

        let summary = self
            .banking
            .import_transactions(account_id, rows)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::ImportBankTransactionsResponse {
            imported: count(summary.imported),
            skipped: count(summary.skipped),
        }))
    }

    async fn list_bank_transactions(
        &self,
        request: Request<pb::ListBankTransactionsRequest>,
    ) -> Result<Response<pb::ListBankTransactionsResponse>, Status> {
        let req = request.into_inner();
        let account_id = parse_opt_uuid(req.account_id)?;
        let status = parse_opt_label(req.status)?;

        let transactions = self
            .banking
            .list_transactions(account_id, status)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::ListBankTransactionsResponse {
            transactions: transactions.iter().map(bank_transaction_to_proto).collect(),
        }))
    }

    async fn categorize_bank_transaction(
        &self,
        request: Request<pb::CategorizeBankTransactionRequest>,
    ) -> Result<Response<pb::BankTransaction>, Status> {
        let req = request.into_inner();
        let id = parse_uuid(&req.id)?;
        let category_account_id = parse_uuid(&req.category_account_id)?;

        let tx = self
            .banking
            .categorize(id, category_account_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(bank_transaction_to_proto(&tx)))
    }

    async fn exclude_bank_transaction(
        &self,
        request: Request<pb::IdRequest>,
    ) -> Result<Response<pb::BankTransaction>, Status> {
        let id = parse_uuid(&request.into_inner().id)?;

        let tx = self.banking.exclude(id).await.map_err(Status::from)?;
        Ok(Response::new(bank_transaction_to_proto(&tx)))
    }

    async fn apply_bank_rules(
        &self,
        request: Request<pb::ApplyBankRulesRequest>,
    ) -> Result<Response<pb::ApplyBankRulesResponse>, Status> {
        let account_id = parse_opt_uuid(request.into_inner().account_id)?;

        let matched = self
            .banking
            .apply_rules(account_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::ApplyBankRulesResponse {
            matched: count(matched),
        }))
    }

    async fn create_bank_rule(
        &self,
        request: Request<pb::BankRuleInput>,
    ) -> Result<Response<pb::BankRule>, Status> {
        let rule = new_bank_rule(request.into_inner())?;

        let rule = self.banking.create_rule(rule).await.map_err(Status::from)?;
        Ok(Response::new(bank_rule_to_proto(&rule)))
    }

    async fn list_bank_rules(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::ListBankRulesResponse>, Status> {
        let rules = self.banking.list_rules().await.map_err(Status::from)?;
        Ok(Response::new(pb::ListBankRulesResponse {
            rules: rules.iter().map(bank_rule_to_proto).collect(),
        }))
    }

    async fn update_bank_rule(
        &self,
        request: Request<pb::UpdateBankRuleRequest>,
    ) -> Result<Response<pb::BankRule>, Status> {
        let req = request.into_inner();
        let id = parse_uuid(&req.id)?;
        let input = req
            .rule
            .ok_or_else(|| Status::invalid_argument("Rule is required"))?;
        let rule = new_bank_rule(input)?;

        let rule = self
            .banking
            .update_rule(id, rule)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(bank_rule_to_proto(&rule)))
    }

    async fn delete_bank_rule(
        &self,
        request: Request<pb::IdRequest>,
    ) -> Result<Response<pb::DeleteResponse>, Status> {
        let id = parse_uuid(&request.into_inner().id)?;

        self.banking.delete_rule(id).await.map_err(Status::from)?;
        Ok(Response::new(pb::DeleteResponse { success: true }))
    }

    // -------------------------------------------------------------------------
    // Reconciliation
    // -------------------------------------------------------------------------

    async fn get_reconciliation_workspace(
        &self,
        request: Request<pb::WorkspaceRequest>,
    ) -> Result<Response<pb::ReconciliationWorkspace>, Status> {
        let req = request.into_inner();
        let account_id = parse_uuid(&req.account_id)?;
        let statement_date = parse_date(&req.statement_date, "statement_date")?;

        let workspace = self
            .banking
            .workspace(
                account_id,
                statement_date,
                Money::from_cents(req.statement_balance),
            )
            .await
            .map_err(Status::from)?;
        Ok(Response::new(workspace_to_proto(&workspace)))
    }

    async fn toggle_reconciled(
        &self,
        request: Request<pb::ToggleReconciledRequest>,
    ) -> Result<Response<pb::BankTransaction>, Status> {
        let req = request.into_inner();
        let id = parse_uuid(&req.transaction_id)?;

        let tx = self
            .banking
            .toggle_reconciled(id, req.reconciled)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(bank_transaction_to_proto(&tx)))
    }

    async fn start_reconciliation(
        &self,
        request: Request<pb::StartReconciliationRequest>,
    ) -> Result<Response<pb::Reconciliation>, Status> {
        let req = request.into_inner();
        let account_id = parse_uuid(&req.account_id)?;
        let statement_date = parse_date(&req.statement_date, "statement_date")?;

        let reconciliation = self
            .banking
            .start_reconciliation(
                account_id,
                statement_date,
                Money::from_cents(req.statement_balance),
            )
            .await
            .map_err(Status::from)?;
        Ok(Response::new(reconciliation_to_proto(&reconciliation)))
    }

    async fn finish_reconciliation(
        &self,
        request: Request<pb::IdRequest>,
    ) -> Result<Response<pb::Reconciliation>, Status> {
        let id = parse_uuid(&request.into_inner().id)?;

        let reconciliation = self
            .banking
            .finish_reconciliation(id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(reconciliation_to_proto(&reconciliation)))
    }

    async fn list_reconciliations(
        &self,
        request: Request<pb::ListReconciliationsRequest>,
    ) -> Result<Response<pb::ListReconciliationsResponse>, Status> {
        let account_id = parse_opt_uuid(Some(request.into_inner().account_id))?;

        let reconciliations = self
            .banking
            .list_reconciliations(account_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::ListReconciliationsResponse {
            reconciliations: reconciliations.iter().map(reconciliation_to_proto).collect(),
        }))
    }

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    async fn get_trial_balance(
        &self,
        request: Request<pb::AsOfRequest>,
    ) -> Result<Response<pb::TrialBalance>, Status> {
        let as_of = parse_opt_date(request.into_inner().as_of, "as_of")?;

        let report = self
            .reports
            .trial_balance(as_of)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(trial_balance_to_proto(&report)))
    }

    async fn get_profit_and_loss(
        &self,
        request: Request<pb::DateRangeRequest>,
    ) -> Result<Response<pb::ProfitAndLoss>, Status> {
        let req = request.into_inner();
        let start = parse_opt_date(req.start_date, "start_date")?;
        let end = parse_opt_date(req.end_date, "end_date")?;

        let report = self
            .reports
            .profit_and_loss(start, end, today())
            .await
            .map_err(Status::from)?;
        Ok(Response::new(profit_and_loss_to_proto(&report)))
    }

    async fn get_balance_sheet(
        &self,
        request: Request<pb::AsOfRequest>,
    ) -> Result<Response<pb::BalanceSheet>, Status> {
        let as_of = parse_opt_date(request.into_inner().as_of, "as_of")?.unwrap_or_else(today);

        let report = self
            .reports
            .balance_sheet(as_of)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(balance_sheet_to_proto(&report)))
    }

    async fn get_monthly_profit_and_loss(
        &self,
        request: Request<pb::YearRequest>,
    ) -> Result<Response<pb::MonthlyProfitAndLossResponse>, Status> {
        let year = request.into_inner().year.unwrap_or_else(|| today().year());

        let months = self
            .reports
            .monthly_profit_and_loss(year)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::MonthlyProfitAndLossResponse {
            year,
            months: months.iter().map(monthly_profit_and_loss_to_proto).collect(),
        }))
    }

    async fn get_monthly_balance_sheet(
        &self,
        request: Request<pb::YearRequest>,
    ) -> Result<Response<pb::MonthlyBalanceSheetResponse>, Status> {
        let year = request.into_inner().year.unwrap_or_else(|| today().year());

        let months = self
            .reports
            .monthly_balances(year)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::MonthlyBalanceSheetResponse {
            year,
            months: months.iter().map(monthly_balance_to_proto).collect(),
        }))
    }

    async fn get_aging_report(
        &self,
        request: Request<pb::AgingRequest>,
    ) -> Result<Response<pb::AgingReport>, Status> {
        let req = request.into_inner();
        let kind: AgingKind = parse_label(&req.kind)?;
        let as_of = parse_opt_date(req.as_of, "as_of")?.unwrap_or_else(today);

        let report = self
            .reports
            .aging(kind, as_of)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(aging_report_to_proto(&report)))
    }

    async fn get_dashboard(
        &self,
        request: Request<pb::DashboardRequest>,
    ) -> Result<Response<pb::Dashboard>, Status> {
        let period = request.into_inner().period.unwrap_or_default();
        let period = ReportPeriod::parse_or_default(&period);

        let dashboard = self
            .reports
            .dashboard(period, today())
            .await
            .map_err(Status::from)?;
        Ok(Response::new(dashboard_to_proto(&dashboard)))
    }

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    async fn rejournalize(
        &self,
        request: Request<pb::RejournalizeRequest>,
    ) -> Result<Response<pb::RejournalizeReport>, Status> {
        let dry_run = request.into_inner().dry_run;

        let report = self
            .maintenance
            .rejournalize(dry_run)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(rejournalize_report_to_proto(&report)))
    }
}
