//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::clients::{
    AccountView, ImportSummary, MonthlyBalanceReport, MonthlyProfitAndLossReport, PartyBalance,
    RuleRunSummary, WorkspaceView,
};
use crate::handlers::account_handler::{CreateAccountRequest, CreatePartyRequest};
use crate::handlers::bank_handler::{
    ApplyRulesRequest, BankRuleRequest, CategorizeRequest, DeleteResponse,
    ImportBankTransactionsRequest, ImportedRowRequest, RuleConditionRequest,
    SetReconciledRequest, StatementRequest,
};
use crate::handlers::course_handler::{BulkStatusRequest, CreateCourseRequest, UpdateStatusRequest};
use crate::handlers::health_handler::{HealthResponse, ServiceHealth, ServiceStatus};
use crate::handlers::journal_handler::{
    CreateJournalEntryRequest, JournalLineRequest, ReverseJournalEntryRequest,
};
use crate::handlers::maintenance_handler::RejournalizeRequest;
use crate::handlers::purchase_handler::{
    CreateBillRequest, CreateExpenseRequest, CreateTransferRequest, PayBillRequest,
};
use crate::handlers::report_handler::ReportFormat;
use crate::handlers::sales_handler::{CreateInvoiceRequest, RecordPaymentRequest, VoidInvoiceRequest};
use domain::{
    Account, AccountType, AgingBucket, AgingKind, AgingReport, AgingRow, BalanceSheet, BankRule,
    BankTransaction, BankTransactionStatus, Bill, BillPayment, BillStatus, BucketTotals,
    BulkStatusOutcome, Course, CourseStats, CourseStatus, Customer, Dashboard, Expense,
    ExpenseType, Invoice, InvoiceStatus, JournalEntry, JournalLine, Metric, MonthlyBalance,
    MonthlyProfitAndLoss, PayeeType, Payment, ProfitAndLoss, RebuildCounts, Reconciliation,
    ReconciliationStatus, ReconciliationWorkspace, RejournalizeReport, ReportRow, RuleCondition,
    RuleField, RuleOperator, SourceType, Supplier, Transfer, Trend, TrendDirection, TrialBalance,
    TrialBalanceRow,
};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::health_check,
        crate::handlers::account_handler::list_accounts,
        crate::handlers::account_handler::create_account,
        crate::handlers::account_handler::get_account,
        crate::handlers::account_handler::deactivate_account,
        crate::handlers::account_handler::list_customers,
        crate::handlers::account_handler::create_customer,
        crate::handlers::account_handler::customer_balance,
        crate::handlers::account_handler::list_suppliers,
        crate::handlers::account_handler::create_supplier,
        crate::handlers::account_handler::supplier_balance,
        crate::handlers::sales_handler::list_invoices,
        crate::handlers::sales_handler::create_invoice,
        crate::handlers::sales_handler::get_invoice,
        crate::handlers::sales_handler::send_invoice,
        crate::handlers::sales_handler::void_invoice,
        crate::handlers::sales_handler::list_payments,
        crate::handlers::sales_handler::record_payment,
        crate::handlers::purchase_handler::list_expenses,
        crate::handlers::purchase_handler::create_expense,
        crate::handlers::purchase_handler::list_bills,
        crate::handlers::purchase_handler::create_bill,
        crate::handlers::purchase_handler::pay_bill,
        crate::handlers::purchase_handler::list_transfers,
        crate::handlers::purchase_handler::create_transfer,
        crate::handlers::journal_handler::list_journal_entries,
        crate::handlers::journal_handler::create_journal_entry,
        crate::handlers::journal_handler::get_journal_entry,
        crate::handlers::journal_handler::reverse_journal_entry,
        crate::handlers::bank_handler::list_bank_transactions,
        crate::handlers::bank_handler::import_bank_transactions,
        crate::handlers::bank_handler::categorize_bank_transaction,
        crate::handlers::bank_handler::exclude_bank_transaction,
        crate::handlers::bank_handler::set_reconciled,
        crate::handlers::bank_handler::apply_bank_rules,
        crate::handlers::bank_handler::list_bank_rules,
        crate::handlers::bank_handler::create_bank_rule,
        crate::handlers::bank_handler::update_bank_rule,
        crate::handlers::bank_handler::delete_bank_rule,
        crate::handlers::bank_handler::reconciliation_workspace,
        crate::handlers::bank_handler::list_reconciliations,
        crate::handlers::bank_handler::start_reconciliation,
        crate::handlers::bank_handler::finish_reconciliation,
        crate::handlers::report_handler::trial_balance,
        crate::handlers::report_handler::profit_and_loss,
        crate::handlers::report_handler::balance_sheet,
        crate::handlers::report_handler::monthly_profit_and_loss,
        crate::handlers::report_handler::monthly_balance_sheet,
        crate::handlers::report_handler::aging_report,
        crate::handlers::report_handler::dashboard,
        crate::handlers::maintenance_handler::rejournalize,
        crate::handlers::course_handler::list_courses,
        crate::handlers::course_handler::create_course,
        crate::handlers::course_handler::get_course,
        crate::handlers::course_handler::course_stats,
        crate::handlers::course_handler::update_status,
        crate::handlers::course_handler::bulk_update_status,
    ),
    components(
        schemas(
            // Requests
            CreateAccountRequest,
            CreatePartyRequest,
            CreateInvoiceRequest,
            VoidInvoiceRequest,
            RecordPaymentRequest,
            CreateExpenseRequest,
            CreateBillRequest,
            PayBillRequest,
            CreateTransferRequest,
            JournalLineRequest,
            CreateJournalEntryRequest,
            ReverseJournalEntryRequest,
            ImportedRowRequest,
            ImportBankTransactionsRequest,
            CategorizeRequest,
            SetReconciledRequest,
            ApplyRulesRequest,
            RuleConditionRequest,
            BankRuleRequest,
            StatementRequest,
            RejournalizeRequest,
            CreateCourseRequest,
            UpdateStatusRequest,
            BulkStatusRequest,
            ReportFormat,
            // Responses
            HealthResponse,
            ServiceStatus,
            ServiceHealth,
            AccountView,
            PartyBalance,
            ImportSummary,
            RuleRunSummary,
            WorkspaceView,
            DeleteResponse,
            MonthlyProfitAndLossReport,
            MonthlyBalanceReport,
            // Domain
            Account,
            AccountType,
            Customer,
            Supplier,
            Invoice,
            InvoiceStatus,
            Payment,
            Expense,
            ExpenseType,
            PayeeType,
            Bill,
            BillStatus,
            BillPayment,
            Transfer,
            JournalEntry,
            JournalLine,
            SourceType,
            BankTransaction,
            BankTransactionStatus,
            BankRule,
            RuleCondition,
            RuleField,
            RuleOperator,
            Reconciliation,
            ReconciliationStatus,
            ReconciliationWorkspace,
            TrialBalance,
            TrialBalanceRow,
            ReportRow,
            ProfitAndLoss,
            BalanceSheet,
            MonthlyProfitAndLoss,
            MonthlyBalance,
            AgingKind,
            AgingBucket,
            AgingReport,
            AgingRow,
            BucketTotals,
            Dashboard,
            Metric,
            Trend,
            TrendDirection,
            RejournalizeReport,
            RebuildCounts,
            Course,
            CourseStatus,
            CourseStats,
            BulkStatusOutcome,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Dependency health"),
        (name = "Accounts", description = "Chart of accounts"),
        (name = "Customers", description = "Customer records and balances"),
        (name = "Suppliers", description = "Supplier records and balances"),
        (name = "Invoices", description = "Invoices and customer payments"),
        (name = "Purchases", description = "Expenses, bills and transfers"),
        (name = "Journal", description = "Journal entries"),
        (name = "Banking", description = "Bank feed and bank rules"),
        (name = "Reconciliation", description = "Statement reconciliation"),
        (name = "Reports", description = "Financial reports and dashboard"),
        (name = "Maintenance", description = "Ledger maintenance (admin only)"),
        (name = "Courses", description = "Course catalogue and publishing"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_bearer_scheme_and_routes() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(doc.paths.paths.contains_key("/journal-entries/{id}/reverse"));
        assert!(doc.paths.paths.contains_key("/reports/aging/{kind}"));
    }
}
