//! Conversions between ledger protobuf messages and domain types.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use tonic::Status;
use uuid::Uuid;

use common::AppError;
use domain::{DomainError, Money};
use proto::ledger as pb;

use crate::service::AccountBalance;

// =============================================================================
// Request parsing
// =============================================================================

/// Parse UUID from string.
pub fn parse_uuid(s: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(s).map_err(|_| Status::invalid_argument("Invalid UUID format"))
}

/// Optional id. Absent and empty strings both mean "none".
pub fn parse_opt_uuid(s: Option<String>) -> Result<Option<Uuid>, Status> {
    non_empty(s).map(|s| parse_uuid(&s)).transpose()
}

pub fn parse_date(s: &str, field: &str) -> Result<NaiveDate, Status> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Status::invalid_argument(format!("Invalid {}: expected YYYY-MM-DD", field)))
}

pub fn parse_opt_date(s: Option<String>, field: &str) -> Result<Option<NaiveDate>, Status> {
    non_empty(s).map(|s| parse_date(&s, field)).transpose()
}

/// Parse a wire label (account type, status, ...) into its domain enum.
pub fn parse_label<T>(s: &str) -> Result<T, Status>
where
    T: FromStr<Err = DomainError>,
{
    s.parse::<T>().map_err(|e| Status::from(AppError::from(e)))
}

pub fn parse_opt_label<T>(s: Option<String>) -> Result<Option<T>, Status>
where
    T: FromStr<Err = DomainError>,
{
    non_empty(s).map(|s| parse_label(&s)).transpose()
}

pub fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

fn date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339()
}

fn opt_id(id: Option<Uuid>) -> Option<String> {
    id.map(|id| id.to_string())
}

// =============================================================================
// Requests to domain inputs
// =============================================================================

pub fn new_account(req: pb::CreateAccountRequest) -> Result<domain::NewAccount, Status> {
    Ok(domain::NewAccount {
        name: req.name,
        account_type: parse_label(&req.account_type)?,
        detail_type: non_empty(req.detail_type),
        description: non_empty(req.description),
        account_number: non_empty(req.account_number),
    })
}

pub fn new_party(req: pb::CreatePartyRequest) -> domain::NewParty {
    domain::NewParty {
        display_name: req.display_name,
        company: non_empty(req.company),
        email: non_empty(req.email),
        phone: non_empty(req.phone),
        tax_id: non_empty(req.tax_id),
    }
}

pub fn new_invoice(req: pb::CreateInvoiceRequest) -> Result<domain::NewInvoice, Status> {
    Ok(domain::NewInvoice {
        invoice_number: req.invoice_number,
        customer_id: parse_uuid(&req.customer_id)?,
        invoice_date: parse_date(&req.invoice_date, "invoice_date")?,
        due_date: parse_opt_date(req.due_date, "due_date")?,
        subtotal: Money::from_cents(req.subtotal),
        tax_amount: Money::from_cents(req.tax_amount),
        status: parse_opt_label(req.status)?,
        notes: non_empty(req.notes),
    })
}

pub fn new_payment(req: pb::RecordPaymentRequest) -> Result<domain::NewPayment, Status> {
    Ok(domain::NewPayment {
        invoice_id: parse_uuid(&req.invoice_id)?,
        payment_date: parse_date(&req.payment_date, "payment_date")?,
        amount: Money::from_cents(req.amount),
        payment_method: non_empty(req.payment_method),
        reference_number: non_empty(req.reference_number),
        deposit_to_account_id: parse_opt_uuid(req.deposit_to_account_id)?,
        memo: non_empty(req.memo),
    })
}

pub fn new_expense(req: pb::CreateExpenseRequest) -> Result<domain::NewExpense, Status> {
    Ok(domain::NewExpense {
        expense_type: parse_opt_label(req.expense_type)?,
        payee_type: parse_opt_label(req.payee_type)?,
        payee_id: parse_opt_uuid(req.payee_id)?,
        payee_name: non_empty(req.payee_name),
        account_id: parse_opt_uuid(req.account_id)?,
        payment_account_id: parse_opt_uuid(req.payment_account_id)?,
        expense_date: parse_date(&req.expense_date, "expense_date")?,
        subtotal: Money::from_cents(req.subtotal),
        tax_amount: Money::from_cents(req.tax_amount),
        memo: non_empty(req.memo),
    })
}

pub fn new_bill(req: pb::CreateBillRequest) -> Result<domain::NewBill, Status> {
    Ok(domain::NewBill {
        bill_number: non_empty(req.bill_number),
        supplier_id: parse_uuid(&req.supplier_id)?,
        account_id: parse_opt_uuid(req.account_id)?,
        bill_date: parse_date(&req.bill_date, "bill_date")?,
        due_date: parse_opt_date(req.due_date, "due_date")?,
        subtotal: Money::from_cents(req.subtotal),
        tax_amount: Money::from_cents(req.tax_amount),
        memo: non_empty(req.memo),
    })
}

pub fn new_bill_payment(req: pb::PayBillRequest) -> Result<domain::NewBillPayment, Status> {
    Ok(domain::NewBillPayment {
        bill_id: parse_uuid(&req.bill_id)?,
        payment_account_id: parse_uuid(&req.payment_account_id)?,
        amount: Money::from_cents(req.amount),
        payment_date: parse_date(&req.payment_date, "payment_date")?,
    })
}

pub fn new_transfer(req: pb::CreateTransferRequest) -> Result<domain::NewTransfer, Status> {
    Ok(domain::NewTransfer {
        from_account_id: parse_uuid(&req.from_account_id)?,
        to_account_id: parse_uuid(&req.to_account_id)?,
        amount: Money::from_cents(req.amount),
        transfer_date: parse_date(&req.transfer_date, "transfer_date")?,
        memo: non_empty(req.memo),
    })
}

pub fn new_journal_entry(
    req: pb::CreateJournalEntryRequest,
) -> Result<domain::NewJournalEntry, Status> {
    let lines = req
        .lines
        .into_iter()
        .map(journal_line_from_proto)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(domain::NewJournalEntry {
        entry_date: parse_date(&req.entry_date, "entry_date")?,
        memo: non_empty(req.memo),
        is_adjusting: req.is_adjusting,
        source: None,
        reversed_entry_id: None,
        lines,
    })
}

fn journal_line_from_proto(line: pb::JournalLine) -> Result<domain::JournalLine, Status> {
    Ok(domain::JournalLine {
        account_id: parse_uuid(&line.account_id)?,
        debit: Money::from_cents(line.debit),
        credit: Money::from_cents(line.credit),
        description: non_empty(line.description),
        customer_id: parse_opt_uuid(line.customer_id)?,
        supplier_id: parse_opt_uuid(line.supplier_id)?,
    })
}

pub fn imported_row(row: pb::ImportedRow) -> Result<domain::ImportedTransaction, Status> {
    Ok(domain::ImportedTransaction {
        transaction_date: parse_date(&row.transaction_date, "transaction_date")?,
        description: row.description,
        amount: Money::from_cents(row.amount),
        fit_id: non_empty(row.fit_id),
    })
}

pub fn new_bank_rule(input: pb::BankRuleInput) -> Result<domain::NewBankRule, Status> {
    let conditions = input
        .conditions
        .into_iter()
        .map(|c| {
            Ok(domain::RuleCondition {
                field: parse_label(&c.field)?,
                operator: domain::RuleOperator::from_label(&c.operator),
                value: c.value,
            })
        })
        .collect::<Result<Vec<_>, Status>>()?;

    Ok(domain::NewBankRule {
        name: input.name,
        priority: input.priority,
        conditions,
        assign_account_id: parse_opt_uuid(input.assign_account_id)?,
        assign_category: non_empty(input.assign_category),
        assign_payee: non_empty(input.assign_payee),
        auto_confirm: input.auto_confirm,
        is_active: input.is_active,
    })
}

// =============================================================================
// Domain outputs to messages
// =============================================================================

pub fn account_to_proto(item: &AccountBalance) -> pb::Account {
    let account = &item.account;
    pb::Account {
        id: account.id.to_string(),
        name: account.name.clone(),
        account_type: account.account_type.to_string(),
        detail_type: account.detail_type.clone(),
        description: account.description.clone(),
        account_number: account.account_number.clone(),
        is_active: account.is_active,
        balance: item.balance.cents(),
        created_at: timestamp(account.created_at),
        updated_at: timestamp(account.updated_at),
    }
}

pub fn customer_to_proto(customer: &domain::Customer) -> pb::Party {
    pb::Party {
        id: customer.id.to_string(),
        display_name: customer.display_name.clone(),
        company: customer.company.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
        tax_id: None,
        is_active: customer.is_active,
        created_at: timestamp(customer.created_at),
    }
}

pub fn supplier_to_proto(supplier: &domain::Supplier) -> pb::Party {
    pb::Party {
        id: supplier.id.to_string(),
        display_name: supplier.display_name.clone(),
        company: supplier.company.clone(),
        email: supplier.email.clone(),
        phone: supplier.phone.clone(),
        tax_id: supplier.tax_id.clone(),
        is_active: supplier.is_active,
        created_at: timestamp(supplier.created_at),
    }
}

pub fn invoice_to_proto(invoice: &domain::Invoice) -> pb::Invoice {
    pb::Invoice {
        id: invoice.id.to_string(),
        invoice_number: invoice.invoice_number.clone(),
        customer_id: invoice.customer_id.to_string(),
        invoice_date: date(invoice.invoice_date),
        due_date: invoice.due_date.map(date),
        subtotal: invoice.subtotal.cents(),
        tax_amount: invoice.tax_amount.cents(),
        total: invoice.total.cents(),
        amount_paid: invoice.amount_paid.cents(),
        amount_due: invoice.amount_due.cents(),
        status: invoice.status.to_string(),
        notes: invoice.notes.clone(),
        created_at: timestamp(invoice.created_at),
        updated_at: timestamp(invoice.updated_at),
    }
}

pub fn payment_to_proto(payment: &domain::Payment) -> pb::Payment {
    pb::Payment {
        id: payment.id.to_string(),
        customer_id: payment.customer_id.to_string(),
        payment_date: date(payment.payment_date),
        amount: payment.amount.cents(),
        payment_method: payment.payment_method.clone(),
        reference_number: payment.reference_number.clone(),
        deposit_to_account_id: opt_id(payment.deposit_to_account_id),
        memo: payment.memo.clone(),
        created_at: timestamp(payment.created_at),
    }
}

pub fn expense_to_proto(expense: &domain::Expense) -> pb::Expense {
    pb::Expense {
        id: expense.id.to_string(),
        expense_type: expense.expense_type.to_string(),
        payee_type: expense.payee_type.to_string(),
        payee_id: opt_id(expense.payee_id),
        payee_name: expense.payee_name.clone(),
        account_id: opt_id(expense.account_id),
        payment_account_id: opt_id(expense.payment_account_id),
        expense_date: date(expense.expense_date),
        subtotal: expense.subtotal.cents(),
        tax_amount: expense.tax_amount.cents(),
        total: expense.total.cents(),
        memo: expense.memo.clone(),
        created_at: timestamp(expense.created_at),
    }
}

pub fn bill_to_proto(bill: &domain::Bill) -> pb::Bill {
    pb::Bill {
        id: bill.id.to_string(),
        bill_number: bill.bill_number.clone(),
        supplier_id: bill.supplier_id.to_string(),
        account_id: opt_id(bill.account_id),
        bill_date: date(bill.bill_date),
        due_date: bill.due_date.map(date),
        subtotal: bill.subtotal.cents(),
        tax_amount: bill.tax_amount.cents(),
        total: bill.total.cents(),
        amount_paid: bill.amount_paid.cents(),
        amount_due: bill.amount_due.cents(),
        status: bill.status.to_string(),
        memo: bill.memo.clone(),
        created_at: timestamp(bill.created_at),
        updated_at: timestamp(bill.updated_at),
    }
}

pub fn bill_payment_to_proto(payment: &domain::BillPayment) -> pb::BillPayment {
    pb::BillPayment {
        id: payment.id.to_string(),
        bill_id: payment.bill_id.to_string(),
        supplier_id: payment.supplier_id.to_string(),
        payment_account_id: payment.payment_account_id.to_string(),
        amount: payment.amount.cents(),
        payment_date: date(payment.payment_date),
        bill_reference: payment.bill_reference.clone(),
        created_at: timestamp(payment.created_at),
    }
}

pub fn transfer_to_proto(transfer: &domain::Transfer) -> pb::Transfer {
    pb::Transfer {
        id: transfer.id.to_string(),
        from_account_id: transfer.from_account_id.to_string(),
        to_account_id: transfer.to_account_id.to_string(),
        amount: transfer.amount.cents(),
        transfer_date: date(transfer.transfer_date),
        memo: transfer.memo.clone(),
        created_at: timestamp(transfer.created_at),
    }
}

pub fn journal_entry_to_proto(entry: &domain::JournalEntry) -> pb::JournalEntry {
    pb::JournalEntry {
        id: entry.id.to_string(),
        entry_number: entry.entry_number.clone(),
        entry_date: date(entry.entry_date),
        memo: entry.memo.clone(),
        is_adjusting: entry.is_adjusting,
        source_type: entry.source.map(|s| s.kind.to_string()),
        source_id: entry.source.map(|s| s.id.to_string()),
        reversed_entry_id: opt_id(entry.reversed_entry_id),
        lines: entry
            .lines
            .iter()
            .map(|line| pb::JournalLine {
                account_id: line.account_id.to_string(),
                debit: line.debit.cents(),
                credit: line.credit.cents(),
                description: line.description.clone(),
                customer_id: opt_id(line.customer_id),
                supplier_id: opt_id(line.supplier_id),
            })
            .collect(),
        created_at: timestamp(entry.created_at),
    }
}

pub fn bank_transaction_to_proto(tx: &domain::BankTransaction) -> pb::BankTransaction {
    pb::BankTransaction {
        id: tx.id.to_string(),
        account_id: tx.account_id.to_string(),
        transaction_date: date(tx.transaction_date),
        description: tx.description.clone(),
        amount: tx.amount.cents(),
        fit_id: tx.fit_id.clone(),
        status: tx.status.to_string(),
        category_account_id: opt_id(tx.category_account_id),
        category: tx.category.clone(),
        payee: tx.payee.clone(),
        applied_rule_id: opt_id(tx.applied_rule_id),
        memo: tx.memo.clone(),
        is_reconciled: tx.is_reconciled,
        created_at: timestamp(tx.created_at),
    }
}

pub fn bank_rule_to_proto(rule: &domain::BankRule) -> pb::BankRule {
    pb::BankRule {
        id: rule.id.to_string(),
        name: rule.name.clone(),
        priority: rule.priority,
        conditions: rule
            .conditions
            .iter()
            .map(|c| pb::RuleCondition {
                field: c.field.as_str().to_string(),
                operator: c.operator.as_str().to_string(),
                value: c.value.clone(),
            })
            .collect(),
        assign_account_id: opt_id(rule.assign_account_id),
        assign_category: rule.assign_category.clone(),
        assign_payee: rule.assign_payee.clone(),
        auto_confirm: rule.auto_confirm,
        is_active: rule.is_active,
        created_at: timestamp(rule.created_at),
        updated_at: timestamp(rule.updated_at),
    }
}

pub fn workspace_to_proto(ws: &domain::ReconciliationWorkspace) -> pb::ReconciliationWorkspace {
    pb::ReconciliationWorkspace {
        account_id: ws.account_id.to_string(),
        statement_date: date(ws.statement_date),
        statement_balance: ws.statement_balance.cents(),
        cleared: ws.cleared.iter().map(bank_transaction_to_proto).collect(),
        uncleared: ws.uncleared.iter().map(bank_transaction_to_proto).collect(),
        cleared_total: ws.cleared_total.cents(),
        uncleared_total: ws.uncleared_total.cents(),
        difference: ws.difference().cents(),
        can_finish: ws.can_finish(),
    }
}

pub fn reconciliation_to_proto(rec: &domain::Reconciliation) -> pb::Reconciliation {
    pb::Reconciliation {
        id: rec.id.to_string(),
        account_id: rec.account_id.to_string(),
        statement_date: date(rec.statement_date),
        statement_balance: rec.statement_balance.cents(),
        cleared_balance: rec.cleared_balance.cents(),
        difference: rec.difference.cents(),
        status: rec.status.to_string(),
        completed_at: rec.completed_at.map(timestamp),
        created_at: timestamp(rec.created_at),
    }
}

pub fn trial_balance_to_proto(tb: &domain::TrialBalance) -> pb::TrialBalance {
    pb::TrialBalance {
        rows: tb
            .rows
            .iter()
            .map(|row| pb::TrialBalanceRow {
                account_id: row.account_id.to_string(),
                account_name: row.account_name.clone(),
                account_type: row.account_type.to_string(),
                debit: row.debit.cents(),
                credit: row.credit.cents(),
                balance: row.balance.cents(),
            })
            .collect(),
        total_debits: tb.total_debits.cents(),
        total_credits: tb.total_credits.cents(),
        balanced: tb.balanced,
    }
}

fn report_rows(rows: &[domain::ReportRow]) -> Vec<pb::ReportRow> {
    rows.iter()
        .map(|row| pb::ReportRow {
            account_id: opt_id(row.account_id),
            account_name: row.account_name.clone(),
            account_type: row.account_type.to_string(),
            amount: row.amount.cents(),
        })
        .collect()
}

pub fn profit_and_loss_to_proto(pl: &domain::ProfitAndLoss) -> pb::ProfitAndLoss {
    pb::ProfitAndLoss {
        start_date: date(pl.start_date),
        end_date: date(pl.end_date),
        income: report_rows(&pl.income),
        expenses: report_rows(&pl.expenses),
        total_income: pl.total_income.cents(),
        total_expenses: pl.total_expenses.cents(),
        net_income: pl.net_income.cents(),
    }
}

pub fn balance_sheet_to_proto(bs: &domain::BalanceSheet) -> pb::BalanceSheet {
    pb::BalanceSheet {
        as_of: date(bs.as_of),
        assets: report_rows(&bs.assets),
        liabilities: report_rows(&bs.liabilities),
        equity: report_rows(&bs.equity),
        total_assets: bs.total_assets.cents(),
        total_liabilities: bs.total_liabilities.cents(),
        total_equity: bs.total_equity.cents(),
        total_liabilities_and_equity: bs.total_liabilities_and_equity.cents(),
        balanced: bs.balanced,
    }
}

pub fn monthly_profit_and_loss_to_proto(m: &domain::MonthlyProfitAndLoss) -> pb::MonthlyProfitAndLoss {
    pb::MonthlyProfitAndLoss {
        month: m.month,
        month_name: m.month_name.clone(),
        income: m.income.cents(),
        expenses: m.expenses.cents(),
        net_profit: m.net_profit.cents(),
    }
}

pub fn monthly_balance_to_proto(m: &domain::MonthlyBalance) -> pb::MonthlyBalance {
    pb::MonthlyBalance {
        month: m.month,
        month_name: m.month_name.clone(),
        assets: m.assets.cents(),
        liabilities: m.liabilities.cents(),
        equity: m.equity.cents(),
    }
}

fn bucket_totals(b: &domain::BucketTotals) -> pb::BucketTotals {
    pb::BucketTotals {
        current: b.current.cents(),
        days_1_30: b.days_1_30.cents(),
        days_31_60: b.days_31_60.cents(),
        days_61_90: b.days_61_90.cents(),
        over_90: b.over_90.cents(),
        total: b.total.cents(),
    }
}

pub fn aging_report_to_proto(report: &domain::AgingReport) -> pb::AgingReport {
    pb::AgingReport {
        as_of: date(report.as_of),
        rows: report
            .rows
            .iter()
            .map(|row| pb::AgingRow {
                party_id: row.party_id.to_string(),
                name: row.name.clone(),
                buckets: Some(bucket_totals(&row.buckets)),
            })
            .collect(),
        totals: Some(bucket_totals(&report.totals)),
    }
}

fn metric(m: &domain::Metric) -> pb::Metric {
    pb::Metric {
        value: m.value.cents(),
        trend: Some(pb::Trend {
            direction: m.trend.direction.as_str().to_string(),
            pct: m.trend.pct.clone(),
        }),
    }
}

pub fn dashboard_to_proto(d: &domain::Dashboard) -> pb::Dashboard {
    pb::Dashboard {
        period: d.period.as_str().to_string(),
        start_date: date(d.start_date),
        end_date: date(d.end_date),
        revenue: Some(metric(&d.revenue)),
        expenses: Some(metric(&d.expenses)),
        net_profit: Some(metric(&d.net_profit)),
        open_receivables: d.open_receivables.cents(),
        open_payables: d.open_payables.cents(),
        bank_balance: d.bank_balance.cents(),
        transactions_for_review: u32::try_from(d.transactions_for_review).unwrap_or(u32::MAX),
    }
}

pub fn rejournalize_report_to_proto(r: &domain::RejournalizeReport) -> pb::RejournalizeReport {
    let c = &r.counts;
    pb::RejournalizeReport {
        dry_run: r.dry_run,
        invoices: c.invoices,
        expenses: c.expenses,
        payments: c.payments,
        bills: c.bills,
        bill_payments: c.bill_payments,
        transfers: c.transfers,
        duplicates_removed: c.duplicates_removed,
        accounts_assigned: c.accounts_assigned,
        entries: c.entries(),
        total_debits: r.total_debits.cents(),
        total_credits: r.total_credits.cents(),
        balanced: r.balanced(),
        net_income: r.net_income.cents(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{AccountType, InvoiceStatus, RuleField, RuleOperator};

    #[test]
    fn test_empty_optional_id_is_none() {
        assert_eq!(parse_opt_uuid(Some(String::new())).unwrap(), None);
        assert_eq!(parse_opt_uuid(None).unwrap(), None);
        assert!(parse_opt_uuid(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_parse_label_maps_to_invalid_argument() {
        let ok: AccountType = parse_label("Accounts Receivable").unwrap();
        assert_eq!(ok, AccountType::AccountsReceivable);

        let err = parse_label::<InvoiceStatus>("Lost").unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }

    #[test]
    fn test_bad_date_names_the_field() {
        let err = parse_date("15/08/2025", "invoice_date").unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
        assert!(err.message().contains("invoice_date"));
    }

    #[test]
    fn test_rule_input_keeps_unknown_operator() {
        let rule = new_bank_rule(pb::BankRuleInput {
            name: "Coffee".to_string(),
            priority: 1,
            conditions: vec![pb::RuleCondition {
                field: "description".to_string(),
                operator: "regex".to_string(),
                value: "coffee".to_string(),
            }],
            assign_account_id: Some(String::new()),
            assign_category: None,
            assign_payee: None,
            auto_confirm: false,
            is_active: true,
        })
        .unwrap();

        assert_eq!(rule.conditions[0].field, RuleField::Description);
        assert_eq!(rule.conditions[0].operator, RuleOperator::Unknown);
        assert_eq!(rule.assign_account_id, None);
    }

    #[test]
    fn test_manual_entry_never_carries_a_source() {
        let entry = new_journal_entry(pb::CreateJournalEntryRequest {
            entry_date: "2025-03-01".to_string(),
            memo: Some("Accrual".to_string()),
            is_adjusting: true,
            lines: vec![],
        })
        .unwrap();

        assert!(entry.source.is_none());
        assert!(entry.reversed_entry_id.is_none());
        assert!(entry.is_adjusting);
    }
}
