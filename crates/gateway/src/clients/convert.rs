//! Ledger protobuf messages back into domain types.
//!
//! A malformed field here means ledger-service sent something it should not
//! have, so every failure is an internal error naming the field.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{
    Account, AgingReport, AgingRow, BalanceSheet, BankRule, BankTransaction, Bill, BillPayment,
    BucketTotals, Customer, Dashboard, DomainError, Expense, Invoice, JournalEntry, JournalLine,
    Metric, Money, MonthlyBalance, MonthlyProfitAndLoss, Payment, ProfitAndLoss, RebuildCounts,
    Reconciliation, ReconciliationWorkspace, RejournalizeReport, ReportPeriod, ReportRow,
    RuleCondition, RuleOperator, SourceRef, Supplier, Transfer, Trend, TrendDirection,
    TrialBalance, TrialBalanceRow,
};
use proto::ledger as pb;

use super::ledger_client::{AccountView, PartyBalance, WorkspaceView};

fn invalid(field: &str) -> AppError {
    AppError::internal(format!("Invalid {} from ledger-service", field))
}

fn uuid(s: &str, field: &str) -> AppResult<Uuid> {
    s.parse().map_err(|_| invalid(field))
}

fn opt_uuid(s: Option<String>, field: &str) -> AppResult<Option<Uuid>> {
    s.filter(|v| !v.is_empty())
        .map(|v| uuid(&v, field))
        .transpose()
}

fn date(s: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid(field))
}

fn opt_date(s: Option<String>, field: &str) -> AppResult<Option<NaiveDate>> {
    s.filter(|v| !v.is_empty())
        .map(|v| date(&v, field))
        .transpose()
}

fn timestamp(s: &str, field: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid(field))
}

fn label<T: FromStr<Err = DomainError>>(s: &str, field: &str) -> AppResult<T> {
    s.parse().map_err(|_| invalid(field))
}

fn money(cents: i64) -> Money {
    Money::from_cents(cents)
}

fn collect<P, T>(items: Vec<P>, convert: fn(P) -> AppResult<T>) -> AppResult<Vec<T>> {
    items.into_iter().map(convert).collect()
}

// =============================================================================
// Accounts and parties
// =============================================================================

pub fn proto_to_account(proto: pb::Account) -> AppResult<AccountView> {
    Ok(AccountView {
        account: Account {
            id: uuid(&proto.id, "account id")?,
            name: proto.name,
            account_type: label(&proto.account_type, "account type")?,
            detail_type: proto.detail_type,
            description: proto.description,
            account_number: proto.account_number,
            is_active: proto.is_active,
            created_at: timestamp(&proto.created_at, "created_at")?,
            updated_at: timestamp(&proto.updated_at, "updated_at")?,
        },
        balance: money(proto.balance),
    })
}

pub fn proto_to_customer(proto: pb::Party) -> AppResult<Customer> {
    Ok(Customer {
        id: uuid(&proto.id, "customer id")?,
        display_name: proto.display_name,
        company: proto.company,
        email: proto.email,
        phone: proto.phone,
        is_active: proto.is_active,
        created_at: timestamp(&proto.created_at, "created_at")?,
    })
}

pub fn proto_to_supplier(proto: pb::Party) -> AppResult<Supplier> {
    Ok(Supplier {
        id: uuid(&proto.id, "supplier id")?,
        display_name: proto.display_name,
        company: proto.company,
        email: proto.email,
        phone: proto.phone,
        tax_id: proto.tax_id,
        is_active: proto.is_active,
        created_at: timestamp(&proto.created_at, "created_at")?,
    })
}

pub fn proto_to_party_balance(proto: pb::PartyBalance) -> AppResult<PartyBalance> {
    Ok(PartyBalance {
        id: uuid(&proto.id, "party id")?,
        balance: money(proto.balance),
    })
}

// =============================================================================
// Documents
// =============================================================================

pub fn proto_to_invoice(proto: pb::Invoice) -> AppResult<Invoice> {
    Ok(Invoice {
        id: uuid(&proto.id, "invoice id")?,
        invoice_number: proto.invoice_number,
        customer_id: uuid(&proto.customer_id, "customer id")?,
        invoice_date: date(&proto.invoice_date, "invoice_date")?,
        due_date: opt_date(proto.due_date, "due_date")?,
        subtotal: money(proto.subtotal),
        tax_amount: money(proto.tax_amount),
        total: money(proto.total),
        amount_paid: money(proto.amount_paid),
        amount_due: money(proto.amount_due),
        status: label(&proto.status, "invoice status")?,
        notes: proto.notes,
        created_at: timestamp(&proto.created_at, "created_at")?,
        updated_at: timestamp(&proto.updated_at, "updated_at")?,
    })
}

pub fn proto_to_payment(proto: pb::Payment) -> AppResult<Payment> {
    Ok(Payment {
        id: uuid(&proto.id, "payment id")?,
        customer_id: uuid(&proto.customer_id, "customer id")?,
        payment_date: date(&proto.payment_date, "payment_date")?,
        amount: money(proto.amount),
        payment_method: proto.payment_method,
        reference_number: proto.reference_number,
        deposit_to_account_id: opt_uuid(proto.deposit_to_account_id, "deposit account id")?,
        memo: proto.memo,
        created_at: timestamp(&proto.created_at, "created_at")?,
    })
}

pub fn proto_to_expense(proto: pb::Expense) -> AppResult<Expense> {
    Ok(Expense {
        id: uuid(&proto.id, "expense id")?,
        expense_type: label(&proto.expense_type, "expense type")?,
        payee_type: label(&proto.payee_type, "payee type")?,
        payee_id: opt_uuid(proto.payee_id, "payee id")?,
        payee_name: proto.payee_name,
        account_id: opt_uuid(proto.account_id, "account id")?,
        payment_account_id: opt_uuid(proto.payment_account_id, "payment account id")?,
        expense_date: date(&proto.expense_date, "expense_date")?,
        subtotal: money(proto.subtotal),
        tax_amount: money(proto.tax_amount),
        total: money(proto.total),
        memo: proto.memo,
        created_at: timestamp(&proto.created_at, "created_at")?,
    })
}

pub fn proto_to_bill(proto: pb::Bill) -> AppResult<Bill> {
    Ok(Bill {
        id: uuid(&proto.id, "bill id")?,
        bill_number: proto.bill_number,
        supplier_id: uuid(&proto.supplier_id, "supplier id")?,
        account_id: opt_uuid(proto.account_id, "account id")?,
        bill_date: date(&proto.bill_date, "bill_date")?,
        due_date: opt_date(proto.due_date, "due_date")?,
        subtotal: money(proto.subtotal),
        tax_amount: money(proto.tax_amount),
        total: money(proto.total),
        amount_paid: money(proto.amount_paid),
        amount_due: money(proto.amount_due),
        status: label(&proto.status, "bill status")?,
        memo: proto.memo,
        created_at: timestamp(&proto.created_at, "created_at")?,
        updated_at: timestamp(&proto.updated_at, "updated_at")?,
    })
}

pub fn proto_to_bill_payment(proto: pb::BillPayment) -> AppResult<BillPayment> {
    Ok(BillPayment {
        id: uuid(&proto.id, "bill payment id")?,
        bill_id: uuid(&proto.bill_id, "bill id")?,
        supplier_id: uuid(&proto.supplier_id, "supplier id")?,
        payment_account_id: uuid(&proto.payment_account_id, "payment account id")?,
        amount: money(proto.amount),
        payment_date: date(&proto.payment_date, "payment_date")?,
        bill_reference: proto.bill_reference,
        created_at: timestamp(&proto.created_at, "created_at")?,
    })
}

pub fn proto_to_transfer(proto: pb::Transfer) -> AppResult<Transfer> {
    Ok(Transfer {
        id: uuid(&proto.id, "transfer id")?,
        from_account_id: uuid(&proto.from_account_id, "from account id")?,
        to_account_id: uuid(&proto.to_account_id, "to account id")?,
        amount: money(proto.amount),
        transfer_date: date(&proto.transfer_date, "transfer_date")?,
        memo: proto.memo,
        created_at: timestamp(&proto.created_at, "created_at")?,
    })
}

// =============================================================================
// Journal
// =============================================================================

fn proto_to_journal_line(proto: pb::JournalLine) -> AppResult<JournalLine> {
    Ok(JournalLine {
        account_id: uuid(&proto.account_id, "line account id")?,
        debit: money(proto.debit),
        credit: money(proto.credit),
        description: proto.description,
        customer_id: opt_uuid(proto.customer_id, "line customer id")?,
        supplier_id: opt_uuid(proto.supplier_id, "line supplier id")?,
    })
}

pub fn proto_to_journal_entry(proto: pb::JournalEntry) -> AppResult<JournalEntry> {
    let source = match (proto.source_type, proto.source_id) {
        (Some(kind), Some(id)) if !kind.is_empty() => Some(SourceRef {
            kind: label(&kind, "source type")?,
            id: uuid(&id, "source id")?,
        }),
        _ => None,
    };

    Ok(JournalEntry {
        id: uuid(&proto.id, "entry id")?,
        entry_number: proto.entry_number,
        entry_date: date(&proto.entry_date, "entry_date")?,
        memo: proto.memo,
        is_adjusting: proto.is_adjusting,
        source,
        reversed_entry_id: opt_uuid(proto.reversed_entry_id, "reversed entry id")?,
        lines: collect(proto.lines, proto_to_journal_line)?,
        created_at: timestamp(&proto.created_at, "created_at")?,
    })
}

// =============================================================================
// Bank feed and reconciliation
// =============================================================================

pub fn proto_to_bank_transaction(proto: pb::BankTransaction) -> AppResult<BankTransaction> {
    Ok(BankTransaction {
        id: uuid(&proto.id, "transaction id")?,
        account_id: uuid(&proto.account_id, "account id")?,
        transaction_date: date(&proto.transaction_date, "transaction_date")?,
        description: proto.description,
        amount: money(proto.amount),
        fit_id: proto.fit_id,
        status: label(&proto.status, "transaction status")?,
        category_account_id: opt_uuid(proto.category_account_id, "category account id")?,
        category: proto.category,
        payee: proto.payee,
        applied_rule_id: opt_uuid(proto.applied_rule_id, "rule id")?,
        memo: proto.memo,
        is_reconciled: proto.is_reconciled,
        created_at: timestamp(&proto.created_at, "created_at")?,
    })
}

fn proto_to_condition(proto: pb::RuleCondition) -> AppResult<RuleCondition> {
    Ok(RuleCondition {
        field: label(&proto.field, "rule field")?,
        operator: RuleOperator::from_label(&proto.operator),
        value: proto.value,
    })
}

pub fn proto_to_bank_rule(proto: pb::BankRule) -> AppResult<BankRule> {
    Ok(BankRule {
        id: uuid(&proto.id, "rule id")?,
        name: proto.name,
        priority: proto.priority,
        conditions: collect(proto.conditions, proto_to_condition)?,
        assign_account_id: opt_uuid(proto.assign_account_id, "assign account id")?,
        assign_category: proto.assign_category,
        assign_payee: proto.assign_payee,
        auto_confirm: proto.auto_confirm,
        is_active: proto.is_active,
        created_at: timestamp(&proto.created_at, "created_at")?,
        updated_at: timestamp(&proto.updated_at, "updated_at")?,
    })
}

pub fn proto_to_workspace(proto: pb::ReconciliationWorkspace) -> AppResult<WorkspaceView> {
    Ok(WorkspaceView {
        workspace: ReconciliationWorkspace {
            account_id: uuid(&proto.account_id, "account id")?,
            statement_date: date(&proto.statement_date, "statement_date")?,
            statement_balance: money(proto.statement_balance),
            cleared: collect(proto.cleared, proto_to_bank_transaction)?,
            uncleared: collect(proto.uncleared, proto_to_bank_transaction)?,
            cleared_total: money(proto.cleared_total),
            uncleared_total: money(proto.uncleared_total),
        },
        difference: money(proto.difference),
        can_finish: proto.can_finish,
    })
}

pub fn proto_to_reconciliation(proto: pb::Reconciliation) -> AppResult<Reconciliation> {
    Ok(Reconciliation {
        id: uuid(&proto.id, "reconciliation id")?,
        account_id: uuid(&proto.account_id, "account id")?,
        statement_date: date(&proto.statement_date, "statement_date")?,
        statement_balance: money(proto.statement_balance),
        cleared_balance: money(proto.cleared_balance),
        difference: money(proto.difference),
        status: label(&proto.status, "reconciliation status")?,
        completed_at: proto
            .completed_at
            .map(|t| timestamp(&t, "completed_at"))
            .transpose()?,
        created_at: timestamp(&proto.created_at, "created_at")?,
    })
}

// =============================================================================
// Reports
// =============================================================================

fn proto_to_trial_balance_row(proto: pb::TrialBalanceRow) -> AppResult<TrialBalanceRow> {
    Ok(TrialBalanceRow {
        account_id: uuid(&proto.account_id, "account id")?,
        account_name: proto.account_name,
        account_type: label(&proto.account_type, "account type")?,
        debit: money(proto.debit),
        credit: money(proto.credit),
        balance: money(proto.balance),
    })
}

pub fn proto_to_trial_balance(proto: pb::TrialBalance) -> AppResult<TrialBalance> {
    Ok(TrialBalance {
        rows: collect(proto.rows, proto_to_trial_balance_row)?,
        total_debits: money(proto.total_debits),
        total_credits: money(proto.total_credits),
        balanced: proto.balanced,
    })
}

fn proto_to_report_row(proto: pb::ReportRow) -> AppResult<ReportRow> {
    Ok(ReportRow {
        account_id: opt_uuid(proto.account_id, "account id")?,
        account_name: proto.account_name,
        account_type: label(&proto.account_type, "account type")?,
        amount: money(proto.amount),
    })
}

pub fn proto_to_profit_and_loss(proto: pb::ProfitAndLoss) -> AppResult<ProfitAndLoss> {
    Ok(ProfitAndLoss {
        start_date: date(&proto.start_date, "start_date")?,
        end_date: date(&proto.end_date, "end_date")?,
        income: collect(proto.income, proto_to_report_row)?,
        expenses: collect(proto.expenses, proto_to_report_row)?,
        total_income: money(proto.total_income),
        total_expenses: money(proto.total_expenses),
        net_income: money(proto.net_income),
    })
}

pub fn proto_to_balance_sheet(proto: pb::BalanceSheet) -> AppResult<BalanceSheet> {
    Ok(BalanceSheet {
        as_of: date(&proto.as_of, "as_of")?,
        assets: collect(proto.assets, proto_to_report_row)?,
        liabilities: collect(proto.liabilities, proto_to_report_row)?,
        equity: collect(proto.equity, proto_to_report_row)?,
        total_assets: money(proto.total_assets),
        total_liabilities: money(proto.total_liabilities),
        total_equity: money(proto.total_equity),
        total_liabilities_and_equity: money(proto.total_liabilities_and_equity),
        balanced: proto.balanced,
    })
}

pub fn proto_to_monthly_profit_and_loss(proto: pb::MonthlyProfitAndLoss) -> MonthlyProfitAndLoss {
    MonthlyProfitAndLoss {
        month: proto.month,
        month_name: proto.month_name,
        income: money(proto.income),
        expenses: money(proto.expenses),
        net_profit: money(proto.net_profit),
    }
}

pub fn proto_to_monthly_balance(proto: pb::MonthlyBalance) -> MonthlyBalance {
    MonthlyBalance {
        month: proto.month,
        month_name: proto.month_name,
        assets: money(proto.assets),
        liabilities: money(proto.liabilities),
        equity: money(proto.equity),
    }
}

fn proto_to_buckets(proto: Option<pb::BucketTotals>) -> BucketTotals {
    let proto = proto.unwrap_or_default();
    BucketTotals {
        current: money(proto.current),
        days_1_30: money(proto.days_1_30),
        days_31_60: money(proto.days_31_60),
        days_61_90: money(proto.days_61_90),
        over_90: money(proto.over_90),
        total: money(proto.total),
    }
}

fn proto_to_aging_row(proto: pb::AgingRow) -> AppResult<AgingRow> {
    Ok(AgingRow {
        party_id: uuid(&proto.party_id, "party id")?,
        name: proto.name,
        buckets: proto_to_buckets(proto.buckets),
    })
}

pub fn proto_to_aging_report(proto: pb::AgingReport) -> AppResult<AgingReport> {
    Ok(AgingReport {
        as_of: date(&proto.as_of, "as_of")?,
        rows: collect(proto.rows, proto_to_aging_row)?,
        totals: proto_to_buckets(proto.totals),
    })
}

fn proto_to_metric(proto: Option<pb::Metric>) -> Metric {
    let proto = proto.unwrap_or_default();
    let trend = proto.trend.unwrap_or_default();
    let direction = match trend.direction.as_str() {
        "up" => TrendDirection::Up,
        "down" => TrendDirection::Down,
        _ => TrendDirection::Neutral,
    };

    Metric {
        value: money(proto.value),
        trend: Trend {
            direction,
            pct: trend.pct,
        },
    }
}

pub fn proto_to_dashboard(proto: pb::Dashboard) -> AppResult<Dashboard> {
    Ok(Dashboard {
        period: ReportPeriod::parse_or_default(&proto.period),
        start_date: date(&proto.start_date, "start_date")?,
        end_date: date(&proto.end_date, "end_date")?,
        revenue: proto_to_metric(proto.revenue),
        expenses: proto_to_metric(proto.expenses),
        net_profit: proto_to_metric(proto.net_profit),
        open_receivables: money(proto.open_receivables),
        open_payables: money(proto.open_payables),
        bank_balance: money(proto.bank_balance),
        transactions_for_review: u64::from(proto.transactions_for_review),
    })
}

pub fn proto_to_rejournalize_report(proto: pb::RejournalizeReport) -> RejournalizeReport {
    RejournalizeReport {
        dry_run: proto.dry_run,
        counts: RebuildCounts {
            invoices: proto.invoices,
            expenses: proto.expenses,
            payments: proto.payments,
            bills: proto.bills,
            bill_payments: proto.bill_payments,
            transfers: proto.transfers,
            duplicates_removed: proto.duplicates_removed,
            accounts_assigned: proto.accounts_assigned,
        },
        total_debits: money(proto.total_debits),
        total_credits: money(proto.total_credits),
        net_income: money(proto.net_income),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{InvoiceStatus, SourceType};

    fn entry(source_type: Option<&str>) -> pb::JournalEntry {
        pb::JournalEntry {
            id: Uuid::new_v4().to_string(),
            entry_number: "JE-0001".to_string(),
            entry_date: "2025-03-01".to_string(),
            memo: None,
            is_adjusting: false,
            source_type: source_type.map(str::to_string),
            source_id: source_type.map(|_| Uuid::new_v4().to_string()),
            reversed_entry_id: Some(String::new()),
            lines: vec![pb::JournalLine {
                account_id: Uuid::new_v4().to_string(),
                debit: 5000,
                credit: 0,
                description: None,
                customer_id: None,
                supplier_id: None,
            }],
            created_at: "2025-03-01T10:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_journal_entry_source() {
        let converted = proto_to_journal_entry(entry(Some("invoice"))).unwrap();
        assert_eq!(converted.source.map(|s| s.kind), Some(SourceType::Invoice));
        assert_eq!(converted.reversed_entry_id, None);
        assert_eq!(converted.lines[0].debit, Money::from_cents(5000));

        let manual = proto_to_journal_entry(entry(None)).unwrap();
        assert!(manual.source.is_none());
    }

    #[test]
    fn test_invoice_status_label() {
        let invoice = proto_to_invoice(pb::Invoice {
            id: Uuid::new_v4().to_string(),
            invoice_number: "1001".to_string(),
            customer_id: Uuid::new_v4().to_string(),
            invoice_date: "2025-02-01".to_string(),
            due_date: Some("2025-03-01".to_string()),
            subtotal: 10000,
            tax_amount: 1300,
            total: 11300,
            amount_paid: 0,
            amount_due: 11300,
            status: "Sent".to_string(),
            notes: None,
            created_at: "2025-02-01T09:00:00Z".to_string(),
            updated_at: "2025-02-01T09:00:00Z".to_string(),
        })
        .unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.total, Money::from_cents(11300));
    }

    #[test]
    fn test_bad_date_is_internal_error() {
        let mut proto = entry(None);
        proto.entry_date = "03/01/2025".to_string();

        let result = proto_to_journal_entry(proto);
        assert!(matches!(result, Err(AppError::Internal(msg)) if msg.contains("entry_date")));
    }

    #[test]
    fn test_metric_defaults_to_neutral() {
        let metric = proto_to_metric(None);
        assert_eq!(metric.value, Money::ZERO);
        assert_eq!(metric.trend.direction, TrendDirection::Neutral);

        let up = proto_to_metric(Some(pb::Metric {
            value: 15000,
            trend: Some(pb::Trend {
                direction: "up".to_string(),
                pct: "+50.0%".to_string(),
            }),
        }));
        assert_eq!(up.trend.direction, TrendDirection::Up);
        assert_eq!(up.trend.pct, "+50.0%");
    }
}
