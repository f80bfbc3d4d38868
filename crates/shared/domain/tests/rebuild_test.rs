//! Ledger rebuild planning tests.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use domain::{
    BillPayment, Expense, Invoice, InvoiceStatus, Money, NewBill, NewExpense, NewInvoice,
    NewTransfer, RebuildPlan, RebuildSources, SystemAccount, SystemAccounts,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn all_accounts() -> SystemAccounts {
    SystemAccount::ALL
        .iter()
        .fold(SystemAccounts::new(), |acc, a| acc.with(*a, Uuid::new_v4()))
}

fn invoice(number: &str, status: InvoiceStatus, on: NaiveDate, cents: i64) -> Invoice {
    NewInvoice {
        invoice_number: number.to_string(),
        customer_id: Uuid::new_v4(),
        invoice_date: on,
        due_date: None,
        subtotal: Money::from_cents(cents),
        tax_amount: Money::ZERO,
        status: Some(status),
        notes: None,
    }
    .into_invoice(Uuid::new_v4(), Utc::now())
    .unwrap()
}

fn expense(payee: &str, on: NaiveDate, cents: i64, created_at: DateTime<Utc>) -> Expense {
    NewExpense {
        expense_type: None,
        payee_type: None,
        payee_id: None,
        payee_name: Some(payee.to_string()),
        account_id: None,
        payment_account_id: None,
        expense_date: on,
        subtotal: Money::from_cents(cents),
        tax_amount: Money::ZERO,
        memo: None,
    }
    .into_expense(Uuid::new_v4(), created_at)
    .unwrap()
}

#[test]
fn test_duplicate_expenses_keep_earliest() {
    let now = Utc::now();
    let first = expense("Zoom", date(2024, 2, 3), 1_499, now - Duration::hours(2));
    let copy = expense("Zoom", date(2024, 2, 3), 1_499, now);
    let other_day = expense("Zoom", date(2024, 3, 3), 1_499, now);

    let sources = RebuildSources {
        expenses: vec![copy.clone(), first.clone(), other_day.clone()],
        ..RebuildSources::default()
    };
    let plan = RebuildPlan::build(sources, &all_accounts()).unwrap();

    assert_eq!(plan.duplicate_expense_ids, vec![copy.id]);
    assert_eq!(plan.counts.duplicates_removed, 1);
    assert_eq!(plan.counts.expenses, 2);
    assert!(plan.is_balanced());
}

#[test]
fn test_unassigned_expenses_get_accounts() {
    let accounts = all_accounts();
    let fees = accounts.get(SystemAccount::PaymentProcessingFees).unwrap();
    let misc = accounts.get(SystemAccount::MiscellaneousExpenses).unwrap();

    let processor = expense("QuickBooks Payments", date(2024, 1, 5), 300, Utc::now());
    let cafe = expense("Cafe", date(2024, 1, 6), 800, Utc::now());
    let sources = RebuildSources {
        expenses: vec![processor.clone(), cafe.clone()],
        ..RebuildSources::default()
    };

    let plan = RebuildPlan::build(sources, &accounts).unwrap();

    assert_eq!(plan.counts.accounts_assigned, 2);
    assert!(plan.account_assignments.contains(&(processor.id, fees)));
    assert!(plan.account_assignments.contains(&(cafe.id, misc)));
}

#[test]
fn test_drafts_and_voided_invoices_skipped() {
    let sources = RebuildSources {
        invoices: vec![
            invoice("INV-1", InvoiceStatus::Sent, date(2024, 1, 10), 10_000),
            invoice("INV-2", InvoiceStatus::Draft, date(2024, 1, 11), 20_000),
            invoice("INV-3", InvoiceStatus::Voided, date(2024, 1, 12), 30_000),
            invoice("INV-4", InvoiceStatus::Paid, date(2024, 1, 13), 40_000),
        ],
        ..RebuildSources::default()
    };

    let plan = RebuildPlan::build(sources, &all_accounts()).unwrap();

    assert_eq!(plan.counts.invoices, 2);
    assert_eq!(plan.total_debits, Money::from_cents(50_000));
    assert_eq!(plan.total_credits, Money::from_cents(50_000));
}

#[test]
fn test_entries_ordered_by_date_and_totals_balance() {
    let accounts = all_accounts();
    let bank = accounts.get(SystemAccount::OperatingBank).unwrap();
    let savings = Uuid::new_v4();

    let bill = NewBill {
        bill_number: Some("B-12".to_string()),
        supplier_id: Uuid::new_v4(),
        account_id: None,
        bill_date: date(2024, 1, 20),
        due_date: None,
        subtotal: Money::from_cents(6_000),
        tax_amount: Money::from_cents(600),
        memo: None,
    }
    .into_bill(Uuid::new_v4(), Utc::now())
    .unwrap();
    let bill_payment = BillPayment {
        id: Uuid::new_v4(),
        bill_id: bill.id,
        supplier_id: bill.supplier_id,
        payment_account_id: bank,
        amount: Money::from_cents(6_600),
        payment_date: date(2024, 1, 25),
        bill_reference: bill.reference(),
        created_at: Utc::now(),
    };
    let transfer = NewTransfer {
        from_account_id: bank,
        to_account_id: savings,
        amount: Money::from_cents(1_000),
        transfer_date: date(2024, 1, 2),
        memo: None,
    }
    .into_transfer(Uuid::new_v4(), Utc::now())
    .unwrap();

    let sources = RebuildSources {
        invoices: vec![invoice("INV-9", InvoiceStatus::Sent, date(2024, 1, 15), 9_000)],
        bills: vec![bill],
        bill_payments: vec![bill_payment],
        transfers: vec![transfer],
        ..RebuildSources::default()
    };

    let plan = RebuildPlan::build(sources, &accounts).unwrap();

    let dates: Vec<NaiveDate> = plan.entries.iter().map(|e| e.entry_date).collect();
    assert_eq!(
        dates,
        vec![
            date(2024, 1, 2),
            date(2024, 1, 15),
            date(2024, 1, 20),
            date(2024, 1, 25)
        ]
    );
    assert_eq!(plan.counts.entries(), 4);
    assert_eq!(plan.counts.transfers, 1);
    assert_eq!(plan.counts.bill_payments, 1);
    assert!(plan.is_balanced());
    assert_eq!(plan.total_debits, Money::from_cents(9_000 + 6_600 + 6_600 + 1_000));
}

#[test]
fn test_required_accounts_follow_sources() {
    let sources = RebuildSources {
        expenses: vec![expense("QuickBooks Payments", date(2024, 1, 5), 300, Utc::now())],
        ..RebuildSources::default()
    };

    let required = RebuildPlan::required_accounts(&sources);

    assert!(required.contains(&SystemAccount::PaymentProcessingFees));
    assert!(required.contains(&SystemAccount::OperatingBank));
    assert!(!required.contains(&SystemAccount::Sales));
}

#[test]
fn test_empty_sources_plan_nothing() {
    let plan = RebuildPlan::build(RebuildSources::default(), &SystemAccounts::new()).unwrap();

    assert!(plan.entries.is_empty());
    assert_eq!(plan.counts.entries(), 0);
    assert!(plan.is_balanced());
}
