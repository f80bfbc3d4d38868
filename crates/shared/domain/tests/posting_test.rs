//! Posting rule tests.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use domain::{
    BillPayment, InvoiceStatus, Money, NewBill, NewExpense, NewInvoice, NewTransfer, PayeeType,
    Payment, PostingSource, SourceType, SystemAccount, SystemAccounts,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn system_accounts() -> (SystemAccounts, Vec<(SystemAccount, Uuid)>) {
    let ids: Vec<(SystemAccount, Uuid)> = SystemAccount::ALL
        .iter()
        .map(|a| (*a, Uuid::new_v4()))
        .collect();
    let accounts = ids
        .iter()
        .fold(SystemAccounts::new(), |acc, (a, id)| acc.with(*a, *id));
    (accounts, ids)
}

fn id_of(ids: &[(SystemAccount, Uuid)], account: SystemAccount) -> Uuid {
    ids.iter().find(|(a, _)| *a == account).unwrap().1
}

fn sent_invoice(subtotal: i64, tax: i64) -> domain::Invoice {
    NewInvoice {
        invoice_number: "INV-1001".to_string(),
        customer_id: Uuid::new_v4(),
        invoice_date: date(2024, 3, 1),
        due_date: Some(date(2024, 3, 31)),
        subtotal: Money::from_cents(subtotal),
        tax_amount: Money::from_cents(tax),
        status: Some(InvoiceStatus::Sent),
        notes: None,
    }
    .into_invoice(Uuid::new_v4(), Utc::now())
    .unwrap()
}

#[test]
fn test_invoice_with_tax_splits_sales_and_tax() {
    let (accounts, ids) = system_accounts();
    let invoice = sent_invoice(10_000, 1_300);

    let entry = PostingSource::Invoice(&invoice)
        .journal(&accounts)
        .unwrap()
        .expect("invoice posts");

    assert_eq!(entry.lines.len(), 3);
    assert_eq!(entry.total_debits(), Money::from_cents(11_300));
    assert_eq!(entry.total_credits(), Money::from_cents(11_300));

    let ar = &entry.lines[0];
    assert_eq!(ar.account_id, id_of(&ids, SystemAccount::AccountsReceivable));
    assert_eq!(ar.debit, Money::from_cents(11_300));
    assert_eq!(ar.customer_id, Some(invoice.customer_id));

    assert_eq!(entry.lines[1].account_id, id_of(&ids, SystemAccount::Sales));
    assert_eq!(entry.lines[1].credit, Money::from_cents(10_000));
    assert_eq!(
        entry.lines[2].account_id,
        id_of(&ids, SystemAccount::SalesTaxPayable)
    );
    assert_eq!(entry.lines[2].credit, Money::from_cents(1_300));

    let source = entry.source.expect("source recorded");
    assert_eq!(source.kind, SourceType::Invoice);
    assert_eq!(source.id, invoice.id);
}

#[test]
fn test_invoice_without_tax_needs_no_tax_account() {
    let invoice = sent_invoice(5_000, 0);
    let required = PostingSource::Invoice(&invoice).required_accounts();

    assert_eq!(
        required,
        vec![SystemAccount::AccountsReceivable, SystemAccount::Sales]
    );

    let accounts = SystemAccounts::new()
        .with(SystemAccount::AccountsReceivable, Uuid::new_v4())
        .with(SystemAccount::Sales, Uuid::new_v4());
    let entry = PostingSource::Invoice(&invoice)
        .journal(&accounts)
        .unwrap()
        .unwrap();
    assert_eq!(entry.lines.len(), 2);
}

#[test]
fn test_tax_only_invoice_skips_sales_line() {
    let (accounts, ids) = system_accounts();
    let invoice = sent_invoice(0, 500);

    assert_eq!(
        PostingSource::Invoice(&invoice).required_accounts(),
        vec![SystemAccount::AccountsReceivable, SystemAccount::SalesTaxPayable]
    );

    let entry = PostingSource::Invoice(&invoice)
        .journal(&accounts)
        .unwrap()
        .expect("tax-only invoice posts");

    assert_eq!(entry.lines.len(), 2);
    assert_eq!(entry.lines[0].debit, Money::from_cents(500));
    assert_eq!(
        entry.lines[1].account_id,
        id_of(&ids, SystemAccount::SalesTaxPayable)
    );
    assert_eq!(entry.lines[1].credit, Money::from_cents(500));
    assert!(entry
        .lines
        .iter()
        .all(|l| l.account_id != id_of(&ids, SystemAccount::Sales)));
}

#[test]
fn test_zero_invoice_posts_nothing() {
    let (accounts, _) = system_accounts();
    let invoice = sent_invoice(0, 0);

    assert!(PostingSource::Invoice(&invoice)
        .journal(&accounts)
        .unwrap()
        .is_none());
}

#[test]
fn test_payment_defaults_to_undeposited_funds() {
    let (accounts, ids) = system_accounts();
    let payment = Payment {
        id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        payment_date: date(2024, 3, 10),
        amount: Money::from_cents(4_500),
        payment_method: Some("card".to_string()),
        reference_number: Some("CH-77".to_string()),
        deposit_to_account_id: None,
        memo: None,
        created_at: Utc::now(),
    };

    let entry = PostingSource::Payment(&payment)
        .journal(&accounts)
        .unwrap()
        .unwrap();

    assert_eq!(
        entry.lines[0].account_id,
        id_of(&ids, SystemAccount::UndepositedFunds)
    );
    assert_eq!(entry.lines[0].debit, Money::from_cents(4_500));
    assert_eq!(
        entry.lines[1].account_id,
        id_of(&ids, SystemAccount::AccountsReceivable)
    );
    assert_eq!(entry.memo.as_deref(), Some("Payment received (CH-77)"));
}

#[test]
fn test_payment_to_explicit_deposit_account() {
    let (accounts, _) = system_accounts();
    let bank = Uuid::new_v4();
    let payment = Payment {
        id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        payment_date: date(2024, 3, 10),
        amount: Money::from_cents(100),
        payment_method: None,
        reference_number: None,
        deposit_to_account_id: Some(bank),
        memo: None,
        created_at: Utc::now(),
    };

    assert!(!PostingSource::Payment(&payment)
        .required_accounts()
        .contains(&SystemAccount::UndepositedFunds));

    let entry = PostingSource::Payment(&payment)
        .journal(&accounts)
        .unwrap()
        .unwrap();
    assert_eq!(entry.lines[0].account_id, bank);
}

#[test]
fn test_unassigned_processor_expense_goes_to_fees() {
    let (accounts, ids) = system_accounts();
    let expense = NewExpense {
        expense_type: None,
        payee_type: None,
        payee_id: None,
        payee_name: Some("QuickBooks Payments".to_string()),
        account_id: None,
        payment_account_id: None,
        expense_date: date(2024, 4, 2),
        subtotal: Money::from_cents(290),
        tax_amount: Money::from_cents(10),
        memo: None,
    }
    .into_expense(Uuid::new_v4(), Utc::now())
    .unwrap();

    let entry = PostingSource::Expense(&expense)
        .journal(&accounts)
        .unwrap()
        .unwrap();

    assert_eq!(
        entry.lines[0].account_id,
        id_of(&ids, SystemAccount::PaymentProcessingFees)
    );
    assert_eq!(
        entry.lines[1].account_id,
        id_of(&ids, SystemAccount::SalesTaxReceivable)
    );
    let credit = entry.lines.last().unwrap();
    assert_eq!(credit.account_id, id_of(&ids, SystemAccount::OperatingBank));
    assert_eq!(credit.credit, Money::from_cents(300));
}

#[test]
fn test_unassigned_expense_defaults_to_miscellaneous() {
    let expense = NewExpense {
        expense_type: None,
        payee_type: None,
        payee_id: None,
        payee_name: Some("Corner Cafe".to_string()),
        account_id: None,
        payment_account_id: Some(Uuid::new_v4()),
        expense_date: date(2024, 4, 2),
        subtotal: Money::from_cents(1_250),
        tax_amount: Money::ZERO,
        memo: None,
    }
    .into_expense(Uuid::new_v4(), Utc::now())
    .unwrap();

    assert_eq!(
        PostingSource::Expense(&expense).required_accounts(),
        vec![SystemAccount::MiscellaneousExpenses]
    );
}

#[test]
fn test_missing_system_account_is_an_error() {
    let invoice = sent_invoice(1_000, 0);
    let accounts = SystemAccounts::new().with(SystemAccount::Sales, Uuid::new_v4());

    assert!(PostingSource::Invoice(&invoice).journal(&accounts).is_err());
}

#[test]
fn test_transfer_debits_destination() {
    let from = Uuid::new_v4();
    let to = Uuid::new_v4();
    let transfer = NewTransfer {
        from_account_id: from,
        to_account_id: to,
        amount: Money::from_cents(20_000),
        transfer_date: date(2024, 5, 1),
        memo: None,
    }
    .into_transfer(Uuid::new_v4(), Utc::now())
    .unwrap();

    let entry = PostingSource::Transfer(&transfer)
        .journal(&SystemAccounts::new())
        .unwrap()
        .unwrap();

    assert_eq!(entry.lines[0].account_id, to);
    assert_eq!(entry.lines[0].debit, Money::from_cents(20_000));
    assert_eq!(entry.lines[1].account_id, from);
    assert_eq!(entry.memo.as_deref(), Some("Transfer between accounts"));
}

#[test]
fn test_transfer_to_same_account_rejected() {
    let account = Uuid::new_v4();
    let result = NewTransfer {
        from_account_id: account,
        to_account_id: account,
        amount: Money::from_cents(1),
        transfer_date: date(2024, 5, 1),
        memo: None,
    }
    .into_transfer(Uuid::new_v4(), Utc::now());

    assert!(result.is_err());
}

#[test]
fn test_supplier_expense_with_tax_tags_every_line() {
    let (accounts, ids) = system_accounts();
    let supplier = Uuid::new_v4();
    let office = Uuid::new_v4();
    let card = Uuid::new_v4();
    let expense = NewExpense {
        expense_type: None,
        payee_type: Some(PayeeType::Supplier),
        payee_id: Some(supplier),
        payee_name: Some("Paper Co".to_string()),
        account_id: Some(office),
        payment_account_id: Some(card),
        expense_date: date(2024, 4, 9),
        subtotal: Money::from_cents(4_000),
        tax_amount: Money::from_cents(520),
        memo: None,
    }
    .into_expense(Uuid::new_v4(), Utc::now())
    .unwrap();

    assert_eq!(
        PostingSource::Expense(&expense).required_accounts(),
        vec![SystemAccount::SalesTaxReceivable]
    );

    let entry = PostingSource::Expense(&expense)
        .journal(&accounts)
        .unwrap()
        .unwrap();

    assert_eq!(entry.lines.len(), 3);
    assert_eq!(entry.lines[0].account_id, office);
    assert_eq!(entry.lines[0].debit, Money::from_cents(4_000));
    assert_eq!(
        entry.lines[1].account_id,
        id_of(&ids, SystemAccount::SalesTaxReceivable)
    );
    assert_eq!(entry.lines[1].debit, Money::from_cents(520));
    assert_eq!(entry.lines[2].account_id, card);
    assert_eq!(entry.lines[2].credit, Money::from_cents(4_520));
    assert!(entry.lines.iter().all(|l| l.supplier_id == Some(supplier)));
    assert_eq!(entry.memo.as_deref(), Some("Expense paid to Paper Co"));
}

#[test]
fn test_bill_credits_payable_with_tax_line() {
    let (accounts, ids) = system_accounts();
    let supplier = Uuid::new_v4();
    let bill = NewBill {
        bill_number: Some("B-77".to_string()),
        supplier_id: supplier,
        account_id: None,
        bill_date: date(2024, 5, 3),
        due_date: Some(date(2024, 6, 2)),
        subtotal: Money::from_cents(10_000),
        tax_amount: Money::from_cents(1_300),
        memo: None,
    }
    .into_bill(Uuid::new_v4(), Utc::now())
    .unwrap();

    let entry = PostingSource::Bill(&bill)
        .journal(&accounts)
        .unwrap()
        .unwrap();

    assert_eq!(entry.lines.len(), 3);
    assert_eq!(
        entry.lines[0].account_id,
        id_of(&ids, SystemAccount::MiscellaneousExpenses)
    );
    assert_eq!(entry.lines[0].debit, Money::from_cents(10_000));
    assert_eq!(
        entry.lines[1].account_id,
        id_of(&ids, SystemAccount::SalesTaxReceivable)
    );
    assert_eq!(entry.lines[1].debit, Money::from_cents(1_300));
    assert_eq!(
        entry.lines[2].account_id,
        id_of(&ids, SystemAccount::AccountsPayable)
    );
    assert_eq!(entry.lines[2].credit, Money::from_cents(11_300));
    assert!(entry.lines.iter().all(|l| l.supplier_id == Some(supplier)));

    let source = entry.source.unwrap();
    assert_eq!(source.kind, SourceType::Bill);
    assert_eq!(source.id, bill.id);
}

#[test]
fn test_bill_payment_debits_payable() {
    let (accounts, ids) = system_accounts();
    let bank = Uuid::new_v4();
    let payment = BillPayment {
        id: Uuid::new_v4(),
        bill_id: Uuid::new_v4(),
        supplier_id: Uuid::new_v4(),
        payment_account_id: bank,
        amount: Money::from_cents(11_300),
        payment_date: date(2024, 5, 20),
        bill_reference: "B-77".to_string(),
        created_at: Utc::now(),
    };

    assert_eq!(
        PostingSource::BillPayment(&payment).required_accounts(),
        vec![SystemAccount::AccountsPayable]
    );

    let entry = PostingSource::BillPayment(&payment)
        .journal(&accounts)
        .unwrap()
        .unwrap();

    assert_eq!(
        entry.lines[0].account_id,
        id_of(&ids, SystemAccount::AccountsPayable)
    );
    assert_eq!(entry.lines[0].debit, Money::from_cents(11_300));
    assert_eq!(entry.lines[0].supplier_id, Some(payment.supplier_id));
    assert_eq!(entry.lines[1].account_id, bank);
    assert_eq!(entry.lines[1].credit, Money::from_cents(11_300));
    assert_eq!(entry.memo.as_deref(), Some("Bill payment for Bill #B-77"));
    assert_eq!(entry.source.unwrap().kind, SourceType::BillPayment);
}
