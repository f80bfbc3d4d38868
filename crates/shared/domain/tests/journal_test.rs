//! Journal entry rule tests.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use domain::journal::{entry_number, validate_lines};
use domain::{DomainError, JournalEntry, JournalLine, Money, SourceRef, SourceType};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn posted_entry(cash: Uuid, revenue: Uuid) -> JournalEntry {
    JournalEntry {
        id: Uuid::new_v4(),
        entry_number: "JE-0007".to_string(),
        entry_date: date(2024, 6, 1),
        memo: Some("Invoice INV-7".to_string()),
        is_adjusting: false,
        source: Some(SourceRef::new(SourceType::Invoice, Uuid::new_v4())),
        reversed_entry_id: None,
        lines: vec![
            JournalLine::debit(cash, Money::from_cents(5_000), "Invoice INV-7"),
            JournalLine::credit(revenue, Money::from_cents(5_000), "Invoice INV-7 - Sales"),
        ],
        created_at: Utc::now(),
    }
}

#[test]
fn test_reversal_swaps_sides() {
    let cash = Uuid::new_v4();
    let revenue = Uuid::new_v4();
    let entry = posted_entry(cash, revenue);

    let reversal = entry.reversal(Some("Duplicate"), date(2024, 6, 5)).unwrap();

    assert_eq!(reversal.reversed_entry_id, Some(entry.id));
    assert!(reversal.is_adjusting);
    assert_eq!(reversal.source, entry.source);
    assert_eq!(reversal.entry_date, date(2024, 6, 5));
    assert_eq!(
        reversal.memo.as_deref(),
        Some("Reversal of JE-0007: Duplicate")
    );

    assert_eq!(reversal.lines[0].account_id, cash);
    assert_eq!(reversal.lines[0].credit, Money::from_cents(5_000));
    assert!(reversal.lines[0].debit.is_zero());
    assert_eq!(reversal.lines[1].account_id, revenue);
    assert_eq!(reversal.lines[1].debit, Money::from_cents(5_000));
    assert!(reversal.validate().is_ok());
}

#[test]
fn test_reversing_a_reversal_conflicts() {
    let mut entry = posted_entry(Uuid::new_v4(), Uuid::new_v4());
    entry.reversed_entry_id = Some(Uuid::new_v4());

    let err = entry.reversal(None, date(2024, 6, 5)).unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[test]
fn test_blank_reason_uses_default() {
    let entry = posted_entry(Uuid::new_v4(), Uuid::new_v4());
    let reversal = entry.reversal(Some("   "), date(2024, 6, 5)).unwrap();

    assert_eq!(reversal.memo.as_deref(), Some("Reversal of JE-0007: Voided"));
    assert_eq!(
        reversal.lines[0].description.as_deref(),
        Some("REVERSAL: Invoice INV-7")
    );
}

#[test]
fn test_unbalanced_lines_rejected() {
    let lines = vec![
        JournalLine::debit(Uuid::new_v4(), Money::from_cents(1_000), "a"),
        JournalLine::credit(Uuid::new_v4(), Money::from_cents(999), "b"),
    ];

    let err = validate_lines(&lines).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert!(err.to_string().contains("unbalanced"));
}

#[test]
fn test_single_line_rejected() {
    let lines = vec![JournalLine::debit(Uuid::new_v4(), Money::from_cents(1), "a")];
    assert!(validate_lines(&lines).is_err());
}

#[test]
fn test_line_with_both_sides_rejected() {
    let mut both = JournalLine::debit(Uuid::new_v4(), Money::from_cents(500), "a");
    both.credit = Money::from_cents(500);
    let lines = vec![
        both,
        JournalLine::credit(Uuid::new_v4(), Money::from_cents(500), "b"),
    ];

    assert!(validate_lines(&lines).is_err());
}

#[test]
fn test_empty_line_rejected() {
    let lines = vec![
        JournalLine::debit(Uuid::new_v4(), Money::ZERO, "a"),
        JournalLine::credit(Uuid::new_v4(), Money::ZERO, "b"),
    ];

    assert!(validate_lines(&lines).is_err());
}

#[test]
fn test_entry_numbers_are_padded() {
    assert_eq!(entry_number(0), "JE-0001");
    assert_eq!(entry_number(41), "JE-0042");
    assert_eq!(entry_number(9_999), "JE-10000");
}
