//! Journal entries and the double-entry balancing rules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    DEFAULT_REVERSAL_REASON, ENTRY_NUMBER_PREFIX, ENTRY_NUMBER_WIDTH, MAX_AMOUNT_CENTS,
    MIN_JOURNAL_LINES, REVERSAL_LINE_PREFIX,
};
use crate::error::{DomainError, DomainResult};
use crate::money::{format_cents, Money};

labelled_enum! {
    /// Kind of document a journal entry was posted from.
    pub enum SourceType {
        Invoice => "invoice",
        Payment => "payment",
        Expense => "expense",
        Bill => "bill",
        BillPayment => "bill_payment",
        Transfer => "transfer",
        Manual => "manual",
    }
}

/// Link from a journal entry back to the document that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SourceRef {
    pub kind: SourceType,
    pub id: Uuid,
}

impl SourceRef {
    pub fn new(kind: SourceType, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// One debit or credit line of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JournalLine {
    pub account_id: Uuid,
    pub debit: Money,
    pub credit: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<Uuid>,
}

impl JournalLine {
    pub fn debit(account_id: Uuid, amount: Money, description: impl Into<String>) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Money::ZERO,
            description: Some(description.into()),
            customer_id: None,
            supplier_id: None,
        }
    }

    pub fn credit(account_id: Uuid, amount: Money, description: impl Into<String>) -> Self {
        Self {
            account_id,
            debit: Money::ZERO,
            credit: amount,
            description: Some(description.into()),
            customer_id: None,
            supplier_id: None,
        }
    }

    pub fn with_customer(mut self, customer_id: Uuid) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_supplier(mut self, supplier_id: Uuid) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    /// The same line with debit and credit swapped.
    pub fn reversed(&self) -> Self {
        Self {
            account_id: self.account_id,
            debit: self.credit,
            credit: self.debit,
            description: Some(format!(
                "{}{}",
                REVERSAL_LINE_PREFIX,
                self.description.as_deref().unwrap_or("")
            )),
            customer_id: self.customer_id,
            supplier_id: self.supplier_id,
        }
    }
}

/// Journal entry ready to be posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub entry_date: NaiveDate,
    pub memo: Option<String>,
    pub is_adjusting: bool,
    pub source: Option<SourceRef>,
    /// Set when this entry reverses another one
    pub reversed_entry_id: Option<Uuid>,
    pub lines: Vec<JournalLine>,
}

impl NewJournalEntry {
    pub fn new(entry_date: NaiveDate, memo: impl Into<String>, lines: Vec<JournalLine>) -> Self {
        Self {
            entry_date,
            memo: Some(memo.into()),
            is_adjusting: false,
            source: None,
            reversed_entry_id: None,
            lines,
        }
    }

    pub fn with_source(mut self, kind: SourceType, id: Uuid) -> Self {
        self.source = Some(SourceRef::new(kind, id));
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_lines(&self.lines)
    }

    pub fn total_debits(&self) -> Money {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credits(&self) -> Money {
        self.lines.iter().map(|l| l.credit).sum()
    }
}

/// Posted journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JournalEntry {
    pub id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub is_adjusting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reversed_entry_id: Option<Uuid>,
    pub lines: Vec<JournalLine>,
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn total_debits(&self) -> Money {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credits(&self) -> Money {
        self.lines.iter().map(|l| l.credit).sum()
    }

    /// Whether this entry reverses another one.
    pub fn is_reversal(&self) -> bool {
        self.reversed_entry_id.is_some()
    }

    /// Build the entry that cancels this one.
    ///
    /// Reversing a reversal is refused; callers also refuse entries that
    /// already have a reversal on file.
    pub fn reversal(&self, reason: Option<&str>, entry_date: NaiveDate) -> DomainResult<NewJournalEntry> {
        if self.is_reversal() {
            return Err(DomainError::conflict(format!(
                "Journal entry {} is itself a reversal",
                self.entry_number
            )));
        }

        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REVERSAL_REASON);

        Ok(NewJournalEntry {
            entry_date,
            memo: Some(format!("Reversal of {}: {}", self.entry_number, reason)),
            is_adjusting: true,
            source: self.source,
            reversed_entry_id: Some(self.id),
            lines: self.lines.iter().map(JournalLine::reversed).collect(),
        })
    }
}

/// Check the double-entry rules for a set of lines.
pub fn validate_lines(lines: &[JournalLine]) -> DomainResult<()> {
    if lines.len() < MIN_JOURNAL_LINES {
        return Err(DomainError::validation(
            "Journal entry must have at least 2 lines",
        ));
    }

    let mut debits = Money::ZERO;
    let mut credits = Money::ZERO;

    for line in lines {
        if line.debit.is_negative() || line.credit.is_negative() {
            return Err(DomainError::validation(
                "Debit and credit amounts must be non-negative",
            ));
        }
        if line.debit.cents() > MAX_AMOUNT_CENTS || line.credit.cents() > MAX_AMOUNT_CENTS {
            return Err(DomainError::validation(format!(
                "Line amounts cannot exceed {}",
                format_cents(MAX_AMOUNT_CENTS)
            )));
        }
        if line.debit.is_positive() && line.credit.is_positive() {
            return Err(DomainError::validation(
                "A line cannot have both debit and credit",
            ));
        }
        if line.debit.is_zero() && line.credit.is_zero() {
            return Err(DomainError::validation(
                "Each line must have either a debit or credit amount",
            ));
        }

        debits += line.debit;
        credits += line.credit;
    }

    if debits != credits {
        return Err(DomainError::validation(format!(
            "Entry is unbalanced: debits={}, credits={}",
            debits.to_decimal_string(),
            credits.to_decimal_string()
        )));
    }

    Ok(())
}

/// Entry number for the next entry given how many already exist.
pub fn entry_number(existing: u64) -> String {
    format!(
        "{}{:0width$}",
        ENTRY_NUMBER_PREFIX,
        existing + 1,
        width = ENTRY_NUMBER_WIDTH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(debit: i64, credit: i64) -> JournalLine {
        JournalLine {
            account_id: Uuid::new_v4(),
            debit: Money::from_cents(debit),
            credit: Money::from_cents(credit),
            description: None,
            customer_id: None,
            supplier_id: None,
        }
    }

    fn message(result: DomainResult<()>) -> String {
        match result {
            Err(DomainError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_balanced_entry_passes() {
        assert!(validate_lines(&[line(1000, 0), line(0, 600), line(0, 400)]).is_ok());
    }

    #[test]
    fn test_single_line_rejected() {
        assert_eq!(
            message(validate_lines(&[line(100, 0)])),
            "Journal entry must have at least 2 lines"
        );
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert_eq!(
            message(validate_lines(&[line(-100, 0), line(0, -100)])),
            "Debit and credit amounts must be non-negative"
        );
    }

    #[test]
    fn test_both_sides_rejected() {
        assert_eq!(
            message(validate_lines(&[line(100, 100), line(0, 0)])),
            "A line cannot have both debit and credit"
        );
    }

    #[test]
    fn test_empty_line_rejected() {
        assert_eq!(
            message(validate_lines(&[line(100, 0), line(0, 0)])),
            "Each line must have either a debit or credit amount"
        );
    }

    #[test]
    fn test_unbalanced_reports_totals() {
        assert_eq!(
            message(validate_lines(&[line(10000, 0), line(0, 9999)])),
            "Entry is unbalanced: debits=100.00, credits=99.99"
        );
    }

    #[test]
    fn test_entry_number_padding() {
        assert_eq!(entry_number(0), "JE-0001");
        assert_eq!(entry_number(41), "JE-0042");
        assert_eq!(entry_number(12345), "JE-12346");
    }

    #[test]
    fn test_reversal_swaps_sides() {
        let entry = JournalEntry {
            id: Uuid::new_v4(),
            entry_number: "JE-0007".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            memo: None,
            is_adjusting: false,
            source: None,
            reversed_entry_id: None,
            lines: vec![
                JournalLine::debit(Uuid::new_v4(), Money::from_cents(500), "Invoice INV-1"),
                JournalLine::credit(Uuid::new_v4(), Money::from_cents(500), "Invoice INV-1 - Sales"),
            ],
            created_at: Utc::now(),
        };

        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let reversal = entry.reversal(None, date).unwrap();

        assert_eq!(reversal.memo.as_deref(), Some("Reversal of JE-0007: Voided"));
        assert!(reversal.is_adjusting);
        assert_eq!(reversal.reversed_entry_id, Some(entry.id));
        assert_eq!(reversal.lines[0].credit.cents(), 500);
        assert_eq!(reversal.lines[0].description.as_deref(), Some("REVERSAL: Invoice INV-1"));
        assert!(reversal.validate().is_ok());

        let custom = entry.reversal(Some("Duplicate"), date).unwrap();
        assert_eq!(custom.memo.as_deref(), Some("Reversal of JE-0007: Duplicate"));
    }

    #[test]
    fn test_reversal_of_reversal_is_conflict() {
        let entry = JournalEntry {
            id: Uuid::new_v4(),
            entry_number: "JE-0008".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            memo: None,
            is_adjusting: true,
            source: None,
            reversed_entry_id: Some(Uuid::new_v4()),
            lines: vec![line(100, 0), line(0, 100)],
            created_at: Utc::now(),
        };

        let date = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        assert!(matches!(entry.reversal(None, date), Err(DomainError::Conflict(_))));
    }
}
