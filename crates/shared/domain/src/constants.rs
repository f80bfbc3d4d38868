//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// User Roles
// =============================================================================

/// Default role assigned to new users
pub const ROLE_USER: &str = "user";

/// Administrator role with elevated privileges
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// Ledger
// =============================================================================

/// Prefix of generated journal entry numbers (`JE-0001`)
pub const ENTRY_NUMBER_PREFIX: &str = "JE-";

/// Zero-padded width of the numeric part of an entry number
pub const ENTRY_NUMBER_WIDTH: usize = 4;

/// Minimum number of lines in a journal entry
pub const MIN_JOURNAL_LINES: usize = 2;

/// Description prefix for lines of a reversing entry
pub const REVERSAL_LINE_PREFIX: &str = "REVERSAL: ";

/// Reason recorded when a reversal is requested without one
pub const DEFAULT_REVERSAL_REASON: &str = "Voided";

/// Default name of the operating bank account used by expense postings
pub const DEFAULT_OPERATING_BANK_ACCOUNT: &str = "Operating Account";

/// Payee fragment that routes unassigned expenses to processing fees
pub const PAYMENT_PROCESSOR_PAYEE: &str = "quickbooks payments";

// =============================================================================
// Documents
// =============================================================================

/// Remaining balance (in cents) at or below which an invoice counts as paid
pub const PAID_TOLERANCE_CENTS: i64 = 1;

/// Largest amount (in cents) accepted on a single document or payment
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000_000;

/// Prefix for fit ids generated for imported rows that carry none
pub const GENERATED_FIT_ID_PREFIX: &str = "CSV-";

// =============================================================================
// Reports
// =============================================================================

/// Equity line added to the balance sheet for accumulated net income
pub const RETAINED_EARNINGS_LABEL: &str = "Retained Earnings (Net Income)";

/// Short month names used by monthly trend reports
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Relative change (percent) below which a trend is reported as neutral
pub const TREND_NEUTRAL_THRESHOLD: f64 = 0.5;
