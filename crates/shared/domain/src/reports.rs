//! Financial statements derived from journal lines.
//!
//! Nothing here reads a stored balance: every figure is summed from the
//! posted lines handed in by the caller.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountType;
use crate::constants::{MONTH_NAMES, RETAINED_EARNINGS_LABEL};
use crate::money::Money;

/// A posted journal line joined with its account and entry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub account_id: Uuid,
    pub account_name: String,
    pub account_type: AccountType,
    pub entry_date: NaiveDate,
    pub debit: Money,
    pub credit: Money,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
struct AccountTotals {
    account_id: Uuid,
    account_name: String,
    account_type: AccountType,
    debits: Money,
    credits: Money,
}

/// Per-account debit and credit totals, in chart order.
fn totals_by_account<'a, I>(lines: I) -> Vec<AccountTotals>
where
    I: IntoIterator<Item = &'a LedgerLine>,
{
    let mut by_account: HashMap<Uuid, AccountTotals> = HashMap::new();
    for line in lines {
        let totals = by_account
            .entry(line.account_id)
            .or_insert_with(|| AccountTotals {
                account_id: line.account_id,
                account_name: line.account_name.clone(),
                account_type: line.account_type,
                debits: Money::ZERO,
                credits: Money::ZERO,
            });
        totals.debits += line.debit;
        totals.credits += line.credit;
    }

    let mut rows: Vec<AccountTotals> = by_account.into_values().collect();
    rows.sort_by(|a, b| {
        type_rank(a.account_type)
            .cmp(&type_rank(b.account_type))
            .then_with(|| a.account_name.cmp(&b.account_name))
    });
    rows
}

fn type_rank(account_type: AccountType) -> usize {
    AccountType::ALL
        .iter()
        .position(|t| *t == account_type)
        .unwrap_or(AccountType::ALL.len())
}

fn within(line: &LedgerLine, start: NaiveDate, end: NaiveDate) -> bool {
    line.entry_date >= start && line.entry_date <= end
}

/// Last calendar day of the given month.
fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
}

// =============================================================================
// Trial balance
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrialBalanceRow {
    pub account_id: Uuid,
    pub account_name: String,
    pub account_type: AccountType,
    pub debit: Money,
    pub credit: Money,
    /// Balance in the account's normal direction
    pub balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrialBalance {
    pub rows: Vec<TrialBalanceRow>,
    pub total_debits: Money,
    pub total_credits: Money,
    pub balanced: bool,
}

impl TrialBalance {
    pub fn build(lines: &[LedgerLine]) -> Self {
        let rows: Vec<TrialBalanceRow> = totals_by_account(lines)
            .into_iter()
            .map(|t| TrialBalanceRow {
                balance: t.account_type.balance_from(t.debits, t.credits),
                account_id: t.account_id,
                account_name: t.account_name,
                account_type: t.account_type,
                debit: t.debits,
                credit: t.credits,
            })
            .collect();

        let total_debits: Money = rows.iter().map(|r| r.debit).sum();
        let total_credits: Money = rows.iter().map(|r| r.credit).sum();

        Self {
            rows,
            total_debits,
            total_credits,
            balanced: total_debits == total_credits,
        }
    }
}

// =============================================================================
// Profit & loss
// =============================================================================

/// One account line on a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReportRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    pub account_name: String,
    pub account_type: AccountType,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProfitAndLoss {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub income: Vec<ReportRow>,
    pub expenses: Vec<ReportRow>,
    pub total_income: Money,
    pub total_expenses: Money,
    pub net_income: Money,
}

impl ProfitAndLoss {
    /// Income and expense activity between `start` and `end`, inclusive.
    /// Accounts with no net activity are left out.
    pub fn build(lines: &[LedgerLine], start: NaiveDate, end: NaiveDate) -> Self {
        let mut income = Vec::new();
        let mut expenses = Vec::new();

        for t in totals_by_account(lines.iter().filter(|l| within(l, start, end))) {
            if t.account_type.is_income() {
                income.push(row(&t, t.credits - t.debits));
            } else if t.account_type.is_expense() {
                expenses.push(row(&t, t.debits - t.credits));
            }
        }
        income.retain(|r| !r.amount.is_zero());
        expenses.retain(|r| !r.amount.is_zero());

        let total_income: Money = income.iter().map(|r| r.amount).sum();
        let total_expenses: Money = expenses.iter().map(|r| r.amount).sum();

        Self {
            start_date: start,
            end_date: end,
            income,
            expenses,
            total_income,
            total_expenses,
            net_income: total_income - total_expenses,
        }
    }
}

fn row(t: &AccountTotals, amount: Money) -> ReportRow {
    ReportRow {
        account_id: Some(t.account_id),
        account_name: t.account_name.clone(),
        account_type: t.account_type,
        amount,
    }
}

/// Net income (income less expenses) over every line dated on or before `as_of`.
pub fn net_income_through(lines: &[LedgerLine], as_of: NaiveDate) -> Money {
    lines
        .iter()
        .filter(|l| l.entry_date <= as_of)
        .map(|l| {
            if l.account_type.is_income() {
                l.credit - l.debit
            } else if l.account_type.is_expense() {
                l.debit - l.credit
            } else {
                Money::ZERO
            }
        })
        .sum()
}

// =============================================================================
// Balance sheet
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub assets: Vec<ReportRow>,
    pub liabilities: Vec<ReportRow>,
    pub equity: Vec<ReportRow>,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub total_equity: Money,
    pub total_liabilities_and_equity: Money,
    pub balanced: bool,
}

impl BalanceSheet {
    /// Position as of a date. Equity carries accumulated net income as a
    /// synthetic retained earnings line.
    pub fn build(lines: &[LedgerLine], as_of: NaiveDate) -> Self {
        let mut assets = Vec::new();
        let mut liabilities = Vec::new();
        let mut equity = Vec::new();

        for t in totals_by_account(lines.iter().filter(|l| l.entry_date <= as_of)) {
            if t.account_type.is_asset() {
                assets.push(row(&t, t.debits - t.credits));
            } else if t.account_type.is_liability() {
                liabilities.push(row(&t, t.credits - t.debits));
            } else if t.account_type.is_equity() {
                equity.push(row(&t, t.credits - t.debits));
            }
        }
        assets.retain(|r| !r.amount.is_zero());
        liabilities.retain(|r| !r.amount.is_zero());
        equity.retain(|r| !r.amount.is_zero());

        let retained = net_income_through(lines, as_of);
        if !retained.is_zero() {
            equity.push(ReportRow {
                account_id: None,
                account_name: RETAINED_EARNINGS_LABEL.to_string(),
                account_type: AccountType::Equity,
                amount: retained,
            });
        }

        let total_assets: Money = assets.iter().map(|r| r.amount).sum();
        let total_liabilities: Money = liabilities.iter().map(|r| r.amount).sum();
        let total_equity: Money = equity.iter().map(|r| r.amount).sum();
        let total_liabilities_and_equity = total_liabilities + total_equity;

        Self {
            as_of,
            assets,
            liabilities,
            equity,
            total_assets,
            total_liabilities,
            total_equity,
            total_liabilities_and_equity,
            balanced: total_assets == total_liabilities_and_equity,
        }
    }
}

// =============================================================================
// Monthly trends
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MonthlyProfitAndLoss {
    pub month: u32,
    pub month_name: String,
    pub income: Money,
    pub expenses: Money,
    pub net_profit: Money,
}

/// Twelve income / expense buckets for a calendar year.
pub fn monthly_profit_and_loss(lines: &[LedgerLine], year: i32) -> Vec<MonthlyProfitAndLoss> {
    let mut months: Vec<MonthlyProfitAndLoss> = MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| MonthlyProfitAndLoss {
            month: i as u32 + 1,
            month_name: name.to_string(),
            income: Money::ZERO,
            expenses: Money::ZERO,
            net_profit: Money::ZERO,
        })
        .collect();

    for line in lines.iter().filter(|l| l.entry_date.year() == year) {
        let bucket = &mut months[line.entry_date.month0() as usize];
        if line.account_type.is_income() {
            bucket.income += line.credit - line.debit;
        } else if line.account_type.is_expense() {
            bucket.expenses += line.debit - line.credit;
        }
    }

    for bucket in &mut months {
        bucket.net_profit = bucket.income - bucket.expenses;
    }
    months
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MonthlyBalance {
    pub month: u32,
    pub month_name: String,
    pub assets: Money,
    pub liabilities: Money,
    pub equity: Money,
}

/// Cumulative assets, liabilities and equity at each month end of a year.
/// Equity includes net income earned to date.
pub fn monthly_balances(lines: &[LedgerLine], year: i32) -> Vec<MonthlyBalance> {
    (1..=12u32)
        .filter_map(|month| {
            let end = month_end(year, month)?;
            let mut assets = Money::ZERO;
            let mut liabilities = Money::ZERO;
            let mut equity = Money::ZERO;

            for line in lines.iter().filter(|l| l.entry_date <= end) {
                let t = line.account_type;
                if t.is_asset() {
                    assets += line.debit - line.credit;
                } else if t.is_liability() {
                    liabilities += line.credit - line.debit;
                } else if t.is_equity() || t.is_income() {
                    equity += line.credit - line.debit;
                } else if t.is_expense() {
                    equity -= line.debit - line.credit;
                }
            }

            Some(MonthlyBalance {
                month,
                month_name: MONTH_NAMES[month as usize - 1].to_string(),
                assets,
                liabilities,
                equity,
            })
        })
        .collect()
}

// =============================================================================
// Party balances
// =============================================================================

/// Receivable balance for a customer: AR debits less credits.
pub fn customer_balance(lines: &[LedgerLine], customer_id: Uuid) -> Money {
    lines
        .iter()
        .filter(|l| {
            l.account_type == AccountType::AccountsReceivable && l.customer_id == Some(customer_id)
        })
        .map(|l| l.debit - l.credit)
        .sum()
}

/// Payable balance for a supplier: AP credits less debits.
pub fn supplier_balance(lines: &[LedgerLine], supplier_id: Uuid) -> Money {
    lines
        .iter()
        .filter(|l| {
            l.account_type == AccountType::AccountsPayable && l.supplier_id == Some(supplier_id)
        })
        .map(|l| l.credit - l.debit)
        .sum()
}

/// Combined balance of every Bank-type account.
pub fn bank_balance(lines: &[LedgerLine]) -> Money {
    lines
        .iter()
        .filter(|l| l.account_type == AccountType::Bank)
        .map(|l| l.debit - l.credit)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn line(id: Uuid, name: &str, t: AccountType, on: NaiveDate, dr: i64, cr: i64) -> LedgerLine {
        LedgerLine {
            account_id: id,
            account_name: name.to_string(),
            account_type: t,
            entry_date: on,
            debit: Money::from_cents(dr),
            credit: Money::from_cents(cr),
            customer_id: None,
            supplier_id: None,
        }
    }

    fn sample() -> Vec<LedgerLine> {
        let bank = Uuid::new_v4();
        let sales = Uuid::new_v4();
        let rent = Uuid::new_v4();
        let capital = Uuid::new_v4();
        vec![
            line(bank, "Operating Account", AccountType::Bank, date(1, 2), 500000, 0),
            line(capital, "Owner Capital", AccountType::Equity, date(1, 2), 0, 500000),
            line(bank, "Operating Account", AccountType::Bank, date(1, 15), 120000, 0),
            line(sales, "Sales", AccountType::Income, date(1, 15), 0, 120000),
            line(rent, "Rent", AccountType::Expenses, date(2, 1), 80000, 0),
            line(bank, "Operating Account", AccountType::Bank, date(2, 1), 0, 80000),
        ]
    }

    #[test]
    fn test_trial_balance_is_balanced() {
        let tb = TrialBalance::build(&sample());
        assert!(tb.balanced);
        assert_eq!(tb.total_debits.cents(), 700000);
        assert_eq!(tb.rows[0].account_type, AccountType::Bank);
        assert_eq!(tb.rows[0].balance.cents(), 540000);
    }

    #[test]
    fn test_profit_and_loss_window() {
        let pnl = ProfitAndLoss::build(&sample(), date(1, 1), date(1, 31));
        assert_eq!(pnl.total_income.cents(), 120000);
        assert!(pnl.expenses.is_empty());
        assert_eq!(pnl.net_income.cents(), 120000);

        let full = ProfitAndLoss::build(&sample(), date(1, 1), date(12, 31));
        assert_eq!(full.net_income.cents(), 40000);
    }

    #[test]
    fn test_balance_sheet_carries_retained_earnings() {
        let bs = BalanceSheet::build(&sample(), date(3, 1));
        assert_eq!(bs.total_assets.cents(), 540000);
        let retained = bs
            .equity
            .iter()
            .find(|r| r.account_name == RETAINED_EARNINGS_LABEL)
            .unwrap();
        assert_eq!(retained.amount.cents(), 40000);
        assert!(bs.balanced);
    }

    #[test]
    fn test_monthly_buckets() {
        let pnl = monthly_profit_and_loss(&sample(), 2025);
        assert_eq!(pnl.len(), 12);
        assert_eq!(pnl[0].month_name, "Jan");
        assert_eq!(pnl[0].net_profit.cents(), 120000);
        assert_eq!(pnl[1].net_profit.cents(), -80000);
        assert_eq!(pnl[11].net_profit, Money::ZERO);

        let balances = monthly_balances(&sample(), 2025);
        assert_eq!(balances.len(), 12);
        assert_eq!(balances[0].assets.cents(), 620000);
        assert_eq!(balances[1].assets, balances[1].liabilities + balances[1].equity);
    }

    #[test]
    fn test_party_balances() {
        let ar = Uuid::new_v4();
        let customer = Uuid::new_v4();
        let mut invoice = line(ar, "Accounts Receivable", AccountType::AccountsReceivable, date(1, 1), 10000, 0);
        invoice.customer_id = Some(customer);
        let mut payment = line(ar, "Accounts Receivable", AccountType::AccountsReceivable, date(1, 9), 0, 4000);
        payment.customer_id = Some(customer);

        let lines = vec![invoice, payment];
        assert_eq!(customer_balance(&lines, customer).cents(), 6000);
        assert_eq!(customer_balance(&lines, Uuid::new_v4()), Money::ZERO);
        assert_eq!(supplier_balance(&lines, customer), Money::ZERO);
    }
}
