//! Financial statements, aging and the dashboard.
//!
//! Everything is computed from journal lines at read time.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::reports::{bank_balance, monthly_balances, monthly_profit_and_loss};
use domain::{
    AgingItem, AgingKind, AgingReport, BalanceSheet, Dashboard, MonthlyBalance,
    MonthlyProfitAndLoss, ProfitAndLoss, ReportPeriod, TrialBalance,
};

use crate::repository::{
    AccountRepository, BankRepository, BillFilter, DocumentRepository, InvoiceFilter,
    JournalRepository,
};

#[async_trait]
pub trait ReportService: Send + Sync {
    async fn trial_balance(&self, as_of: Option<NaiveDate>) -> AppResult<TrialBalance>;

    /// Profit and loss, defaulting to January 1 through `today`
    async fn profit_and_loss(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> AppResult<ProfitAndLoss>;

    async fn balance_sheet(&self, as_of: NaiveDate) -> AppResult<BalanceSheet>;

    async fn monthly_profit_and_loss(&self, year: i32) -> AppResult<Vec<MonthlyProfitAndLoss>>;

    async fn monthly_balances(&self, year: i32) -> AppResult<Vec<MonthlyBalance>>;

    async fn aging(&self, kind: AgingKind, as_of: NaiveDate) -> AppResult<AgingReport>;

    async fn dashboard(&self, period: ReportPeriod, today: NaiveDate) -> AppResult<Dashboard>;
}

pub struct ReportManager {
    journal: Arc<dyn JournalRepository>,
    documents: Arc<dyn DocumentRepository>,
    accounts: Arc<dyn AccountRepository>,
    bank: Arc<dyn BankRepository>,
}

impl ReportManager {
    pub fn new(
        journal: Arc<dyn JournalRepository>,
        documents: Arc<dyn DocumentRepository>,
        accounts: Arc<dyn AccountRepository>,
        bank: Arc<dyn BankRepository>,
    ) -> Self {
        Self {
            journal,
            documents,
            accounts,
            bank,
        }
    }

    async fn receivable_items(&self) -> AppResult<Vec<AgingItem>> {
        let (invoices, customers) = futures::try_join!(
            self.documents.list_invoices(InvoiceFilter::default()),
            self.accounts.list_customers()
        )?;
        let names: HashMap<Uuid, String> = customers
            .into_iter()
            .map(|c| (c.id, c.display_name))
            .collect();

        Ok(invoices
            .iter()
            .filter(|i| i.is_open())
            .map(|i| AgingItem::from_invoice(i, party_name(&names, i.customer_id)))
            .collect())
    }

    async fn payable_items(&self) -> AppResult<Vec<AgingItem>> {
        let (bills, suppliers) = futures::try_join!(
            self.documents.list_bills(BillFilter::default()),
            self.accounts.list_suppliers()
        )?;
        let names: HashMap<Uuid, String> = suppliers
            .into_iter()
            .map(|s| (s.id, s.display_name))
            .collect();

        Ok(bills
            .iter()
            .filter(|b| b.is_open())
            .map(|b| AgingItem::from_bill(b, party_name(&names, b.supplier_id)))
            .collect())
    }
}

fn party_name(names: &HashMap<Uuid, String>, id: Uuid) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string())
}

fn start_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

#[async_trait]
impl ReportService for ReportManager {
    async fn trial_balance(&self, as_of: Option<NaiveDate>) -> AppResult<TrialBalance> {
        let lines = self.journal.ledger_lines(as_of).await?;
        Ok(TrialBalance::build(&lines))
    }

    async fn profit_and_loss(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> AppResult<ProfitAndLoss> {
        let end = end.unwrap_or(today);
        let start = start.unwrap_or_else(|| start_of_year(end));
        if start > end {
            return Err(AppError::validation("Start date must not be after end date"));
        }

        let lines = self.journal.ledger_lines(Some(end)).await?;
        Ok(ProfitAndLoss::build(&lines, start, end))
    }

    async fn balance_sheet(&self, as_of: NaiveDate) -> AppResult<BalanceSheet> {
        let lines = self.journal.ledger_lines(Some(as_of)).await?;
        Ok(BalanceSheet::build(&lines, as_of))
    }

    async fn monthly_profit_and_loss(&self, year: i32) -> AppResult<Vec<MonthlyProfitAndLoss>> {
        let lines = self.journal.ledger_lines(None).await?;
        Ok(monthly_profit_and_loss(&lines, year))
    }

    async fn monthly_balances(&self, year: i32) -> AppResult<Vec<MonthlyBalance>> {
        let lines = self.journal.ledger_lines(None).await?;
        Ok(monthly_balances(&lines, year))
    }

    async fn aging(&self, kind: AgingKind, as_of: NaiveDate) -> AppResult<AgingReport> {
        let items = match kind {
            AgingKind::Receivables => self.receivable_items().await?,
            AgingKind::Payables => self.payable_items().await?,
        };
        Ok(AgingReport::build(&items, as_of))
    }

    async fn dashboard(&self, period: ReportPeriod, today: NaiveDate) -> AppResult<Dashboard> {
        let ranges = period.ranges(today);

        let (lines, receivables, payables, for_review) = futures::try_join!(
            self.journal.ledger_lines(Some(today)),
            self.receivable_items(),
            self.payable_items(),
            self.bank.count_for_review()
        )?;

        let current = ProfitAndLoss::build(&lines, ranges.start, ranges.end);
        let previous = ProfitAndLoss::build(&lines, ranges.prev_start, ranges.prev_end);

        Ok(Dashboard {
            open_receivables: receivables.iter().map(|i| i.amount_due).sum(),
            open_payables: payables.iter().map(|i| i.amount_due).sum(),
            bank_balance: bank_balance(&lines),
            transactions_for_review: for_review,
            ..Dashboard::from_statements(period, &current, &previous)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{
        AccountType, Customer, Invoice, InvoiceStatus, LedgerLine, Money, TrendDirection,
    };

    use crate::repository::{
        MockAccountRepository, MockBankRepository, MockDocumentRepository, MockJournalRepository,
    };

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn line(account_type: AccountType, date: NaiveDate, debit: i64, credit: i64) -> LedgerLine {
        LedgerLine {
            account_id: Uuid::from_u128(account_type as u128 + 1),
            account_name: account_type.as_str().to_string(),
            account_type,
            entry_date: date,
            debit: Money::from_cents(debit),
            credit: Money::from_cents(credit),
            customer_id: None,
            supplier_id: None,
        }
    }

    fn sale(date: NaiveDate, cents: i64) -> Vec<LedgerLine> {
        vec![
            line(AccountType::Bank, date, cents, 0),
            line(AccountType::Income, date, 0, cents),
        ]
    }

    fn invoice(customer_id: Uuid, due: NaiveDate, cents: i64, status: InvoiceStatus) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            invoice_number: format!("INV-{}", cents),
            customer_id,
            invoice_date: due,
            due_date: Some(due),
            subtotal: Money::from_cents(cents),
            tax_amount: Money::ZERO,
            total: Money::from_cents(cents),
            amount_paid: Money::ZERO,
            amount_due: Money::from_cents(cents),
            status,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct Mocks {
        journal: MockJournalRepository,
        documents: MockDocumentRepository,
        accounts: MockAccountRepository,
        bank: MockBankRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                journal: MockJournalRepository::new(),
                documents: MockDocumentRepository::new(),
                accounts: MockAccountRepository::new(),
                bank: MockBankRepository::new(),
            }
        }

        fn into_service(self) -> ReportManager {
            ReportManager::new(
                Arc::new(self.journal),
                Arc::new(self.documents),
                Arc::new(self.accounts),
                Arc::new(self.bank),
            )
        }
    }

    #[tokio::test]
    async fn test_profit_and_loss_defaults_to_year_to_date() {
        let mut mocks = Mocks::new();
        mocks
            .journal
            .expect_ledger_lines()
            .withf(|through| *through == Some(NaiveDate::from_ymd_opt(2025, 8, 15).unwrap()))
            .returning(|_| {
                let mut lines = sale(d(2024, 12, 30), 99_999);
                lines.extend(sale(d(2025, 2, 10), 25_050));
                Ok(lines)
            });

        let service = mocks.into_service();
        let report = service
            .profit_and_loss(None, None, d(2025, 8, 15))
            .await
            .unwrap();

        assert_eq!(report.start_date, d(2025, 1, 1));
        assert_eq!(report.total_income, Money::from_cents(25_050));
    }

    #[tokio::test]
    async fn test_aging_groups_open_invoices_by_customer() {
        let ana = Uuid::new_v4();
        let invoices = vec![
            invoice(ana, d(2025, 6, 1), 10_000, InvoiceStatus::Sent),
            invoice(ana, d(2025, 3, 1), 5_000, InvoiceStatus::Partial),
            invoice(ana, d(2025, 6, 1), 8_000, InvoiceStatus::Paid),
        ];

        let mut mocks = Mocks::new();
        mocks
            .documents
            .expect_list_invoices()
            .returning(move |_| Ok(invoices.clone()));
        mocks.accounts.expect_list_customers().returning(move || {
            Ok(vec![Customer {
                id: ana,
                display_name: "Ana Lima".to_string(),
                company: None,
                email: None,
                phone: None,
                is_active: true,
                created_at: Utc::now(),
            }])
        });

        let service = mocks.into_service();
        let report = service
            .aging(AgingKind::Receivables, d(2025, 6, 20))
            .await
            .unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].name, "Ana Lima");
        assert_eq!(report.totals.days_1_30, Money::from_cents(10_000));
        assert_eq!(report.totals.over_90, Money::from_cents(5_000));
        assert_eq!(report.totals.total, Money::from_cents(15_000));
    }

    #[tokio::test]
    async fn test_dashboard_compares_against_previous_window() {
        let today = d(2025, 8, 31);

        let mut mocks = Mocks::new();
        mocks.journal.expect_ledger_lines().returning(move |_| {
            let mut lines = sale(d(2025, 8, 20), 15_000);
            lines.extend(sale(d(2025, 7, 20), 10_000));
            Ok(lines)
        });
        mocks.documents.expect_list_invoices().returning(|_| Ok(vec![]));
        mocks.documents.expect_list_bills().returning(|_| Ok(vec![]));
        mocks.accounts.expect_list_customers().returning(|| Ok(vec![]));
        mocks.accounts.expect_list_suppliers().returning(|| Ok(vec![]));
        mocks.bank.expect_count_for_review().returning(|| Ok(3));

        let service = mocks.into_service();
        let dashboard = service
            .dashboard(ReportPeriod::Last30Days, today)
            .await
            .unwrap();

        assert_eq!(dashboard.revenue.value, Money::from_cents(15_000));
        assert_eq!(dashboard.revenue.trend.direction, TrendDirection::Up);
        assert_eq!(dashboard.revenue.trend.pct, "+50.0%");
        assert_eq!(dashboard.bank_balance, Money::from_cents(25_000));
        assert_eq!(dashboard.transactions_for_review, 3);
    }
}
