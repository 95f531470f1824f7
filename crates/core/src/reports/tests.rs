//! Service and property tests for report generation.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ReportError;
use super::repository::{BalanceSheetQuery, LedgerQuery, ReportQuery, ReportRepository};
use super::service::ReportService;
use super::statements::{self, NET_PROFIT_OR_LOSS_NAME};
use super::types::{
    AccountAmountRow, AccountCategory, AccountInfo, BalanceSide, LedgerAccountRaw, LedgerRowMode,
    TrialBalanceRow, signed_net,
};

// ============================================================================
// Fixtures
// ============================================================================

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn account(code: &str, category: AccountCategory) -> AccountInfo {
    AccountInfo {
        account_code: code.to_string(),
        account_name: format!("Account {code}"),
        account_category: category,
        account_balance_type: 0,
        account_group: "01".to_string(),
        account_level: 1,
        consolidate_account_code: None,
    }
}

fn amount_row(code: &str, category: AccountCategory, debit: Decimal, credit: Decimal) -> AccountAmountRow {
    AccountAmountRow {
        account: account(code, category),
        debit_amount: debit,
        credit_amount: credit,
    }
}

fn tb_row(
    account: AccountInfo,
    opening: (Decimal, Decimal),
    movement: (Decimal, Decimal),
) -> TrialBalanceRow {
    TrialBalanceRow {
        account,
        balance_debit_amount: opening.0,
        balance_credit_amount: opening.1,
        debit_amount: movement.0,
        credit_amount: movement.1,
        next_balance_debit_amount: opening.0 + movement.0,
        next_balance_credit_amount: opening.1 + movement.1,
    }
}

fn report_query() -> ReportQuery {
    ReportQuery {
        shop_id: "SHOP1".to_string(),
        account_group: "01".to_string(),
        include_closing_mode: false,
        start_date: at(2022, 5, 1),
        end_date: at(2022, 5, 31),
    }
}

fn balance_sheet_query() -> BalanceSheetQuery {
    BalanceSheetQuery {
        shop_id: "SHOP1".to_string(),
        account_group: "01".to_string(),
        include_closing_mode: false,
        end_date: at(2022, 5, 31),
    }
}

fn ledger_row(
    mode: LedgerRowMode,
    code: &str,
    day: u32,
    doc_no: &str,
    debit: Decimal,
    credit: Decimal,
    amount: Decimal,
) -> LedgerAccountRaw {
    LedgerAccountRaw {
        row_mode: mode,
        doc_date: at(2022, 5, day),
        doc_no: doc_no.to_string(),
        account_code: code.to_string(),
        account_name: format!("Account {code}"),
        account_description: String::new(),
        account_group: "01".to_string(),
        consolidate_account_code: None,
        debit_amount: debit,
        credit_amount: credit,
        amount,
    }
}

fn opening(code: &str, amount: Decimal) -> LedgerAccountRaw {
    ledger_row(LedgerRowMode::Opening, code, 1, "", dec!(0), dec!(0), amount)
}

fn posting(code: &str, day: u32, doc_no: &str, debit: Decimal, credit: Decimal) -> LedgerAccountRaw {
    ledger_row(LedgerRowMode::Transaction, code, day, doc_no, debit, credit, dec!(0))
}

/// Ledger rows matching the reference running-balance fixture.
fn ledger_fixture() -> Vec<LedgerAccountRaw> {
    vec![
        opening("AC001", dec!(75)),
        posting("AC001", 2, "JV001", dec!(50), dec!(0)),
        posting("AC001", 3, "JV002", dec!(50), dec!(0)),
        opening("AC002", dec!(200)),
        posting("AC002", 2, "JV003", dec!(0), dec!(250)),
        opening("AC003", dec!(-50)),
        posting("AC003", 2, "JV004", dec!(100), dec!(0)),
        opening("AC004", dec!(-50)),
        posting("AC004", 2, "JV005", dec!(0), dec!(100)),
        opening("AC005", dec!(0)),
        posting("AC005", 2, "JV006", dec!(100.35), dec!(0)),
        posting("AC005", 3, "JV007", dec!(0), dec!(100.35)),
    ]
}

/// Mock repository for testing.
#[derive(Default)]
struct MockReportRepository {
    trial_balance: Vec<TrialBalanceRow>,
    balance_sheet: Vec<AccountAmountRow>,
    profit_and_loss: Vec<AccountAmountRow>,
    ledger: Vec<LedgerAccountRaw>,
    chart: Vec<AccountInfo>,
    failure: Option<ReportError>,
}

impl MockReportRepository {
    fn failing(message: &str) -> Self {
        Self {
            failure: Some(ReportError::Repository(message.to_string())),
            ..Self::default()
        }
    }

    fn respond<T: Clone>(&self, rows: &[T]) -> Result<Vec<T>, ReportError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(rows.to_vec()),
        }
    }
}

impl ReportRepository for MockReportRepository {
    async fn get_data_trial_balance(
        &self,
        _query: &ReportQuery,
    ) -> Result<Vec<TrialBalanceRow>, ReportError> {
        self.respond(&self.trial_balance)
    }

    async fn get_data_profit_and_loss(
        &self,
        _query: &ReportQuery,
    ) -> Result<Vec<AccountAmountRow>, ReportError> {
        self.respond(&self.profit_and_loss)
    }

    async fn get_data_balance_sheet(
        &self,
        _query: &BalanceSheetQuery,
    ) -> Result<Vec<AccountAmountRow>, ReportError> {
        self.respond(&self.balance_sheet)
    }

    async fn get_data_ledger_account(
        &self,
        _query: &LedgerQuery,
    ) -> Result<Vec<LedgerAccountRaw>, ReportError> {
        self.respond(&self.ledger)
    }

    async fn get_chart_of_accounts(
        &self,
        _shop_id: &str,
        _account_group: &str,
    ) -> Result<Vec<AccountInfo>, ReportError> {
        self.respond(&self.chart)
    }
}

fn service(repo: MockReportRepository) -> ReportService<MockReportRepository> {
    ReportService::new(Arc::new(repo))
}

// ============================================================================
// Sign convention
// ============================================================================

#[rstest]
#[case(AccountCategory::Asset, dec!(100), dec!(30), dec!(70))]
#[case(AccountCategory::Income, dec!(30), dec!(100), dec!(70))]
#[case(AccountCategory::Expense, dec!(30), dec!(100), dec!(-70))]
#[case(AccountCategory::Liability, dec!(10), dec!(4), dec!(-6))]
#[case(AccountCategory::Equity, dec!(0), dec!(0), dec!(0))]
fn test_signed_net(
    #[case] category: AccountCategory,
    #[case] debit: Decimal,
    #[case] credit: Decimal,
    #[case] expected: Decimal,
) {
    assert_eq!(signed_net(category, debit, credit), expected);
}

#[rstest]
#[case(AccountCategory::Asset, dec!(5), BalanceSide::Debit)]
#[case(AccountCategory::Asset, dec!(-5), BalanceSide::Credit)]
#[case(AccountCategory::Income, dec!(5), BalanceSide::Credit)]
#[case(AccountCategory::Liability, dec!(-5), BalanceSide::Debit)]
#[case(AccountCategory::Expense, dec!(0), BalanceSide::Debit)]
fn test_balance_side(
    #[case] category: AccountCategory,
    #[case] signed: Decimal,
    #[case] expected: BalanceSide,
) {
    assert_eq!(BalanceSide::for_amount(category, signed), expected);
}

#[test]
fn test_account_category_round_trips_as_integer() {
    let json = serde_json::to_string(&AccountCategory::Income).unwrap();
    assert_eq!(json, "4");
    assert_eq!(
        serde_json::from_str::<AccountCategory>("5").unwrap(),
        AccountCategory::Expense
    );
    assert!(serde_json::from_str::<AccountCategory>("9").is_err());
    assert_eq!(
        AccountCategory::try_from(0),
        Err(ReportError::InvalidAccountCategory(0))
    );
}

// ============================================================================
// Trial balance
// ============================================================================

#[tokio::test]
async fn test_trial_balance_drops_zero_rows_and_totals_survivors() {
    let repo = MockReportRepository {
        trial_balance: vec![
            tb_row(account("1100", AccountCategory::Asset), (dec!(100), dec!(0)), (dec!(50), dec!(0))),
            tb_row(account("2100", AccountCategory::Liability), (dec!(0), dec!(100)), (dec!(0), dec!(50))),
            tb_row(account("3100", AccountCategory::Equity), (dec!(0), dec!(0)), (dec!(0), dec!(0))),
            tb_row(account("1200", AccountCategory::Asset), (dec!(20), dec!(20)), (dec!(5), dec!(5))),
        ],
        ..MockReportRepository::default()
    };

    let report = service(repo)
        .process_trial_balance_sheet_report(&report_query(), false)
        .await
        .unwrap();

    let codes: Vec<_> = report
        .account_details
        .iter()
        .map(|d| d.account.account_code.as_str())
        .collect();
    assert_eq!(codes, ["1100", "2100"]);

    let asset = &report.account_details[0];
    assert_eq!(asset.balance_amount, dec!(100));
    assert_eq!(asset.amount, dec!(50));
    assert_eq!(asset.next_balance_amount, dec!(150));
    assert_eq!(asset.next_balance_side, BalanceSide::Debit);

    let liability = &report.account_details[1];
    assert_eq!(liability.next_balance_amount, dec!(150));
    assert_eq!(liability.next_balance_side, BalanceSide::Credit);

    assert_eq!(report.total_balance_debit, dec!(100));
    assert_eq!(report.total_balance_credit, dec!(100));
    assert_eq!(report.total_amount_debit, dec!(50));
    assert_eq!(report.total_amount_credit, dec!(50));
    assert_eq!(report.total_next_balance_debit, dec!(150));
    assert_eq!(report.total_next_balance_credit, dec!(150));
    assert!(report.is_balanced);
    assert_eq!(report.account_group, "01");
    assert_eq!(report.start_date, at(2022, 5, 1));
}

#[tokio::test]
async fn test_trial_balance_reports_imbalance_without_rejecting() {
    let repo = MockReportRepository {
        trial_balance: vec![tb_row(
            account("1100", AccountCategory::Asset),
            (dec!(0), dec!(0)),
            (dec!(10), dec!(0)),
        )],
        ..MockReportRepository::default()
    };

    let report = service(repo)
        .process_trial_balance_sheet_report(&report_query(), false)
        .await
        .unwrap();

    assert!(!report.is_balanced);
    assert_eq!(report.account_details.len(), 1);
}

#[tokio::test]
async fn test_trial_balance_consolidates_to_roots() {
    let mut cash = account("1110", AccountCategory::Asset);
    cash.consolidate_account_code = Some("1100".to_string());
    let mut bank = account("1120", AccountCategory::Asset);
    bank.consolidate_account_code = Some("1100".to_string());
    let parent = account("1100", AccountCategory::Asset);

    let repo = MockReportRepository {
        trial_balance: vec![
            tb_row(cash.clone(), (dec!(10), dec!(0)), (dec!(5), dec!(0))),
            tb_row(bank.clone(), (dec!(20), dec!(0)), (dec!(0), dec!(3))),
        ],
        chart: vec![parent, cash, bank],
        ..MockReportRepository::default()
    };

    let report = service(repo)
        .process_trial_balance_sheet_report(&report_query(), true)
        .await
        .unwrap();

    assert_eq!(report.account_details.len(), 1);
    let line = &report.account_details[0];
    assert_eq!(line.account.account_code, "1100");
    assert_eq!(line.balance_amount, dec!(30));
    assert_eq!(line.amount, dec!(2));
    assert_eq!(line.next_balance_amount, dec!(32));
}

// ============================================================================
// Balance sheet
// ============================================================================

#[tokio::test]
async fn test_balance_sheet_without_profit_has_no_synthetic_row() {
    let repo = MockReportRepository {
        balance_sheet: vec![
            amount_row("1100", AccountCategory::Asset, dec!(500), dec!(0)),
            amount_row("2100", AccountCategory::Liability, dec!(0), dec!(200)),
            amount_row("3100", AccountCategory::Equity, dec!(0), dec!(300)),
            amount_row("4100", AccountCategory::Income, dec!(0), dec!(0)),
        ],
        ..MockReportRepository::default()
    };

    let report = service(repo)
        .process_balance_sheet_report(&balance_sheet_query())
        .await
        .unwrap();

    assert_eq!(report.owners_equities.len(), 1);
    assert_eq!(report.total_owners_equity_amount, dec!(300));
    assert_eq!(report.total_liability_and_owners_equity_amount, dec!(500));
    assert!(report.is_balanced);
}

#[tokio::test]
async fn test_balance_sheet_injects_net_profit_into_equity() {
    let repo = MockReportRepository {
        balance_sheet: vec![
            amount_row("1100", AccountCategory::Asset, dec!(400), dec!(0)),
            amount_row("3100", AccountCategory::Equity, dec!(0), dec!(300)),
            amount_row("4100", AccountCategory::Income, dec!(0), dec!(100)),
        ],
        ..MockReportRepository::default()
    };

    let report = service(repo)
        .process_balance_sheet_report(&balance_sheet_query())
        .await
        .unwrap();

    assert_eq!(report.assets.len(), 1);
    assert!(report.liabilities.is_empty());
    assert_eq!(report.owners_equities.len(), 2);

    let synthetic = &report.owners_equities[1];
    assert_eq!(synthetic.account.account_code, "");
    assert_eq!(synthetic.account.account_name, NET_PROFIT_OR_LOSS_NAME);
    assert_eq!(synthetic.account.account_category, AccountCategory::Equity);
    assert_eq!(synthetic.amount, dec!(100));

    assert_eq!(report.total_owners_equity_amount, dec!(400));
    assert_eq!(report.total_asset_amount, dec!(400));
    assert!(report.is_balanced);
}

#[tokio::test]
async fn test_balance_sheet_net_loss_is_negative() {
    let repo = MockReportRepository {
        balance_sheet: vec![
            amount_row("1100", AccountCategory::Asset, dec!(0), dec!(40)),
            amount_row("5100", AccountCategory::Expense, dec!(40), dec!(0)),
        ],
        ..MockReportRepository::default()
    };

    let report = service(repo)
        .process_balance_sheet_report(&balance_sheet_query())
        .await
        .unwrap();

    assert_eq!(report.owners_equities.len(), 1);
    assert_eq!(report.owners_equities[0].amount, dec!(-40));
    assert_eq!(report.total_asset_amount, dec!(-40));
    assert!(report.is_balanced);
}

// ============================================================================
// Profit and loss
// ============================================================================

#[tokio::test]
async fn test_profit_and_loss_routes_expenses_to_expenses() {
    let repo = MockReportRepository {
        profit_and_loss: vec![
            amount_row("4100", AccountCategory::Income, dec!(0), dec!(1000)),
            amount_row("4200", AccountCategory::Income, dec!(10), dec!(10)),
            amount_row("5100", AccountCategory::Expense, dec!(600), dec!(0)),
            amount_row("5200", AccountCategory::Expense, dec!(150.50), dec!(0.50)),
        ],
        ..MockReportRepository::default()
    };

    let report = service(repo)
        .process_profit_and_loss_sheet_report(&report_query())
        .await
        .unwrap();

    let incomes: Vec<_> = report.incomes.iter().map(|l| l.account.account_code.as_str()).collect();
    let expenses: Vec<_> = report.expenses.iter().map(|l| l.account.account_code.as_str()).collect();
    assert_eq!(incomes, ["4100"]);
    assert_eq!(expenses, ["5100", "5200"]);

    assert_eq!(report.total_income_amount, dec!(1000));
    assert_eq!(report.total_expense_amount, dec!(750));
    assert_eq!(report.profit_and_loss_amount, dec!(250));
}

// ============================================================================
// Ledger
// ============================================================================

#[rstest]
#[case("AC001", dec!(75), dec!(175))]
#[case("AC002", dec!(200), dec!(-50))]
#[case("AC003", dec!(-50), dec!(50))]
#[case("AC004", dec!(-50), dec!(-150))]
#[case("AC005", dec!(0), dec!(0))]
#[tokio::test]
async fn test_ledger_running_balance(
    #[case] code: &str,
    #[case] balance: Decimal,
    #[case] next_balance: Decimal,
) {
    let repo = MockReportRepository {
        ledger: ledger_fixture(),
        ..MockReportRepository::default()
    };

    let accounts = service(repo)
        .process_ledger_account(&LedgerQuery::default())
        .await
        .unwrap();

    assert_eq!(accounts.len(), 5);
    let account = accounts.iter().find(|a| a.account_code == code).unwrap();
    assert_eq!(account.balance, balance);
    assert_eq!(account.next_balance, next_balance);
}

#[tokio::test]
async fn test_ledger_details_carry_running_snapshots() {
    let repo = MockReportRepository {
        ledger: ledger_fixture(),
        ..MockReportRepository::default()
    };

    let accounts = service(repo)
        .process_ledger_account(&LedgerQuery::default())
        .await
        .unwrap();

    let codes: Vec<_> = accounts.iter().map(|a| a.account_code.as_str()).collect();
    assert_eq!(codes, ["AC001", "AC002", "AC003", "AC004", "AC005"]);

    let running: Vec<_> = accounts[0].details.iter().map(|d| d.amount).collect();
    assert_eq!(running, [dec!(125), dec!(175)]);
    assert_eq!(accounts[0].details[0].doc_no, "JV001");

    let ac005: Vec<_> = accounts[4].details.iter().map(|d| d.amount).collect();
    assert_eq!(ac005, [dec!(100.35), dec!(0)]);
}

#[tokio::test]
async fn test_ledger_account_without_transactions_keeps_opening() {
    let repo = MockReportRepository {
        ledger: vec![opening("AC009", dec!(42))],
        ..MockReportRepository::default()
    };

    let accounts = service(repo)
        .process_ledger_account(&LedgerQuery::default())
        .await
        .unwrap();

    assert_eq!(accounts[0].balance, dec!(42));
    assert_eq!(accounts[0].next_balance, dec!(42));
    assert!(accounts[0].details.is_empty());
}

// ============================================================================
// Failure and determinism
// ============================================================================

#[tokio::test]
async fn test_repository_errors_propagate_unchanged() {
    let expected = ReportError::Repository("connection refused".to_string());
    let service = service(MockReportRepository::failing("connection refused"));

    assert_eq!(
        service
            .process_trial_balance_sheet_report(&report_query(), false)
            .await,
        Err(expected.clone())
    );
    assert_eq!(
        service.process_balance_sheet_report(&balance_sheet_query()).await,
        Err(expected.clone())
    );
    assert_eq!(
        service.process_profit_and_loss_sheet_report(&report_query()).await,
        Err(expected.clone())
    );
    assert_eq!(
        service.process_ledger_account(&LedgerQuery::default()).await,
        Err(expected)
    );
}

#[test]
fn test_statements_are_deterministic() {
    let rows = vec![
        amount_row("1100", AccountCategory::Asset, dec!(400), dec!(0)),
        amount_row("3100", AccountCategory::Equity, dec!(0), dec!(300)),
        amount_row("4100", AccountCategory::Income, dec!(0), dec!(100)),
    ];
    let now = at(2022, 6, 1);

    let first = statements::balance_sheet(&balance_sheet_query(), rows.clone(), now);
    let second = statements::balance_sheet(&balance_sheet_query(), rows, now);

    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[test]
fn test_report_json_uses_string_decimals_and_flattened_accounts() {
    let rows = vec![amount_row("4100", AccountCategory::Income, dec!(0), dec!(12.50))];
    let report = statements::profit_and_loss(&report_query(), rows, at(2022, 6, 1));

    let json = serde_json::to_value(&report).unwrap();
    let line = &json["incomes"][0];
    assert_eq!(line["account_code"], "4100");
    assert_eq!(line["account_category"], 4);
    assert_eq!(line["amount"], "12.50");
}

// ============================================================================
// Properties
// ============================================================================

fn category_strategy() -> impl Strategy<Value = AccountCategory> {
    prop_oneof![
        Just(AccountCategory::Asset),
        Just(AccountCategory::Liability),
        Just(AccountCategory::Equity),
        Just(AccountCategory::Income),
        Just(AccountCategory::Expense),
    ]
}

/// A balanced posting: `(cents, debit account, credit account, in window)`.
fn postings_strategy() -> impl Strategy<Value = Vec<(i64, usize, usize, bool)>> {
    prop::collection::vec((1i64..1_000_000, 0usize..8, 0usize..8, any::<bool>()), 0..40)
}

fn chart(categories: &[AccountCategory]) -> Vec<AccountInfo> {
    categories
        .iter()
        .enumerate()
        .map(|(i, category)| account(&format!("{}{i:03}", *category as i16), *category))
        .collect()
}

proptest! {
    /// Closing debits equal closing credits whenever every posting is balanced.
    #[test]
    fn prop_trial_balance_identity(
        categories in prop::collection::vec(category_strategy(), 8),
        postings in postings_strategy(),
    ) {
        let mut rows: Vec<TrialBalanceRow> = chart(&categories)
            .into_iter()
            .map(|a| tb_row(a, (Decimal::ZERO, Decimal::ZERO), (Decimal::ZERO, Decimal::ZERO)))
            .collect();

        for (cents, debit_idx, credit_idx, in_window) in postings {
            let value = Decimal::new(cents, 2);
            if in_window {
                rows[debit_idx].debit_amount += value;
                rows[credit_idx].credit_amount += value;
            } else {
                rows[debit_idx].balance_debit_amount += value;
                rows[credit_idx].balance_credit_amount += value;
            }
            rows[debit_idx].next_balance_debit_amount += value;
            rows[credit_idx].next_balance_credit_amount += value;
        }

        let report = statements::trial_balance(&report_query(), rows, at(2022, 6, 1));

        prop_assert_eq!(report.total_next_balance_debit, report.total_next_balance_credit);
        prop_assert!(report.is_balanced);
        prop_assert!(report.account_details.iter().all(|d| !d.is_zero()));
    }

    /// Assets equal liabilities plus owners' equity after net profit injection.
    #[test]
    fn prop_balance_sheet_identity(
        categories in prop::collection::vec(category_strategy(), 8),
        postings in postings_strategy(),
    ) {
        let mut rows: Vec<AccountAmountRow> = chart(&categories)
            .into_iter()
            .map(|account| AccountAmountRow {
                account,
                debit_amount: Decimal::ZERO,
                credit_amount: Decimal::ZERO,
            })
            .collect();

        for (cents, debit_idx, credit_idx, _) in postings {
            let value = Decimal::new(cents, 2);
            rows[debit_idx].debit_amount += value;
            rows[credit_idx].credit_amount += value;
        }

        let report = statements::balance_sheet(&balance_sheet_query(), rows, at(2022, 6, 1));

        prop_assert_eq!(
            report.total_asset_amount,
            report.total_liability_amount + report.total_owners_equity_amount
        );
        prop_assert!(report.is_balanced);
    }

    /// The sign rule is antisymmetric in debit and credit.
    #[test]
    fn prop_signed_net_antisymmetric(
        category in category_strategy(),
        debit in 0i64..10_000_000,
        credit in 0i64..10_000_000,
    ) {
        let (debit, credit) = (Decimal::new(debit, 2), Decimal::new(credit, 2));
        prop_assert_eq!(
            signed_net(category, debit, credit),
            -signed_net(category, credit, debit)
        );
    }

    /// Running balance ends at opening plus net debits, whatever the category.
    #[test]
    fn prop_ledger_closes_at_opening_plus_net(
        opening_cents in -1_000_000i64..1_000_000,
        moves in prop::collection::vec((0i64..100_000, 0i64..100_000), 0..20),
    ) {
        let mut rows = vec![opening("AC1", Decimal::new(opening_cents, 2))];
        let mut expected = Decimal::new(opening_cents, 2);
        for (i, (debit, credit)) in moves.iter().enumerate() {
            let (debit, credit) = (Decimal::new(*debit, 2), Decimal::new(*credit, 2));
            expected += debit - credit;
            rows.push(posting("AC1", 2, &format!("JV{i:04}"), debit, credit));
        }

        let accounts = super::ledger::build_ledger_accounts(rows);

        prop_assert_eq!(accounts.len(), 1);
        prop_assert_eq!(accounts[0].next_balance, expected);
    }
}
