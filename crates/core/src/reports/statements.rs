//! Statement assembly from repository rows.
//!
//! These functions are pure: the caller supplies the rows and the report
//! timestamp, so identical inputs always produce identical reports.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::repository::{BalanceSheetQuery, ReportQuery};
use super::types::{
    AccountAmountRow, AccountCategory, AccountInfo, BalanceSheetAccountDetail, BalanceSheetReport,
    ProfitAndLossSheetAccountDetail, ProfitAndLossSheetReport, TrialBalanceRow,
    TrialBalanceSheetAccountDetail, TrialBalanceSheetReport, signed_net,
};

/// Label of the synthetic owners' equity line.
pub const NET_PROFIT_OR_LOSS_NAME: &str = "Net profit (loss)";

/// Builds a trial balance, dropping accounts with no signed activity.
#[must_use]
pub fn trial_balance(
    query: &ReportQuery,
    rows: Vec<TrialBalanceRow>,
    report_date: DateTime<Utc>,
) -> TrialBalanceSheetReport {
    let account_details: Vec<_> = rows
        .into_iter()
        .map(TrialBalanceSheetAccountDetail::from_row)
        .filter(|detail| !detail.is_zero())
        .collect();

    let sum = |field: fn(&TrialBalanceSheetAccountDetail) -> Decimal| -> Decimal {
        account_details.iter().map(field).sum()
    };
    let total_balance_debit = sum(|d| d.balance_debit_amount);
    let total_balance_credit = sum(|d| d.balance_credit_amount);
    let total_amount_debit = sum(|d| d.debit_amount);
    let total_amount_credit = sum(|d| d.credit_amount);
    let total_next_balance_debit = sum(|d| d.next_balance_debit_amount);
    let total_next_balance_credit = sum(|d| d.next_balance_credit_amount);

    TrialBalanceSheetReport {
        report_date,
        start_date: query.start_date,
        end_date: query.end_date,
        account_group: query.account_group.clone(),
        account_details,
        total_balance_debit,
        total_balance_credit,
        total_amount_debit,
        total_amount_credit,
        total_next_balance_debit,
        total_next_balance_credit,
        is_balanced: total_next_balance_debit == total_next_balance_credit,
    }
}

fn signed_amount(row: &AccountAmountRow) -> Decimal {
    signed_net(
        row.account.account_category,
        row.debit_amount,
        row.credit_amount,
    )
}

/// Builds a balance sheet.
///
/// Income and expense rows never appear as lines; their difference is carried
/// into owners' equity as a single synthetic line when non-zero.
#[must_use]
pub fn balance_sheet(
    query: &BalanceSheetQuery,
    rows: Vec<AccountAmountRow>,
    report_date: DateTime<Utc>,
) -> BalanceSheetReport {
    let mut assets = Vec::new();
    let mut liabilities = Vec::new();
    let mut owners_equities = Vec::new();
    let mut total_asset_amount = Decimal::ZERO;
    let mut total_liability_amount = Decimal::ZERO;
    let mut total_owners_equity_amount = Decimal::ZERO;
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;

    for row in rows {
        let amount = signed_amount(&row);
        if amount.is_zero() {
            continue;
        }

        let line = BalanceSheetAccountDetail {
            account: row.account,
            amount,
        };
        match line.account.account_category {
            AccountCategory::Asset => {
                total_asset_amount += amount;
                assets.push(line);
            }
            AccountCategory::Liability => {
                total_liability_amount += amount;
                liabilities.push(line);
            }
            AccountCategory::Equity => {
                total_owners_equity_amount += amount;
                owners_equities.push(line);
            }
            AccountCategory::Income => total_income += amount,
            AccountCategory::Expense => total_expense += amount,
        }
    }

    let net_profit_or_loss = total_income - total_expense;
    if !net_profit_or_loss.is_zero() {
        total_owners_equity_amount += net_profit_or_loss;
        owners_equities.push(BalanceSheetAccountDetail {
            account: AccountInfo::synthetic(NET_PROFIT_OR_LOSS_NAME, AccountCategory::Equity),
            amount: net_profit_or_loss,
        });
    }

    let total_liability_and_owners_equity_amount =
        total_liability_amount + total_owners_equity_amount;

    BalanceSheetReport {
        report_date,
        end_date: query.end_date,
        account_group: query.account_group.clone(),
        assets,
        liabilities,
        owners_equities,
        total_asset_amount,
        total_liability_amount,
        total_owners_equity_amount,
        total_liability_and_owners_equity_amount,
        is_balanced: total_asset_amount == total_liability_and_owners_equity_amount,
    }
}

/// Builds a profit and loss statement.
///
/// Income rows go to `incomes`; every other row is an expense.
#[must_use]
pub fn profit_and_loss(
    query: &ReportQuery,
    rows: Vec<AccountAmountRow>,
    report_date: DateTime<Utc>,
) -> ProfitAndLossSheetReport {
    let mut incomes = Vec::new();
    let mut expenses = Vec::new();
    let mut total_income_amount = Decimal::ZERO;
    let mut total_expense_amount = Decimal::ZERO;

    for row in rows {
        let amount = signed_amount(&row);
        if amount.is_zero() {
            continue;
        }

        let is_income = row.account.account_category == AccountCategory::Income;
        let line = ProfitAndLossSheetAccountDetail {
            account: row.account,
            amount,
        };
        if is_income {
            total_income_amount += amount;
            incomes.push(line);
        } else {
            total_expense_amount += amount;
            expenses.push(line);
        }
    }

    ProfitAndLossSheetReport {
        report_date,
        start_date: query.start_date,
        end_date: query.end_date,
        account_group: query.account_group.clone(),
        incomes,
        expenses,
        total_income_amount,
        total_expense_amount,
        profit_and_loss_amount: total_income_amount - total_expense_amount,
    }
}
