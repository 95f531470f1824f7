//! Report data types.
//!
//! All values here are request-scoped: built fresh for one report call and
//! discarded after serialization.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ReportError;

/// Account category from the chart of accounts.
///
/// Serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum AccountCategory {
    /// Asset (debit-normal).
    Asset = 1,
    /// Liability (credit-normal).
    Liability = 2,
    /// Owners' equity (credit-normal).
    Equity = 3,
    /// Income (credit-normal).
    Income = 4,
    /// Expense (debit-normal).
    Expense = 5,
}

impl AccountCategory {
    /// Asset and Expense accounts increase on the debit side.
    #[must_use]
    pub const fn is_debit_normal(self) -> bool {
        matches!(self, Self::Asset | Self::Expense)
    }

    /// Categories 1-3 appear on the balance sheet directly.
    #[must_use]
    pub const fn is_balance_sheet(self) -> bool {
        matches!(self, Self::Asset | Self::Liability | Self::Equity)
    }

    /// Categories 4-5 feed profit and loss.
    #[must_use]
    pub const fn is_profit_and_loss(self) -> bool {
        matches!(self, Self::Income | Self::Expense)
    }

    /// The side on which a positive balance of this category is shown.
    #[must_use]
    pub const fn normal_side(self) -> BalanceSide {
        if self.is_debit_normal() {
            BalanceSide::Debit
        } else {
            BalanceSide::Credit
        }
    }
}

impl From<AccountCategory> for i16 {
    fn from(category: AccountCategory) -> Self {
        category as Self
    }
}

impl TryFrom<i16> for AccountCategory {
    type Error = ReportError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Asset),
            2 => Ok(Self::Liability),
            3 => Ok(Self::Equity),
            4 => Ok(Self::Income),
            5 => Ok(Self::Expense),
            other => Err(ReportError::InvalidAccountCategory(other)),
        }
    }
}

/// Applies the category sign convention to a debit/credit pair.
///
/// - Asset/Expense (debit-normal): debit - credit
/// - Liability/Equity/Income (credit-normal): credit - debit
#[must_use]
pub fn signed_net(category: AccountCategory, debit: Decimal, credit: Decimal) -> Decimal {
    if category.is_debit_normal() {
        debit - credit
    } else {
        credit - debit
    }
}

/// Debit or credit column of a two-column statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSide {
    /// Debit column.
    Debit,
    /// Credit column.
    Credit,
}

impl BalanceSide {
    /// Column a signed amount belongs in: the normal side unless negative.
    #[must_use]
    pub fn for_amount(category: AccountCategory, signed: Decimal) -> Self {
        let side = category.normal_side();
        if signed < Decimal::ZERO {
            side.opposite()
        } else {
            side
        }
    }

    /// The other column.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

/// Chart-of-accounts metadata (read-only snapshot for one report run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account code, unique per shop and book. Empty for synthetic lines.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Account category.
    pub account_category: AccountCategory,
    /// Balance type as stored in the chart (0 when unknown).
    pub account_balance_type: i16,
    /// Book identifier.
    pub account_group: String,
    /// Level in the chart hierarchy (0 when unknown).
    pub account_level: i16,
    /// Parent account this one rolls up into.
    pub consolidate_account_code: Option<String>,
}

impl AccountInfo {
    /// A line item with no backing account.
    #[must_use]
    pub fn synthetic(name: &str, category: AccountCategory) -> Self {
        Self {
            account_code: String::new(),
            account_name: name.to_string(),
            account_category: category,
            account_balance_type: 0,
            account_group: String::new(),
            account_level: 0,
            consolidate_account_code: None,
        }
    }
}

// ============================================================================
// Repository rows (unsigned sums)
// ============================================================================

/// Per-account trial balance aggregate as returned by the repository.
///
/// All six sums are unsigned; zero-activity accounts are present with zeros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialBalanceRow {
    /// Account metadata.
    pub account: AccountInfo,
    /// Debit sum with `doc_date < start`.
    pub balance_debit_amount: Decimal,
    /// Credit sum with `doc_date < start`.
    pub balance_credit_amount: Decimal,
    /// Debit sum with `start <= doc_date <= end`.
    pub debit_amount: Decimal,
    /// Credit sum with `start <= doc_date <= end`.
    pub credit_amount: Decimal,
    /// Debit sum with `doc_date <= end`.
    pub next_balance_debit_amount: Decimal,
    /// Credit sum with `doc_date <= end`.
    pub next_balance_credit_amount: Decimal,
}

/// Single-window aggregate for balance sheet and profit and loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountAmountRow {
    /// Account metadata.
    pub account: AccountInfo,
    /// Debit sum for the window.
    pub debit_amount: Decimal,
    /// Credit sum for the window.
    pub credit_amount: Decimal,
}

/// Kind of raw ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum LedgerRowMode {
    /// Synthetic balance carried forward before the start date.
    Opening = -1,
    /// A real journal line.
    Transaction = 0,
}

impl From<LedgerRowMode> for i16 {
    fn from(mode: LedgerRowMode) -> Self {
        mode as Self
    }
}

impl TryFrom<i16> for LedgerRowMode {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Opening),
            0 => Ok(Self::Transaction),
            other => Err(format!("invalid ledger row mode: {other}")),
        }
    }
}

/// Raw ledger row.
///
/// Delivered grouped by account code; within a group the opening row comes
/// first, followed by transactions in ascending `(doc_date, doc_no)` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccountRaw {
    /// Opening or transaction.
    pub row_mode: LedgerRowMode,
    /// Document date (start date for opening rows).
    pub doc_date: DateTime<Utc>,
    /// Document number (empty for opening rows).
    pub doc_no: String,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Journal description.
    pub account_description: String,
    /// Book identifier.
    pub account_group: String,
    /// Consolidation parent.
    pub consolidate_account_code: Option<String>,
    /// Debit amount (transactions only).
    pub debit_amount: Decimal,
    /// Credit amount (transactions only).
    pub credit_amount: Decimal,
    /// Signed opening balance (opening rows only).
    pub amount: Decimal,
}

// ============================================================================
// Report line items
// ============================================================================

/// Trial balance line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceSheetAccountDetail {
    /// Account metadata.
    #[serde(flatten)]
    pub account: AccountInfo,
    /// Opening debit sum.
    pub balance_debit_amount: Decimal,
    /// Opening credit sum.
    pub balance_credit_amount: Decimal,
    /// Movement debit sum.
    pub debit_amount: Decimal,
    /// Movement credit sum.
    pub credit_amount: Decimal,
    /// Closing debit sum.
    pub next_balance_debit_amount: Decimal,
    /// Closing credit sum.
    pub next_balance_credit_amount: Decimal,
    /// Signed opening balance.
    pub balance_amount: Decimal,
    /// Signed movement.
    pub amount: Decimal,
    /// Signed closing balance.
    pub next_balance_amount: Decimal,
    /// Column for the opening balance.
    pub balance_side: BalanceSide,
    /// Column for the movement.
    pub amount_side: BalanceSide,
    /// Column for the closing balance.
    pub next_balance_side: BalanceSide,
}

impl TrialBalanceSheetAccountDetail {
    /// Signs each window of a repository row.
    #[must_use]
    pub fn from_row(row: TrialBalanceRow) -> Self {
        let category = row.account.account_category;
        let balance_amount = signed_net(
            category,
            row.balance_debit_amount,
            row.balance_credit_amount,
        );
        let amount = signed_net(category, row.debit_amount, row.credit_amount);
        let next_balance_amount = signed_net(
            category,
            row.next_balance_debit_amount,
            row.next_balance_credit_amount,
        );

        Self {
            account: row.account,
            balance_debit_amount: row.balance_debit_amount,
            balance_credit_amount: row.balance_credit_amount,
            debit_amount: row.debit_amount,
            credit_amount: row.credit_amount,
            next_balance_debit_amount: row.next_balance_debit_amount,
            next_balance_credit_amount: row.next_balance_credit_amount,
            balance_amount,
            amount,
            next_balance_amount,
            balance_side: BalanceSide::for_amount(category, balance_amount),
            amount_side: BalanceSide::for_amount(category, amount),
            next_balance_side: BalanceSide::for_amount(category, next_balance_amount),
        }
    }

    /// True when all three signed amounts are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.balance_amount.is_zero() && self.amount.is_zero() && self.next_balance_amount.is_zero()
    }
}

/// Balance sheet line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetAccountDetail {
    /// Account metadata.
    #[serde(flatten)]
    pub account: AccountInfo,
    /// Signed cumulative balance at the end date.
    pub amount: Decimal,
}

/// Profit and loss line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitAndLossSheetAccountDetail {
    /// Account metadata.
    #[serde(flatten)]
    pub account: AccountInfo,
    /// Signed movement within the window.
    pub amount: Decimal,
}

// ============================================================================
// Reports
// ============================================================================

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceSheetReport {
    /// When the report was computed.
    pub report_date: DateTime<Utc>,
    /// Window start.
    pub start_date: DateTime<Utc>,
    /// Window end (inclusive).
    pub end_date: DateTime<Utc>,
    /// Book identifier.
    pub account_group: String,
    /// Non-zero account lines.
    pub account_details: Vec<TrialBalanceSheetAccountDetail>,
    /// Sum of opening debits.
    pub total_balance_debit: Decimal,
    /// Sum of opening credits.
    pub total_balance_credit: Decimal,
    /// Sum of movement debits.
    pub total_amount_debit: Decimal,
    /// Sum of movement credits.
    pub total_amount_credit: Decimal,
    /// Sum of closing debits.
    pub total_next_balance_debit: Decimal,
    /// Sum of closing credits.
    pub total_next_balance_credit: Decimal,
    /// Whether closing debits equal closing credits.
    pub is_balanced: bool,
}

/// Balance sheet report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    /// When the report was computed.
    pub report_date: DateTime<Utc>,
    /// Cut-off (inclusive).
    pub end_date: DateTime<Utc>,
    /// Book identifier.
    pub account_group: String,
    /// Asset lines.
    pub assets: Vec<BalanceSheetAccountDetail>,
    /// Liability lines.
    pub liabilities: Vec<BalanceSheetAccountDetail>,
    /// Owners' equity lines, including the net profit or loss line.
    pub owners_equities: Vec<BalanceSheetAccountDetail>,
    /// Total assets.
    pub total_asset_amount: Decimal,
    /// Total liabilities.
    pub total_liability_amount: Decimal,
    /// Total owners' equity.
    pub total_owners_equity_amount: Decimal,
    /// Liabilities plus owners' equity.
    pub total_liability_and_owners_equity_amount: Decimal,
    /// Whether assets equal liabilities plus owners' equity.
    pub is_balanced: bool,
}

/// Profit and loss report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitAndLossSheetReport {
    /// When the report was computed.
    pub report_date: DateTime<Utc>,
    /// Window start.
    pub start_date: DateTime<Utc>,
    /// Window end (inclusive).
    pub end_date: DateTime<Utc>,
    /// Book identifier.
    pub account_group: String,
    /// Income lines.
    pub incomes: Vec<ProfitAndLossSheetAccountDetail>,
    /// Expense lines.
    pub expenses: Vec<ProfitAndLossSheetAccountDetail>,
    /// Total income.
    pub total_income_amount: Decimal,
    /// Total expense.
    pub total_expense_amount: Decimal,
    /// Income minus expense.
    pub profit_and_loss_amount: Decimal,
}

/// One transaction line of a ledger account with its running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccountDetail {
    /// Document number.
    pub doc_no: String,
    /// Document date.
    pub doc_date: DateTime<Utc>,
    /// Journal description.
    pub account_description: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Running balance after this line.
    pub amount: Decimal,
}

/// Ledger account statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccount {
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Book identifier.
    pub account_group: String,
    /// Consolidation parent.
    pub consolidate_account_code: Option<String>,
    /// Opening balance.
    pub balance: Decimal,
    /// Closing running balance.
    pub next_balance: Decimal,
    /// Transactions in chronological order.
    pub details: Vec<LedgerAccountDetail>,
}
