//! Data access contract for report generation.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use super::error::ReportError;
use super::types::{AccountAmountRow, AccountInfo, LedgerAccountRaw, TrialBalanceRow};

/// Windowed report parameters shared by trial balance and profit and loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    /// Shop the postings belong to.
    pub shop_id: String,
    /// Book identifier.
    pub account_group: String,
    /// Include closing journals dated inside the window.
    pub include_closing_mode: bool,
    /// Window start.
    pub start_date: DateTime<Utc>,
    /// Window end (inclusive).
    pub end_date: DateTime<Utc>,
}

/// Balance sheet parameters (single cut-off).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSheetQuery {
    /// Shop the postings belong to.
    pub shop_id: String,
    /// Book identifier.
    pub account_group: String,
    /// Include closing journals dated in the cut-off year.
    pub include_closing_mode: bool,
    /// Cut-off (inclusive).
    pub end_date: DateTime<Utc>,
}

impl BalanceSheetQuery {
    /// Start of the cut-off year; closing journals from here on obey the flag.
    #[must_use]
    pub fn closing_window_start(&self) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(self.end_date.year(), 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map_or(self.end_date, |midnight| midnight.and_utc())
    }
}

/// Inclusive account-code range `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAccountCodeRange {
    /// First code in range.
    pub start: String,
    /// Last code in range.
    pub end: String,
}

impl LedgerAccountCodeRange {
    /// Parses `START:END[,START:END...]`, skipping malformed fragments.
    #[must_use]
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.trim()
            .split(',')
            .filter_map(|part| {
                let mut bounds = part.split(':');
                match (bounds.next(), bounds.next(), bounds.next()) {
                    (Some(start), Some(end), None) => Some(Self {
                        start: start.trim().to_string(),
                        end: end.trim().to_string(),
                    }),
                    _ => None,
                }
            })
            .collect()
    }
}

/// Ledger parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerQuery {
    /// Shop the postings belong to.
    pub shop_id: String,
    /// Book identifier; empty means every book.
    pub account_group: String,
    /// Roll every account under this code into one logical account.
    pub consolidate_account_code: Option<String>,
    /// Only journals whose creditor has this code.
    pub creditor_code: Option<String>,
    /// Only journals whose debtor has this code.
    pub debtor_code: Option<String>,
    /// Account-code filter; empty means every account.
    pub account_code_ranges: Vec<LedgerAccountCodeRange>,
    /// Window start.
    pub start_date: DateTime<Utc>,
    /// Window end (inclusive).
    pub end_date: DateTime<Utc>,
}

/// Repository trait for report data access.
///
/// All methods are read-only and scoped to one shop and book. Amounts come
/// back unsigned; applying the category sign convention is the service's job.
/// Errors surface unchanged, with no retry at this layer.
///
/// This trait is implemented by the db crate against Postgres.
pub trait ReportRepository: Send + Sync {
    /// Opening, movement, and cumulative sums for every chart account.
    fn get_data_trial_balance(
        &self,
        query: &ReportQuery,
    ) -> impl std::future::Future<Output = Result<Vec<TrialBalanceRow>, ReportError>> + Send;

    /// Movement sums for Income and Expense accounts.
    fn get_data_profit_and_loss(
        &self,
        query: &ReportQuery,
    ) -> impl std::future::Future<Output = Result<Vec<AccountAmountRow>, ReportError>> + Send;

    /// Cumulative sums up to the cut-off for every chart account.
    fn get_data_balance_sheet(
        &self,
        query: &BalanceSheetQuery,
    ) -> impl std::future::Future<Output = Result<Vec<AccountAmountRow>, ReportError>> + Send;

    /// Opening row plus chronological transaction rows per account.
    fn get_data_ledger_account(
        &self,
        query: &LedgerQuery,
    ) -> impl std::future::Future<Output = Result<Vec<LedgerAccountRaw>, ReportError>> + Send;

    /// The chart of accounts of one book (every book when `account_group` is
    /// empty), used to build the consolidation forest.
    fn get_chart_of_accounts(
        &self,
        shop_id: &str,
        account_group: &str,
    ) -> impl std::future::Future<Output = Result<Vec<AccountInfo>, ReportError>> + Send;
}
