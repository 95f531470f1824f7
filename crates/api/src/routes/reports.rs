//! General ledger report routes.
//!
//! Query parameters keep the lowercase names clients already send
//! (`accountgroup`, `startdate`, `enddate`, `ica`, ...). Dates are local to
//! `timezone` and resolved to UTC before the service sees them.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::FixedOffset;
use serde::Deserialize;
use tracing::{debug, error};

use crate::{
    AppState,
    error::{ApiError, ApiResponse},
    middleware::auth::AuthUser,
};
use glreport_core::reports::{
    BalanceSheetQuery, BalanceSheetReport, LedgerAccount, LedgerAccountCodeRange, LedgerQuery,
    PeriodError, ProfitAndLossSheetReport, ReportPeriod, ReportQuery, TrialBalanceSheetReport,
    period::{parse_end_date, parse_offset},
};

/// Creates the report routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/gl/report/trialbalancesheet", get(get_trial_balance_sheet))
        .route("/gl/report/balancesheet", get(get_balance_sheet))
        .route("/gl/report/profitandloss", get(get_profit_and_loss))
        .route("/gl/report/ledgeraccount", get(get_ledger_account))
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters shared by every report endpoint.
///
/// Each endpoint reads the subset it needs; unknown or unused ones are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    /// Book identifier.
    #[serde(rename = "accountgroup")]
    pub account_group: Option<String>,
    /// `YYYY-MM-DD`, local to `timezone`.
    #[serde(rename = "startdate")]
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, local to `timezone`; the whole day is included.
    #[serde(rename = "enddate")]
    pub end_date: Option<String>,
    /// `+HH`, `-HH` or `+HHMM`; defaults to `+00`.
    pub timezone: Option<String>,
    /// `"1"` includes closing journals.
    #[serde(rename = "ica")]
    pub include_closing_mode: Option<String>,
    /// `"1"` rolls the trial balance up to consolidation roots.
    pub consolidate: Option<String>,
    /// Ledger account ranges, `START:END[,START:END...]`.
    #[serde(rename = "accountcode")]
    pub account_code: Option<String>,
    /// Ledger consolidation target.
    #[serde(rename = "consolidateaccountcode")]
    pub consolidate_account_code: Option<String>,
    /// Ledger creditor filter.
    #[serde(rename = "creditorcode")]
    pub creditor_code: Option<String>,
    /// Ledger debtor filter.
    #[serde(rename = "debtorcode")]
    pub debtor_code: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_flag_set(value: Option<&str>) -> bool {
    non_empty(value) == Some("1")
}

impl ReportParams {
    fn account_group(&self) -> Result<String, ApiError> {
        non_empty(self.account_group.as_deref())
            .map(str::to_string)
            .ok_or_else(|| ApiError::validation("accountgroup is required"))
    }

    fn offset(&self) -> Result<FixedOffset, PeriodError> {
        parse_offset(self.timezone.as_deref().unwrap_or_default())
    }

    fn period(&self) -> Result<ReportPeriod, PeriodError> {
        ReportPeriod::parse(
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            self.timezone.as_deref(),
        )
    }

    /// Whether closing journals are included.
    #[must_use]
    pub fn include_closing_mode(&self) -> bool {
        is_flag_set(self.include_closing_mode.as_deref())
    }

    /// Whether the trial balance is consolidated.
    #[must_use]
    pub fn consolidate(&self) -> bool {
        is_flag_set(self.consolidate.as_deref())
    }

    /// Windowed query for the trial balance and profit and loss.
    pub fn report_query(&self, shop_id: &str) -> Result<ReportQuery, ApiError> {
        let account_group = self.account_group()?;
        let period = self.period()?;

        Ok(ReportQuery {
            shop_id: shop_id.to_string(),
            account_group,
            include_closing_mode: self.include_closing_mode(),
            start_date: period.start_date,
            end_date: period.end_date,
        })
    }

    /// Cut-off query for the balance sheet; `startdate` is ignored.
    pub fn balance_sheet_query(&self, shop_id: &str) -> Result<BalanceSheetQuery, ApiError> {
        let account_group = self.account_group()?;
        let end_date = parse_end_date("enddate", self.end_date.as_deref(), self.offset()?)?;

        Ok(BalanceSheetQuery {
            shop_id: shop_id.to_string(),
            account_group,
            include_closing_mode: self.include_closing_mode(),
            end_date,
        })
    }

    /// Ledger query; blank filters mean "no filter".
    pub fn ledger_query(&self, shop_id: &str) -> Result<LedgerQuery, ApiError> {
        let period = self.period()?;
        let owned = |value: Option<&String>| non_empty(value.map(String::as_str)).map(str::to_string);

        Ok(LedgerQuery {
            shop_id: shop_id.to_string(),
            account_group: owned(self.account_group.as_ref()).unwrap_or_default(),
            consolidate_account_code: owned(self.consolidate_account_code.as_ref()),
            creditor_code: owned(self.creditor_code.as_ref()),
            debtor_code: owned(self.debtor_code.as_ref()),
            account_code_ranges: non_empty(self.account_code.as_deref())
                .map(LedgerAccountCodeRange::parse_list)
                .unwrap_or_default(),
            start_date: period.start_date,
            end_date: period.end_date,
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /gl/report/trialbalancesheet
async fn get_trial_balance_sheet(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<ReportParams>,
) -> Result<Json<ApiResponse<TrialBalanceSheetReport>>, ApiError> {
    let query = params.report_query(auth_user.shop_id())?;
    let consolidate = params.consolidate();

    debug!(
        shop_id = %query.shop_id,
        account_group = %query.account_group,
        start_date = %query.start_date,
        end_date = %query.end_date,
        include_closing_mode = query.include_closing_mode,
        consolidate,
        "Processing trial balance sheet"
    );

    let report = state
        .reports
        .process_trial_balance_sheet_report(&query, consolidate)
        .await
        .map_err(|e| {
            error!(error = %e, shop_id = %query.shop_id, "Failed to process trial balance sheet");
            ApiError::from(e)
        })?;

    Ok(ApiResponse::ok(report))
}

/// GET /gl/report/balancesheet
async fn get_balance_sheet(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<ReportParams>,
) -> Result<Json<ApiResponse<BalanceSheetReport>>, ApiError> {
    let query = params.balance_sheet_query(auth_user.shop_id())?;

    debug!(
        shop_id = %query.shop_id,
        account_group = %query.account_group,
        end_date = %query.end_date,
        include_closing_mode = query.include_closing_mode,
        "Processing balance sheet"
    );

    let report = state
        .reports
        .process_balance_sheet_report(&query)
        .await
        .map_err(|e| {
            error!(error = %e, shop_id = %query.shop_id, "Failed to process balance sheet");
            ApiError::from(e)
        })?;

    Ok(ApiResponse::ok(report))
}

/// GET /gl/report/profitandloss
async fn get_profit_and_loss(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<ReportParams>,
) -> Result<Json<ApiResponse<ProfitAndLossSheetReport>>, ApiError> {
    let query = params.report_query(auth_user.shop_id())?;

    debug!(
        shop_id = %query.shop_id,
        account_group = %query.account_group,
        start_date = %query.start_date,
        end_date = %query.end_date,
        include_closing_mode = query.include_closing_mode,
        "Processing profit and loss"
    );

    let report = state
        .reports
        .process_profit_and_loss_sheet_report(&query)
        .await
        .map_err(|e| {
            error!(error = %e, shop_id = %query.shop_id, "Failed to process profit and loss");
            ApiError::from(e)
        })?;

    Ok(ApiResponse::ok(report))
}

/// GET /gl/report/ledgeraccount
async fn get_ledger_account(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<ReportParams>,
) -> Result<Json<ApiResponse<Vec<LedgerAccount>>>, ApiError> {
    let query = params.ledger_query(auth_user.shop_id())?;

    debug!(
        shop_id = %query.shop_id,
        account_group = %query.account_group,
        start_date = %query.start_date,
        end_date = %query.end_date,
        ranges = query.account_code_ranges.len(),
        consolidate_account_code = ?query.consolidate_account_code,
        "Processing ledger account"
    );

    let accounts = state
        .reports
        .process_ledger_account(&query)
        .await
        .map_err(|e| {
            error!(error = %e, shop_id = %query.shop_id, "Failed to process ledger account");
            ApiError::from(e)
        })?;

    Ok(ApiResponse::ok(accounts))
}

#[cfg(test)]
#[path = "reports_tests.rs"]
mod tests;
