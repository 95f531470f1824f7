//! Report generation service.

use std::sync::Arc;

use chrono::Utc;

use super::consolidation::{AccountForest, RollUpScope};
use super::error::ReportError;
use super::ledger::build_ledger_accounts;
use super::repository::{BalanceSheetQuery, LedgerQuery, ReportQuery, ReportRepository};
use super::statements;
use super::types::{BalanceSheetReport, LedgerAccount, ProfitAndLossSheetReport, TrialBalanceSheetReport};

/// Report service.
///
/// Holds nothing but the injected repository; every call recomputes its report
/// from fresh repository output. Repository errors abort the call unchanged.
pub struct ReportService<R: ReportRepository> {
    repo: Arc<R>,
}

impl<R: ReportRepository> Clone for ReportService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: ReportRepository> ReportService<R> {
    /// Create a new report service.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Generates a trial balance for the window.
    ///
    /// With `consolidate`, every account is rolled up into the root of its
    /// consolidation tree before signing.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn process_trial_balance_sheet_report(
        &self,
        query: &ReportQuery,
        consolidate: bool,
    ) -> Result<TrialBalanceSheetReport, ReportError> {
        let mut rows = self.repo.get_data_trial_balance(query).await?;

        if consolidate {
            let chart = self
                .repo
                .get_chart_of_accounts(&query.shop_id, &query.account_group)
                .await?;
            rows = AccountForest::new(chart).roll_up(rows, RollUpScope::Roots);
        }

        Ok(statements::trial_balance(query, rows, Utc::now()))
    }

    /// Generates a balance sheet at the cut-off.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn process_balance_sheet_report(
        &self,
        query: &BalanceSheetQuery,
    ) -> Result<BalanceSheetReport, ReportError> {
        let rows = self.repo.get_data_balance_sheet(query).await?;
        Ok(statements::balance_sheet(query, rows, Utc::now()))
    }

    /// Generates a profit and loss statement for the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn process_profit_and_loss_sheet_report(
        &self,
        query: &ReportQuery,
    ) -> Result<ProfitAndLossSheetReport, ReportError> {
        let rows = self.repo.get_data_profit_and_loss(query).await?;
        Ok(statements::profit_and_loss(query, rows, Utc::now()))
    }

    /// Builds ledger accounts with running balances.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn process_ledger_account(
        &self,
        query: &LedgerQuery,
    ) -> Result<Vec<LedgerAccount>, ReportError> {
        let rows = self.repo.get_data_ledger_account(query).await?;
        Ok(build_ledger_accounts(rows))
    }
}
