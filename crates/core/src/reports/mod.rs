//! Financial report generation.
//!
//! Turns double-entry postings into statements:
//! - Trial Balance (opening / movement / closing windows)
//! - Balance Sheet (with net profit or loss injected into owners' equity)
//! - Profit and Loss
//! - Ledger Account (chronological running balance per account)

pub mod consolidation;
pub mod error;
pub mod ledger;
pub mod period;
pub mod repository;
pub mod service;
pub mod statements;
pub mod types;

#[cfg(test)]
mod tests;

pub use consolidation::{AccountForest, Consolidate, RollUpScope};
pub use error::{PeriodError, ReportError};
pub use ledger::{LedgerAccountGroup, build_ledger_accounts, group_ledger_rows};
pub use period::ReportPeriod;
pub use repository::{
    BalanceSheetQuery, LedgerAccountCodeRange, LedgerQuery, ReportQuery, ReportRepository,
};
pub use service::ReportService;
pub use types::*;
