//! General ledger reporting engine.
//!
//! This crate contains pure report computation with ZERO web or database dependencies.
//! Data access is abstracted behind [`reports::ReportRepository`], implemented by the
//! db crate.
//!
//! # Modules
//!
//! - `reports` - Trial balance, balance sheet, profit and loss, and ledger accounts

pub mod reports;
