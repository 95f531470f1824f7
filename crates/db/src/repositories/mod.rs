//! Repository implementations for data access.
//!
//! Repositories hide the `SeaORM` details behind the traits defined in core.

pub mod report;

pub use report::PgReportRepository;
