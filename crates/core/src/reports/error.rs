//! Report error types.

use thiserror::Error;

/// Errors that can occur during report generation.
///
/// The engine raises no domain-level errors: an unbalanced trial balance is
/// reported, not rejected. Everything here originates from data access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// The underlying store failed (connectivity, bad parameters, timeout).
    #[error("repository error: {0}")]
    Repository(String),

    /// A stored account category is outside 1..=5.
    #[error("invalid account category: {0}")]
    InvalidAccountCategory(i16),
}

impl ReportError {
    /// Create a repository error from any displayable source.
    #[must_use]
    pub fn repository(err: impl std::fmt::Display) -> Self {
        Self::Repository(err.to_string())
    }
}

/// Errors raised while parsing report dates at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    /// A required date parameter was absent or empty.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A date parameter did not match `YYYY-MM-DD`.
    #[error("{field} format invalid: {value}")]
    InvalidDate {
        /// Parameter name.
        field: &'static str,
        /// Raw value received.
        value: String,
    },

    /// The timezone offset could not be parsed.
    #[error("timezone format invalid: {0}")]
    InvalidTimezone(String),
}
