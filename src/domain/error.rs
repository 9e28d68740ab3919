//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the review data model.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("{location}: missing value for path column {column}")]
    MissingPathValue { location: String, column: String },

    #[error("nothing to aggregate: {0}")]
    EmptyAggregation(String),

    #[error("invalid sentiment filter: {0} (expected all, positive, negative or neutral)")]
    InvalidSentimentFilter(String),

    #[error("invalid n-gram width: {0} (expected 1, 2 or 3)")]
    InvalidNgram(usize),

    #[error("invalid color for {field}: {value} (expected #RRGGBB)")]
    InvalidColor { field: String, value: String },
}
