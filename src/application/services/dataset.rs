//! Review dataset loading and row normalization
//!
//! Turns an uploaded CSV into validated `ReviewRecord`s.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{DomainError, ReviewRecord, SentimentType};
use crate::infrastructure::traits::FileSystem;

pub const COLUMN_REVIEW: &str = "Review";
pub const COLUMN_REVIEW_ALIAS: &str = "text";
pub const COLUMN_LABEL: &str = "Label";
pub const COLUMN_CATEGORY: &str = "Category";
pub const COLUMN_SENTIMENT: &str = "sentiment";
pub const COLUMN_SENTIMENT_TYPE: &str = "sentiment_type";

/// What to do with rows missing a hierarchy value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPolicy {
    /// Drop without recording details
    Silent,
    /// Drop and list every dropped row in the report
    #[default]
    Report,
}

/// A row removed during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRow {
    /// 1-based line in the CSV file
    pub line: u64,
    /// First required field found empty
    pub column: String,
}

/// Summary of one normalization pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizeReport {
    pub kept: usize,
    pub dropped_total: usize,
    /// Only filled under `DropPolicy::Report`
    pub dropped: Vec<DroppedRow>,
    /// Rows whose `sentiment` was empty or not a number and became 0.0
    pub defaulted_sentiment: usize,
}

struct Columns {
    review: usize,
    label: usize,
    category: usize,
    sentiment: usize,
    sentiment_type: usize,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, DomainError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let review = find(COLUMN_REVIEW)
            .or_else(|| find(COLUMN_REVIEW_ALIAS))
            .ok_or_else(|| DomainError::MissingColumn(COLUMN_REVIEW.to_string()))?;
        let require = |name: &str| find(name).ok_or_else(|| DomainError::MissingColumn(name.to_string()));

        Ok(Self {
            review,
            label: require(COLUMN_LABEL)?,
            category: require(COLUMN_CATEGORY)?,
            sentiment: require(COLUMN_SENTIMENT)?,
            sentiment_type: require(COLUMN_SENTIMENT_TYPE)?,
        })
    }
}

/// Parse and clean CSV content into review records.
///
/// Rows with an empty Label, Category or sentiment_type are dropped. The
/// input is read, never modified.
pub fn normalize_csv<R: Read>(
    reader: R,
    policy: DropPolicy,
) -> ApplicationResult<(Vec<ReviewRecord>, NormalizeReport)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| ApplicationError::Csv {
            context: "read header row".to_string(),
            source: e,
        })?
        .clone();
    let columns = Columns::resolve(&headers)?;

    let mut records = Vec::new();
    let mut report = NormalizeReport::default();

    for row in csv_reader.records() {
        let row = row.map_err(|e| ApplicationError::Csv {
            context: "read data row".to_string(),
            source: e,
        })?;
        let line = row.position().map_or(0, |p| p.line());
        let cell = |idx: usize| row.get(idx).map(str::trim).unwrap_or("");

        let label = cell(columns.label);
        let category = cell(columns.category);
        let sentiment_type = SentimentType::from_cell(cell(columns.sentiment_type));

        let missing = if label.is_empty() {
            Some(COLUMN_LABEL)
        } else if category.is_empty() {
            Some(COLUMN_CATEGORY)
        } else if sentiment_type.is_none() {
            Some(COLUMN_SENTIMENT_TYPE)
        } else {
            None
        };

        let (Some(sentiment_type), None) = (sentiment_type, missing) else {
            report.dropped_total += 1;
            if policy == DropPolicy::Report {
                report.dropped.push(DroppedRow {
                    line,
                    column: missing.unwrap_or(COLUMN_SENTIMENT_TYPE).to_string(),
                });
            }
            continue;
        };

        let sentiment = match cell(columns.sentiment).parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                report.defaulted_sentiment += 1;
                0.0
            }
        };

        records.push(ReviewRecord::new(
            cell(columns.review),
            label,
            category,
            sentiment,
            sentiment_type,
        )
        .with_line(line));
    }

    report.kept = records.len();
    debug!(
        "normalize_csv: kept={}, dropped={}, defaulted_sentiment={}",
        report.kept, report.dropped_total, report.defaulted_sentiment
    );
    Ok((records, report))
}

/// Service for loading review datasets from disk.
pub struct DatasetService {
    fs: Arc<dyn FileSystem>,
}

impl DatasetService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    #[instrument(skip(self))]
    pub fn load(
        &self,
        path: &Path,
        policy: DropPolicy,
    ) -> ApplicationResult<(Vec<ReviewRecord>, NormalizeReport)> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::InputNotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read reviews", path)?;

        let (records, report) = normalize_csv(content.as_bytes(), policy)?;
        if report.dropped_total > 0 {
            warn!(
                "{}: dropped {} row(s) with missing hierarchy values",
                path.display(),
                report.dropped_total
            );
        }
        Ok((records, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
 Review ,Label, Category ,sentiment,sentiment_type
great service,Support,Speed,1,Positive
slow response,Support,Speed,-1,Negative
meh,Support,Speed,,whatever
no label,,Speed,0,Neutral
no type,Support,Speed,0.5,
";

    #[test]
    fn given_padded_headers_when_normalizing_then_trims_and_parses() {
        let (records, report) = normalize_csv(CSV.as_bytes(), DropPolicy::Report).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(report.kept, 3);
        assert_eq!(records[0].text, "great service");
        assert_eq!(records[0].sentiment, 1.0);
        assert_eq!(records[1].sentiment_type, SentimentType::Negative);
    }

    #[test]
    fn given_unknown_sentiment_type_when_normalizing_then_becomes_neutral() {
        let (records, report) = normalize_csv(CSV.as_bytes(), DropPolicy::Report).unwrap();
        assert_eq!(records[2].sentiment_type, SentimentType::Neutral);
        assert_eq!(records[2].sentiment, 0.0);
        assert_eq!(report.defaulted_sentiment, 1);
    }

    #[test]
    fn given_report_policy_when_rows_dropped_then_lists_line_and_column() {
        let (_, report) = normalize_csv(CSV.as_bytes(), DropPolicy::Report).unwrap();
        assert_eq!(report.dropped_total, 2);
        assert_eq!(
            report.dropped,
            vec![
                DroppedRow {
                    line: 5,
                    column: "Label".into()
                },
                DroppedRow {
                    line: 6,
                    column: "sentiment_type".into()
                },
            ]
        );
    }

    #[test]
    fn given_silent_policy_when_rows_dropped_then_only_counts() {
        let (_, report) = normalize_csv(CSV.as_bytes(), DropPolicy::Silent).unwrap();
        assert_eq!(report.dropped_total, 2);
        assert!(report.dropped.is_empty());
    }

    #[test]
    fn given_text_alias_when_normalizing_then_accepts_it() {
        let csv = "text,Label,Category,sentiment,sentiment_type\nfine,A,B,0,Neutral\n";
        let (records, _) = normalize_csv(csv.as_bytes(), DropPolicy::Silent).unwrap();
        assert_eq!(records[0].text, "fine");
    }

    #[test]
    fn given_missing_column_when_normalizing_then_names_it() {
        let csv = "Review,Label,sentiment,sentiment_type\nfine,A,0,Neutral\n";
        let err = normalize_csv(csv.as_bytes(), DropPolicy::Silent).unwrap_err();
        match err {
            ApplicationError::Domain(DomainError::MissingColumn(name)) => assert_eq!(name, "Category"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn given_header_only_when_normalizing_then_returns_no_records() {
        let csv = "Review,Label,Category,sentiment,sentiment_type\n";
        let (records, report) = normalize_csv(csv.as_bytes(), DropPolicy::Report).unwrap();
        assert!(records.is_empty());
        assert_eq!(report, NormalizeReport::default());
    }
}
