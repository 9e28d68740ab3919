//! Tests for DatasetService

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use sentree::application::services::{DatasetService, DropPolicy};
use sentree::application::ApplicationError;
use sentree::domain::{DomainError, SentimentType};
use sentree::infrastructure::traits::RealFileSystem;
use sentree::util::testing;

fn create_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write csv");
    path
}

fn service() -> DatasetService {
    testing::init_test_setup();
    DatasetService::new(Arc::new(RealFileSystem))
}

#[test]
fn given_review_csv_when_loading_then_returns_normalized_records() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let csv = create_csv(
        &temp,
        "reviews.csv",
        "Review,Label,Category, sentiment ,sentiment_type\n\
         \"Great, great service!!!\",Support,Speed,0.9,positive\n\
         Slow response,Support,Speed,-0.4,NEGATIVE\n",
    );

    // Act
    let (records, report) = service().load(&csv, DropPolicy::Report).unwrap();

    // Assert
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text, "Great, great service!!!");
    assert_eq!(records[0].sentiment_type, SentimentType::Positive);
    assert_eq!(records[1].sentiment_type, SentimentType::Negative);
    assert_eq!(records[1].sentiment, -0.4);
    assert_eq!(records[1].line, Some(3));
    assert_eq!(report.dropped_total, 0);
}

#[test]
fn given_rows_missing_hierarchy_values_when_loading_then_drops_and_reports_them() {
    let temp = TempDir::new().unwrap();
    let csv = create_csv(
        &temp,
        "reviews.csv",
        "Review,Label,Category,sentiment,sentiment_type\n\
         fine,Support,Speed,0,Neutral\n\
         orphan,Support,,0.1,Positive\n",
    );

    let (records, report) = service().load(&csv, DropPolicy::Report).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(report.dropped.len(), 1);
    assert_eq!(report.dropped[0].line, 3);
    assert_eq!(report.dropped[0].column, "Category");
}

#[test]
fn given_missing_file_when_loading_then_returns_input_not_found() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.csv");

    let err = service().load(&missing, DropPolicy::Report).unwrap_err();

    assert!(matches!(err, ApplicationError::InputNotFound(p) if p == missing));
}

#[test]
fn given_csv_without_sentiment_type_when_loading_then_names_missing_column() {
    let temp = TempDir::new().unwrap();
    let csv = create_csv(&temp, "reviews.csv", "Review,Label,Category,sentiment\nok,A,B,1\n");

    let err = service().load(&csv, DropPolicy::Silent).unwrap_err();

    match err {
        ApplicationError::Domain(DomainError::MissingColumn(name)) => {
            assert_eq!(name, "sentiment_type")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn given_loaded_file_when_loading_then_source_is_unchanged() {
    let temp = TempDir::new().unwrap();
    let content = " Review ,Label,Category,sentiment,sentiment_type\nok,A,,1,Positive\n";
    let csv = create_csv(&temp, "reviews.csv", content);

    let _ = service().load(&csv, DropPolicy::Report).unwrap();

    assert_eq!(std::fs::read_to_string(&csv).unwrap(), content);
}
