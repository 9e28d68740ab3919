//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Sentiment polarity as a closed category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentType {
    Positive,
    Negative,
    Neutral,
}

impl SentimentType {
    pub const ALL: [SentimentType; 3] = [
        SentimentType::Positive,
        SentimentType::Negative,
        SentimentType::Neutral,
    ];

    /// Parse a raw `sentiment_type` cell.
    ///
    /// Returns `None` for an empty cell (the row is dropped upstream).
    /// Any non-empty value that is not one of the three categories becomes `Neutral`.
    pub fn from_cell(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let kind = match trimmed.to_ascii_lowercase().as_str() {
            "positive" => SentimentType::Positive,
            "negative" => SentimentType::Negative,
            _ => SentimentType::Neutral,
        };
        Some(kind)
    }

    /// Numeric sign convention: >0 positive, <0 negative, otherwise neutral.
    ///
    /// Only used to classify aggregated scores, never to select records.
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            SentimentType::Positive
        } else if score < 0.0 {
            SentimentType::Negative
        } else {
            SentimentType::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentType::Positive => "Positive",
            SentimentType::Negative => "Negative",
            SentimentType::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for SentimentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized input row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub text: String,
    pub label: String,
    pub category: String,
    /// Signed polarity score
    pub sentiment: f64,
    pub sentiment_type: SentimentType,
    /// 1-based CSV line the record came from, when loaded from a file
    pub line: Option<u64>,
}

impl ReviewRecord {
    pub fn new(
        text: impl Into<String>,
        label: impl Into<String>,
        category: impl Into<String>,
        sentiment: f64,
        sentiment_type: SentimentType,
    ) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
            category: category.into(),
            sentiment,
            sentiment_type,
            line: None,
        }
    }

    pub fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    /// Where the record came from, for error messages.
    pub fn location(&self, index: usize) -> String {
        match self.line {
            Some(line) => format!("line {line}"),
            None => format!("record {}", index + 1),
        }
    }
}

/// Record selection by sentiment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentimentFilter {
    #[default]
    All,
    Only(SentimentType),
}

impl SentimentFilter {
    /// Filtering always uses the categorical `sentiment_type`.
    pub fn matches(&self, record: &ReviewRecord) -> bool {
        match self {
            SentimentFilter::All => true,
            SentimentFilter::Only(kind) => record.sentiment_type == *kind,
        }
    }
}

impl FromStr for SentimentFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SentimentFilter::All),
            "positive" => Ok(SentimentFilter::Only(SentimentType::Positive)),
            "negative" => Ok(SentimentFilter::Only(SentimentType::Negative)),
            "neutral" => Ok(SentimentFilter::Only(SentimentType::Neutral)),
            _ => Err(DomainError::InvalidSentimentFilter(s.to_string())),
        }
    }
}

impl fmt::Display for SentimentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentFilter::All => f.write_str("All"),
            SentimentFilter::Only(kind) => write!(f, "{}", kind),
        }
    }
}

/// Inclusive occurrence-count band applied after counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OccurrenceBand {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl OccurrenceBand {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, count: usize) -> bool {
        self.min.map_or(true, |min| count >= min) && self.max.map_or(true, |max| count <= max)
    }
}

/// Scope of frequency counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grouping {
    #[default]
    Global,
    ByLabelCategory,
}

/// Third level of the row hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowLeaf {
    #[default]
    SentimentType,
    Review,
}

/// Shape of a phrase hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainMode {
    /// Every phrase is a direct child of its parent
    #[default]
    Flat,
    /// One node per word
    Words,
    /// One node per letter
    Letters,
}

/// Counted token or n-gram phrase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseCount {
    pub text: String,
    pub count: usize,
    pub average_sentiment: f64,
    /// Label of the first record containing the phrase
    pub representative_label: String,
    /// Category of the first record containing the phrase
    pub representative_category: String,
}

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid regex"));

/// Categorical color map keyed by sentiment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub positive: String,
    pub negative: String,
    pub neutral: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            positive: "#90EE90".into(),
            negative: "#F08080".into(),
            neutral: "#D3D3D3".into(),
        }
    }
}

impl ColorScheme {
    pub fn color_for(&self, kind: SentimentType) -> &str {
        match kind {
            SentimentType::Positive => &self.positive,
            SentimentType::Negative => &self.negative,
            SentimentType::Neutral => &self.neutral,
        }
    }

    /// Check that every entry is a `#RRGGBB` hex value.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("positive", &self.positive),
            ("negative", &self.negative),
            ("neutral", &self.neutral),
        ] {
            if !HEX_COLOR.is_match(value) {
                return Err(DomainError::InvalidColor {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Positive", Some(SentimentType::Positive))]
    #[case(" negative ", Some(SentimentType::Negative))]
    #[case("NEUTRAL", Some(SentimentType::Neutral))]
    #[case("mixed", Some(SentimentType::Neutral))]
    #[case("", None)]
    #[case("   ", None)]
    fn given_raw_cell_when_parsing_sentiment_type_then_coerces_to_closed_set(
        #[case] raw: &str,
        #[case] expected: Option<SentimentType>,
    ) {
        assert_eq!(SentimentType::from_cell(raw), expected);
    }

    #[rstest]
    #[case(0.7, SentimentType::Positive)]
    #[case(-0.1, SentimentType::Negative)]
    #[case(0.0, SentimentType::Neutral)]
    fn given_score_when_classifying_then_uses_sign(#[case] score: f64, #[case] expected: SentimentType) {
        assert_eq!(SentimentType::from_score(score), expected);
    }

    #[test]
    fn given_filter_when_matching_then_uses_category_not_score() {
        // score and category disagree on purpose
        let record = ReviewRecord::new("ok", "L", "C", -0.5, SentimentType::Positive);
        let filter: SentimentFilter = "positive".parse().unwrap();
        assert!(filter.matches(&record));
        assert!(SentimentFilter::All.matches(&record));
        assert!(!SentimentFilter::Only(SentimentType::Negative).matches(&record));
    }

    #[test]
    fn given_unknown_filter_when_parsing_then_errors() {
        let err = "happy".parse::<SentimentFilter>().unwrap_err();
        assert_eq!(err, DomainError::InvalidSentimentFilter("happy".into()));
    }

    #[test]
    fn given_band_when_checking_then_bounds_are_inclusive() {
        let band = OccurrenceBand::new(Some(2), Some(50));
        assert!(!band.contains(1));
        assert!(band.contains(2));
        assert!(band.contains(50));
        assert!(!band.contains(51));
        assert!(OccurrenceBand::default().contains(1));
    }

    #[test]
    fn given_bad_hex_when_validating_colors_then_names_field() {
        let colors = ColorScheme {
            negative: "red".into(),
            ..ColorScheme::default()
        };
        let err = colors.validate().unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidColor {
                field: "negative".into(),
                value: "red".into()
            }
        );
        assert!(ColorScheme::default().validate().is_ok());
    }
}
