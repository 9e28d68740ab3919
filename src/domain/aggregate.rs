//! Word and phrase frequency counting over review records.

use std::collections::HashMap;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::entities::{Grouping, OccurrenceBand, PhraseCount, ReviewRecord, SentimentFilter};
use crate::domain::text::TextCleaner;

/// Knobs for one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub filter: SentimentFilter,
    /// N-gram width, 1 for single words
    pub ngram: usize,
    pub band: OccurrenceBand,
    pub grouping: Grouping,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            filter: SentimentFilter::All,
            ngram: 1,
            band: OccurrenceBand::default(),
            grouping: Grouping::Global,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub label: String,
    pub category: String,
}

/// Counted phrases of one scope, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseGroup {
    /// `None` for global counting
    pub key: Option<GroupKey>,
    pub entries: Vec<PhraseCount>,
}

impl PhraseGroup {
    /// Entries by count descending, ties by text ascending.
    pub fn ranked(&self) -> Vec<&PhraseCount> {
        self.entries
            .iter()
            .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.text.cmp(&b.text)))
            .collect()
    }

    pub fn get(&self, text: &str) -> Option<&PhraseCount> {
        self.entries.iter().find(|e| e.text == text)
    }
}

/// Result of an aggregation pass; groups without surviving phrases are omitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregation {
    pub groups: Vec<PhraseGroup>,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn phrase_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    /// All entries across groups, in group order.
    pub fn entries(&self) -> impl Iterator<Item = &PhraseCount> {
        self.groups.iter().flat_map(|g| g.entries.iter())
    }

    pub fn group(&self, label: &str, category: &str) -> Option<&PhraseGroup> {
        self.groups.iter().find(|g| {
            g.key
                .as_ref()
                .is_some_and(|k| k.label == label && k.category == category)
        })
    }
}

#[derive(Debug)]
struct Tally {
    text: String,
    count: usize,
    sentiment_sum: f64,
    records: usize,
    label: String,
    category: String,
}

#[derive(Debug, Default)]
struct GroupTally {
    tallies: Vec<Tally>,
    index: HashMap<String, usize>,
}

impl GroupTally {
    fn add_record(&mut self, record: &ReviewRecord, phrases: &[String]) {
        for phrase in phrases {
            let idx = match self.index.get(phrase) {
                Some(&idx) => idx,
                None => {
                    self.tallies.push(Tally {
                        text: phrase.clone(),
                        count: 0,
                        sentiment_sum: 0.0,
                        records: 0,
                        label: record.label.clone(),
                        category: record.category.clone(),
                    });
                    self.index.insert(phrase.clone(), self.tallies.len() - 1);
                    self.tallies.len() - 1
                }
            };
            self.tallies[idx].count += 1;
        }
        // a record contributes its score once per distinct phrase
        for phrase in phrases.iter().unique() {
            if let Some(&idx) = self.index.get(phrase) {
                self.tallies[idx].sentiment_sum += record.sentiment;
                self.tallies[idx].records += 1;
            }
        }
    }

    fn finish(self, band: OccurrenceBand) -> Vec<PhraseCount> {
        self.tallies
            .into_iter()
            .filter(|t| band.contains(t.count))
            .map(|t| PhraseCount {
                average_sentiment: t.sentiment_sum / t.records.max(1) as f64,
                text: t.text,
                count: t.count,
                representative_label: t.label,
                representative_category: t.category,
            })
            .collect()
    }
}

/// Counts cleaned tokens or n-grams per scope.
#[derive(Debug, Clone)]
pub struct FrequencyAggregator {
    cleaner: TextCleaner,
}

impl FrequencyAggregator {
    pub fn new(cleaner: TextCleaner) -> Self {
        Self { cleaner }
    }

    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn aggregate(&self, records: &[ReviewRecord], options: &AggregateOptions) -> Aggregation {
        let mut order: Vec<Option<GroupKey>> = Vec::new();
        let mut tallies: HashMap<Option<GroupKey>, GroupTally> = HashMap::new();

        for record in records.iter().filter(|r| options.filter.matches(r)) {
            let phrases = self.cleaner.clean(&record.text, options.ngram);
            if phrases.is_empty() {
                continue;
            }
            let key = match options.grouping {
                Grouping::Global => None,
                Grouping::ByLabelCategory => Some(GroupKey {
                    label: record.label.clone(),
                    category: record.category.clone(),
                }),
            };
            if !tallies.contains_key(&key) {
                order.push(key.clone());
            }
            tallies.entry(key).or_default().add_record(record, &phrases);
        }

        let groups: Vec<PhraseGroup> = order
            .into_iter()
            .filter_map(|key| {
                let tally = tallies.remove(&key)?;
                let entries = tally.finish(options.band);
                (!entries.is_empty()).then_some(PhraseGroup { key, entries })
            })
            .collect();

        let aggregation = Aggregation { groups };
        debug!(
            "aggregate: filter={}, ngram={}, groups={}, phrases={}",
            options.filter,
            options.ngram,
            aggregation.groups.len(),
            aggregation.phrase_count()
        );
        aggregation
    }
}
