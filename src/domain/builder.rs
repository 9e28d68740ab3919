//! Hierarchy builder: folds review rows or counted phrases into one rooted tree.

use tracing::{debug, instrument};

use crate::domain::aggregate::Aggregation;
use crate::domain::arena::HierarchyArena;
use crate::domain::entities::{
    ChainMode, PhraseCount, ReviewRecord, RowLeaf, SentimentFilter, SentimentType,
};
use crate::domain::error::DomainError;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;

pub const DEFAULT_ROOT_NAME: &str = "Reviews";

/// Constructs hierarchies from review data.
#[derive(Debug, Clone)]
pub struct HierarchyBuilder {
    root_name: String,
}

impl Default for HierarchyBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_NAME)
    }
}

impl HierarchyBuilder {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
        }
    }

    /// Build `root → Label → Category → (SentimentType | Review)`.
    ///
    /// Leaves carry a count, the mean sentiment of the rows that reached
    /// them and the sentiment type as color tag. Review leaves also keep
    /// the raw text of every merged row.
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn from_records(
        &self,
        records: &[ReviewRecord],
        filter: SentimentFilter,
        leaf: RowLeaf,
    ) -> TreeResult<HierarchyArena> {
        let mut tree = HierarchyArena::new(self.root_name.clone());
        let root = tree.root();

        for (index, record) in records.iter().enumerate() {
            if !filter.matches(record) {
                continue;
            }
            require(record, index, "Label", &record.label)?;
            require(record, index, "Category", &record.category)?;

            let leaf_name = match leaf {
                RowLeaf::SentimentType => record.sentiment_type.as_str(),
                RowLeaf::Review => {
                    require(record, index, "Review", &record.text)?;
                    record.text.as_str()
                }
            };

            let idx = tree.insert_path(
                root,
                [record.label.as_str(), record.category.as_str(), leaf_name],
            );
            if let Some(node) = tree.get_node_mut(idx) {
                node.data.add_count(1);
                node.data.add_sentiment(record.sentiment);
                // merged review leaves keep the first row's sentiment type
                if node.data.color.is_none() {
                    node.data.color = Some(record.sentiment_type.as_str().to_string());
                }
                if leaf == RowLeaf::Review {
                    node.data.reviews.push(record.text.clone());
                }
            }
        }

        debug!("from_records: nodes={}, leaves={}", tree.len(), tree.total_count());
        Ok(tree)
    }

    /// Build a phrase hierarchy directly under the root.
    pub fn from_phrases(&self, entries: &[PhraseCount], mode: ChainMode) -> HierarchyArena {
        let mut tree = HierarchyArena::new(self.root_name.clone());
        let root = tree.root();
        attach_phrases(&mut tree, root, entries.iter(), mode);
        debug!("from_phrases: phrases={}, nodes={}", entries.len(), tree.len());
        tree
    }

    /// Build `root → Label → Category → phrases` from grouped counts.
    ///
    /// Global groups hang their phrases directly under the root.
    pub fn from_groups(&self, aggregation: &Aggregation, mode: ChainMode) -> HierarchyArena {
        let mut tree = HierarchyArena::new(self.root_name.clone());
        let root = tree.root();
        for group in &aggregation.groups {
            let parent = match &group.key {
                Some(key) => tree.insert_path(root, [key.label.as_str(), key.category.as_str()]),
                None => root,
            };
            attach_phrases(&mut tree, parent, group.entries.iter(), mode);
        }
        debug!(
            "from_groups: groups={}, nodes={}",
            aggregation.groups.len(),
            tree.len()
        );
        tree
    }
}

fn require(record: &ReviewRecord, index: usize, column: &str, value: &str) -> TreeResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::MissingPathValue {
            location: record.location(index),
            column: column.to_string(),
        });
    }
    Ok(())
}

fn attach_phrases<'a, I>(
    tree: &mut HierarchyArena,
    parent: generational_arena::Index,
    entries: I,
    mode: ChainMode,
) where
    I: Iterator<Item = &'a PhraseCount>,
{
    for entry in entries {
        let idx = match mode {
            ChainMode::Flat => tree.child_or_insert(parent, &entry.text),
            ChainMode::Words => tree.insert_path(parent, entry.text.split_whitespace()),
            ChainMode::Letters => {
                // word gaps stay as " " nodes so "ab cd" and "abc d" remain distinct
                let letters: Vec<String> = entry
                    .text
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .chars()
                    .map(String::from)
                    .collect();
                tree.insert_path(parent, letters.iter().map(String::as_str))
            }
        };
        if idx == parent {
            continue;
        }
        if let Some(node) = tree.get_node_mut(idx) {
            node.data.add_count(entry.count);
            node.data.add_sentiment(entry.average_sentiment);
            node.data.color =
                Some(SentimentType::from_score(entry.average_sentiment).as_str().to_string());
        }
    }
}
