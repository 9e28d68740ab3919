//! Domain layer: review entities, text cleaning, counting and tree building
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod aggregate;
pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod text;

pub use aggregate::{AggregateOptions, Aggregation, FrequencyAggregator, GroupKey, PhraseGroup};
pub use arena::{HierarchyArena, HierarchyNode, NodeData, TreeNode};
pub use builder::{HierarchyBuilder, DEFAULT_ROOT_NAME};
pub use entities::*;
pub use error::DomainError;
pub use text::{default_stop_words, TextCleaner};
