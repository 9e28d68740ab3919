//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::services::View;
use crate::domain::{ChainMode, RowLeaf, SentimentFilter, SentimentType};

/// Sentiment hierarchies and word-frequency views for customer reviews
#[derive(Parser, Debug)]
#[command(name = "sentree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Directory holding the local .sentree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the Label → Category → sentiment hierarchy
    Tree {
        #[command(flatten)]
        input: InputArgs,
        /// Third hierarchy level
        #[arg(long, value_enum, default_value_t = LeafArg::Sentiment)]
        leaf: LeafArg,
        /// Print exchange JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Count words or n-gram phrases
    Words {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        counting: CountArgs,
        /// Show at most N phrases per group
        #[arg(short, long)]
        limit: Option<usize>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Write a visualization (JSON + HTML)
    Render {
        #[command(flatten)]
        input: InputArgs,
        /// View to produce
        #[arg(long, value_enum)]
        view: ViewArg,
        #[command(flatten)]
        counting: CountArgs,
        /// Phrase decomposition for the word tree
        #[arg(long, value_enum, default_value_t = ChainArg::Flat)]
        chain: ChainArg,
        /// Third level of row hierarchies
        #[arg(long, value_enum, default_value_t = LeafArg::Sentiment)]
        leaf: LeafArg,
        /// Output directory (default: output_dir setting)
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out_dir: Option<PathBuf>,
        /// Color for positive sentiment (#RRGGBB)
        #[arg(long)]
        positive_color: Option<String>,
        /// Color for negative sentiment (#RRGGBB)
        #[arg(long)]
        negative_color: Option<String>,
        /// Color for neutral sentiment (#RRGGBB)
        #[arg(long)]
        neutral_color: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Review file and sentiment selection.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Review CSV (Review, Label, Category, sentiment, sentiment_type)
    #[arg(value_hint = ValueHint::FilePath)]
    pub csv: PathBuf,

    /// Sentiment filter (default: filter setting)
    #[arg(short, long, value_enum)]
    pub filter: Option<FilterArg>,
}

/// Phrase counting knobs.
#[derive(Args, Debug, Default)]
pub struct CountArgs {
    /// N-gram width (default: text.ngram setting)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub ngram: Option<u8>,

    /// Minimum occurrences
    #[arg(long)]
    pub min: Option<usize>,

    /// Maximum occurrences
    #[arg(long)]
    pub max: Option<usize>,

    /// Count per (Label, Category) instead of globally
    #[arg(short, long)]
    pub group: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterArg {
    All,
    Positive,
    Negative,
    Neutral,
}

impl From<FilterArg> for SentimentFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => SentimentFilter::All,
            FilterArg::Positive => SentimentFilter::Only(SentimentType::Positive),
            FilterArg::Negative => SentimentFilter::Only(SentimentType::Negative),
            FilterArg::Neutral => SentimentFilter::Only(SentimentType::Neutral),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafArg {
    Sentiment,
    Review,
}

impl From<LeafArg> for RowLeaf {
    fn from(arg: LeafArg) -> Self {
        match arg {
            LeafArg::Sentiment => RowLeaf::SentimentType,
            LeafArg::Review => RowLeaf::Review,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainArg {
    Flat,
    Words,
    Letters,
}

impl From<ChainArg> for ChainMode {
    fn from(arg: ChainArg) -> Self {
        match arg {
            ChainArg::Flat => ChainMode::Flat,
            ChainArg::Words => ChainMode::Words,
            ChainArg::Letters => ChainMode::Letters,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewArg {
    Treemap,
    Dendrogram,
    WordTree,
    Bars,
    Cloud,
}

impl From<ViewArg> for View {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Treemap => View::Treemap,
            ViewArg::Dendrogram => View::Dendrogram,
            ViewArg::WordTree => View::WordTree,
            ViewArg::Bars => View::Bars,
            ViewArg::Cloud => View::Cloud,
        }
    }
}
