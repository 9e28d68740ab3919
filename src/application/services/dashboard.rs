//! One render cycle: context → counts or hierarchy → visualization artifacts

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::services::render::{
    CountRow, Encoding, Payload, RenderService, RenderedView, View,
};
use crate::application::ApplicationResult;
use crate::domain::{
    AggregateOptions, Aggregation, ChainMode, ColorScheme, DomainError, FrequencyAggregator,
    Grouping, HierarchyArena, HierarchyBuilder, OccurrenceBand, ReviewRecord, RowLeaf,
    SentimentFilter, TextCleaner, DEFAULT_ROOT_NAME,
};
use crate::infrastructure::traits::FileSystem;

/// Widest n-gram offered.
pub const MAX_NGRAM: usize = 3;

/// Everything one render cycle needs, passed by reference to every stage.
#[derive(Debug, Clone)]
pub struct ViewContext<'a> {
    pub records: &'a [ReviewRecord],
    pub filter: SentimentFilter,
    pub band: OccurrenceBand,
    pub ngram: usize,
    pub grouping: Grouping,
    pub leaf: RowLeaf,
    pub chain: ChainMode,
    pub colors: ColorScheme,
    pub root_name: String,
    pub cleaner: TextCleaner,
}

impl<'a> ViewContext<'a> {
    /// Context with default selections over `records`.
    pub fn new(records: &'a [ReviewRecord]) -> Self {
        Self {
            records,
            filter: SentimentFilter::All,
            band: OccurrenceBand::default(),
            ngram: 1,
            grouping: Grouping::Global,
            leaf: RowLeaf::SentimentType,
            chain: ChainMode::Flat,
            colors: ColorScheme::default(),
            root_name: DEFAULT_ROOT_NAME.to_string(),
            cleaner: TextCleaner::english(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(1..=MAX_NGRAM).contains(&self.ngram) {
            return Err(DomainError::InvalidNgram(self.ngram));
        }
        self.colors.validate()
    }

    fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            filter: self.filter,
            ngram: self.ngram,
            band: self.band,
            grouping: self.grouping,
        }
    }
}

/// Orchestrates aggregation, tree building and rendering.
pub struct DashboardService {
    renderer: RenderService,
}

impl DashboardService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            renderer: RenderService::new(fs),
        }
    }

    /// `root → Label → Category → leaf` over the filtered records.
    #[instrument(level = "debug", skip(self, ctx), fields(records = ctx.records.len()))]
    pub fn row_tree(&self, ctx: &ViewContext<'_>) -> ApplicationResult<HierarchyArena> {
        ctx.validate()?;
        let tree = HierarchyBuilder::new(ctx.root_name.clone()).from_records(
            ctx.records,
            ctx.filter,
            ctx.leaf,
        )?;
        Ok(tree)
    }

    #[instrument(level = "debug", skip(self, ctx), fields(records = ctx.records.len()))]
    pub fn phrase_counts(&self, ctx: &ViewContext<'_>) -> ApplicationResult<Aggregation> {
        ctx.validate()?;
        let aggregator = FrequencyAggregator::new(ctx.cleaner.clone());
        Ok(aggregator.aggregate(ctx.records, &ctx.aggregate_options()))
    }

    /// Phrase hierarchy; grouped counts hang under their label and category.
    pub fn phrase_tree(&self, ctx: &ViewContext<'_>) -> ApplicationResult<HierarchyArena> {
        let aggregation = self.phrase_counts(ctx)?;
        let builder = HierarchyBuilder::new(ctx.root_name.clone());
        let tree = match ctx.grouping {
            Grouping::Global => {
                let entries: Vec<_> = aggregation.entries().cloned().collect();
                builder.from_phrases(&entries, ctx.chain)
            }
            Grouping::ByLabelCategory => builder.from_groups(&aggregation, ctx.chain),
        };
        Ok(tree)
    }

    /// Build the document for `view` without touching the filesystem.
    pub fn build_view(&self, ctx: &ViewContext<'_>, view: View) -> ApplicationResult<RenderedView> {
        let (payload, encoding) = match view {
            View::Treemap | View::Dendrogram => {
                let third = match ctx.leaf {
                    RowLeaf::SentimentType => "sentiment_type",
                    RowLeaf::Review => "Review",
                };
                (
                    Payload::Tree(self.row_tree(ctx)?.to_node()),
                    Encoding::new(
                        &["Label", "Category", third],
                        &["name", "count", "sentiment", "reviews"],
                        &ctx.colors,
                    ),
                )
            }
            View::WordTree => {
                let path: &[&str] = match ctx.grouping {
                    Grouping::Global => &["phrase"],
                    Grouping::ByLabelCategory => &["Label", "Category", "phrase"],
                };
                (
                    Payload::Tree(self.phrase_tree(ctx)?.to_node()),
                    Encoding::new(path, &["name", "count", "sentiment"], &ctx.colors),
                )
            }
            View::Bars | View::Cloud => {
                let aggregation = self.phrase_counts(ctx)?;
                let rows = aggregation
                    .groups
                    .iter()
                    .flat_map(|g| g.ranked())
                    .map(CountRow::from)
                    .collect();
                (
                    Payload::Counts(rows),
                    Encoding::new(
                        &["text"],
                        &["text", "count", "average_sentiment", "label", "category"],
                        &ctx.colors,
                    ),
                )
            }
        };

        let title = format!("{}: {}", ctx.root_name, view.title());
        self.renderer
            .render(view, &payload, &encoding, &title, ctx.filter)
    }

    /// Full cycle: build the view and write its artifacts into `out_dir`.
    #[instrument(skip(self, ctx))]
    pub fn render(
        &self,
        ctx: &ViewContext<'_>,
        view: View,
        out_dir: &Path,
    ) -> ApplicationResult<Vec<PathBuf>> {
        let rendered = self.build_view(ctx, view)?;
        let paths = self.renderer.write(&rendered, out_dir)?;
        info!("rendered {} into {}", view, out_dir.display());
        Ok(paths)
    }
}
