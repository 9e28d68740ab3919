//! Render adapter: serializes hierarchies and counts, fills visualization templates
//!
//! Owns no layout logic; charting is delegated to the script embedded in each page.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    ColorScheme, DomainError, HierarchyNode, PhraseCount, SentimentFilter, SentimentType,
};
use crate::infrastructure::traits::FileSystem;

const PAGE_TEMPLATE: &str = include_str!("../../templates/page.html");

/// Visualization surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Treemap,
    Dendrogram,
    WordTree,
    Bars,
    Cloud,
}

impl View {
    pub fn file_stem(&self) -> &'static str {
        match self {
            View::Treemap => "treemap",
            View::Dendrogram => "dendrogram",
            View::WordTree => "word-tree",
            View::Bars => "bars",
            View::Cloud => "cloud",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Treemap => "Sentiment Tree Map",
            View::Dendrogram => "Review Dendrogram",
            View::WordTree => "Phrase Word Tree",
            View::Bars => "Word Frequency",
            View::Cloud => "Word Cloud",
        }
    }

    fn script(&self) -> &'static str {
        match self {
            View::Treemap => include_str!("../../templates/treemap.js"),
            View::Dendrogram => include_str!("../../templates/dendrogram.js"),
            View::WordTree => include_str!("../../templates/word_tree.js"),
            View::Bars => include_str!("../../templates/bars.js"),
            View::Cloud => include_str!("../../templates/cloud.js"),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Flat chart row for bar and cloud views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountRow {
    pub text: String,
    pub count: usize,
    pub average_sentiment: f64,
    /// Sentiment type derived from the sign of the average
    pub color: String,
    pub label: String,
    pub category: String,
}

impl From<&PhraseCount> for CountRow {
    fn from(entry: &PhraseCount) -> Self {
        Self {
            text: entry.text.clone(),
            count: entry.count,
            average_sentiment: entry.average_sentiment,
            color: SentimentType::from_score(entry.average_sentiment)
                .as_str()
                .to_string(),
            label: entry.representative_label.clone(),
            category: entry.representative_category.clone(),
        }
    }
}

/// Data handed to a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Tree(HierarchyNode),
    Counts(Vec<CountRow>),
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Tree(node) => node.children.is_empty(),
            Payload::Counts(rows) => rows.is_empty(),
        }
    }

    pub fn to_json(&self) -> ApplicationResult<String> {
        match self {
            Payload::Tree(node) => to_json(node),
            Payload::Counts(rows) => to_json(rows),
        }
    }
}

/// Declared visual-encoding parameters for the external chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encoding {
    /// Hierarchy levels below the root
    pub path: Vec<String>,
    /// Field holding the size value
    pub size: String,
    /// Color tag → hex color
    pub color_map: BTreeMap<String, String>,
    /// Fields shown on hover
    pub hover: Vec<String>,
}

impl Encoding {
    pub fn new(path: &[&str], hover: &[&str], colors: &ColorScheme) -> Self {
        let color_map = SentimentType::ALL
            .iter()
            .map(|kind| (kind.as_str().to_string(), colors.color_for(*kind).to_string()))
            .collect();
        Self {
            path: path.iter().map(|s| s.to_string()).collect(),
            size: "count".to_string(),
            color_map,
            hover: hover.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A filled-in visualization document plus its exchange JSON.
#[derive(Debug, Clone)]
pub struct RenderedView {
    pub view: View,
    pub json: String,
    pub html: String,
}

/// Pretty JSON with struct field order preserved.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> ApplicationResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| ApplicationError::Render {
        message: format!("serialize: {e}"),
    })
}

/// JSON is embedded in a `<script>` block, so a closing tag must not appear.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Service turning payloads into visualization artifacts.
pub struct RenderService {
    fs: Arc<dyn FileSystem>,
}

impl RenderService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Fill the page template for `view`.
    ///
    /// An empty payload is rejected: there is nothing to chart.
    #[instrument(level = "debug", skip(self, payload, encoding))]
    pub fn render(
        &self,
        view: View,
        payload: &Payload,
        encoding: &Encoding,
        title: &str,
        filter: SentimentFilter,
    ) -> ApplicationResult<RenderedView> {
        if payload.is_empty() {
            return Err(DomainError::EmptyAggregation(format!(
                "no data for {} view with filter {}",
                view, filter
            ))
            .into());
        }
        let json = payload.to_json()?;
        let encoding_json = to_json(encoding)?;
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();

        let html = PAGE_TEMPLATE
            .replace("{{TITLE}}", &escape_html(title))
            .replace("{{FILTER}}", &escape_html(&filter.to_string()))
            .replace("{{GENERATED}}", &generated)
            .replace("{{ENCODING}}", &script_safe(&encoding_json))
            .replace("{{SCRIPT}}", view.script())
            .replace("{{DATA}}", &script_safe(&json));

        debug!("render: view={}, json_bytes={}, html_bytes={}", view, json.len(), html.len());
        Ok(RenderedView { view, json, html })
    }

    /// Write `<out_dir>/<view>.json` and `<out_dir>/<view>.html`.
    #[instrument(level = "debug", skip(self, rendered))]
    pub fn write(&self, rendered: &RenderedView, out_dir: &Path) -> ApplicationResult<Vec<PathBuf>> {
        self.fs
            .create_dir_all(out_dir)
            .with_path_context("create output directory", out_dir)?;

        let stem = rendered.view.file_stem();
        let json_path = out_dir.join(format!("{stem}.json"));
        let html_path = out_dir.join(format!("{stem}.html"));

        self.fs
            .write(&json_path, &rendered.json)
            .with_path_context("write exchange json", &json_path)?;
        self.fs
            .write(&html_path, &rendered.html)
            .with_path_context("write visualization", &html_path)?;

        Ok(vec![json_path, html_path])
    }
}
