//! Tests for RenderService against an in-memory filesystem

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sentree::application::services::{CountRow, Encoding, Payload, RenderService, View};
use sentree::domain::{ColorScheme, PhraseCount, SentimentFilter, SentimentType};
use sentree::infrastructure::traits::FileSystem;
use sentree::util::testing;

#[derive(Default)]
struct MemoryFs {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl FileSystem for MemoryFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

fn phrase(text: &str, count: usize, average_sentiment: f64) -> PhraseCount {
    PhraseCount {
        text: text.to_string(),
        count,
        average_sentiment,
        representative_label: "Support".to_string(),
        representative_category: "Speed".to_string(),
    }
}

#[test]
fn given_counts_when_rendering_bars_then_writes_both_artifacts_through_filesystem() {
    // Arrange
    testing::init_test_setup();
    let fs = Arc::new(MemoryFs::default());
    let service = RenderService::new(fs.clone());
    let rows = vec![
        CountRow::from(&phrase("replies", 3, 0.2)),
        CountRow::from(&phrase("slow", 1, -0.6)),
    ];
    let colors = ColorScheme {
        positive: "#00FF00".to_string(),
        ..ColorScheme::default()
    };
    let encoding = Encoding::new(&["text"], &["text", "count"], &colors);

    // Act
    let rendered = service
        .render(
            View::Bars,
            &Payload::Counts(rows),
            &encoding,
            "Reviews: Word Frequency",
            SentimentFilter::All,
        )
        .unwrap();
    let paths = service.write(&rendered, Path::new("/out")).unwrap();

    // Assert
    assert_eq!(
        paths,
        vec![PathBuf::from("/out/bars.json"), PathBuf::from("/out/bars.html")]
    );
    let json = fs.read_to_string(&paths[0]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["text"], "replies");
    assert_eq!(value[0]["color"], "Positive");
    assert_eq!(value[1]["color"], "Negative");

    let html = fs.read_to_string(&paths[1]).unwrap();
    assert!(html.contains("#00FF00"));
    assert!(html.contains("Filter: All"));
}

#[test]
fn given_encoding_when_built_then_maps_every_sentiment_type() {
    let encoding = Encoding::new(&["Label", "Category"], &["name"], &ColorScheme::default());

    assert_eq!(encoding.size, "count");
    assert_eq!(encoding.path, vec!["Label", "Category"]);
    for kind in SentimentType::ALL {
        assert!(encoding.color_map.contains_key(kind.as_str()));
    }
    assert_eq!(encoding.color_map["Negative"], "#F08080");
}

#[test]
fn given_html_in_title_when_rendering_then_title_is_escaped() {
    let service = RenderService::new(Arc::new(MemoryFs::default()));
    let encoding = Encoding::new(&[], &[], &ColorScheme::default());

    let rendered = service
        .render(
            View::Cloud,
            &Payload::Counts(vec![CountRow::from(&phrase("fast", 2, 0.5))]),
            &encoding,
            "<b>Reviews</b>",
            SentimentFilter::Only(SentimentType::Neutral),
        )
        .unwrap();

    assert!(rendered.html.contains("&lt;b&gt;Reviews&lt;/b&gt;"));
    assert!(rendered.html.contains("Filter: Neutral"));
}
