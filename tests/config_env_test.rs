//! SENTREE_* environment overrides.
//!
//! Kept in its own test binary: environment variables are process-global.

use std::fs;

use tempfile::TempDir;

use sentree::config::{local_config_path, Settings};

#[test]
fn given_env_vars_when_load_then_override_local_config() {
    // Arrange
    let project = TempDir::new().unwrap();
    fs::write(
        local_config_path(project.path()),
        r#"
root_name = "Feedback"

[text]
ngram = 1
"#,
    )
    .unwrap();
    std::env::set_var("SENTREE_ROOT_NAME", "Tickets");
    std::env::set_var("SENTREE_TEXT__NGRAM", "2");
    std::env::set_var("SENTREE_TEXT__EXCLUDE_WORDS", "refund,invoice");

    // Act
    let settings = Settings::load(Some(project.path()));

    std::env::remove_var("SENTREE_ROOT_NAME");
    std::env::remove_var("SENTREE_TEXT__NGRAM");
    std::env::remove_var("SENTREE_TEXT__EXCLUDE_WORDS");

    // Assert
    let settings = settings.expect("load settings");
    assert_eq!(settings.root_name, "Tickets");
    assert_eq!(settings.text.ngram, 2);
    assert_eq!(settings.text.exclude_words, vec!["refund", "invoice"]);
}
