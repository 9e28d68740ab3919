//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/sentree/sentree.toml`
//! 3. Local config: `<project_dir>/.sentree.toml`
//! 4. Environment variables: `SENTREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::DropPolicy;
use crate::application::ApplicationError;
use crate::domain::{
    default_stop_words, ColorScheme, OccurrenceBand, SentimentFilter, TextCleaner, DEFAULT_ROOT_NAME,
};

/// Text cleaning configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TextConfig {
    /// Tokens must be strictly longer than this
    pub min_length: usize,
    /// Default n-gram width (1..=3)
    pub ngram: usize,
    /// Extra stop words; `!word` removes a built-in one
    pub stop_words: Vec<String>,
    /// Words never counted
    pub exclude_words: Vec<String>,
    /// Start from the built-in English list
    pub use_default_stop_words: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            min_length: crate::domain::text::DEFAULT_MIN_LENGTH,
            ngram: 1,
            stop_words: vec![],
            exclude_words: vec![],
            use_default_stop_words: true,
        }
    }
}

/// Raw text config for intermediate parsing (arrays are Option to detect "not specified").
///
/// Used during layered config merging to distinguish between:
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawTextConfig {
    pub min_length: Option<usize>,
    pub ngram: Option<usize>,
    pub stop_words: Option<Vec<String>>,
    pub exclude_words: Option<Vec<String>>,
    pub use_default_stop_words: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawColors {
    pub positive: Option<String>,
    pub negative: Option<String>,
    pub neutral: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub root_name: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub drop_policy: Option<DropPolicy>,
    pub filter: Option<String>,
    pub colors: RawColors,
    pub text: RawTextConfig,
    pub band: OccurrenceBand,
}

impl TextConfig {
    /// Merge word lists with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - A `!word` that matches nothing stays, so it can still act on the built-in stop words
    /// - A later plain `word` cancels a pending `!word`
    /// - Entries are lower-cased and de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["nice", "good"], &["great"])        // → ["good", "great", "nice"]
    /// merge_array(&["nice", "good"], &["!nice", "ok"])  // → ["good", "ok"]
    /// merge_array(&["good"], &["!not"])                 // → ["!not", "good"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().map(|w| w.to_lowercase()).collect();

        for word in overlay.iter().map(|w| w.to_lowercase()) {
            if let Some(negated) = word.strip_prefix('!') {
                if !result.remove(negated) {
                    result.insert(word.clone());
                }
            } else {
                result.remove(&format!("!{word}"));
                result.insert(word);
            }
        }

        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Scalars: overlay wins if Some. Arrays: union with negation.
    pub fn merge(&self, overlay: &RawTextConfig) -> Self {
        Self {
            min_length: overlay.min_length.unwrap_or(self.min_length),
            ngram: overlay.ngram.unwrap_or(self.ngram),
            stop_words: overlay
                .stop_words
                .as_ref()
                .map(|o| Self::merge_array(&self.stop_words, o))
                .unwrap_or_else(|| self.stop_words.clone()),
            exclude_words: overlay
                .exclude_words
                .as_ref()
                .map(|o| Self::merge_array(&self.exclude_words, o))
                .unwrap_or_else(|| self.exclude_words.clone()),
            use_default_stop_words: overlay
                .use_default_stop_words
                .unwrap_or(self.use_default_stop_words),
        }
    }

    /// Global config REPLACES arrays instead of merging them.
    pub fn apply_global(&self, global: &RawTextConfig) -> Self {
        Self {
            min_length: global.min_length.unwrap_or(self.min_length),
            ngram: global.ngram.unwrap_or(self.ngram),
            stop_words: global
                .stop_words
                .clone()
                .unwrap_or_else(|| self.stop_words.clone()),
            exclude_words: global
                .exclude_words
                .clone()
                .unwrap_or_else(|| self.exclude_words.clone()),
            use_default_stop_words: global
                .use_default_stop_words
                .unwrap_or(self.use_default_stop_words),
        }
    }

    /// Cleaner for this configuration.
    ///
    /// `stop_words` entries are applied on top of the built-in list, so
    /// `!word` re-admits a default stop word. Negations win over additions.
    pub fn cleaner(&self) -> TextCleaner {
        let base: HashSet<String> = if self.use_default_stop_words {
            default_stop_words().clone()
        } else {
            HashSet::new()
        };
        TextCleaner::new(
            Self::resolve(base, &self.stop_words),
            Self::resolve(HashSet::new(), &self.exclude_words),
            self.min_length,
        )
    }

    fn resolve(mut base: HashSet<String>, entries: &[String]) -> HashSet<String> {
        let (negations, additions): (Vec<String>, Vec<String>) = entries
            .iter()
            .map(|w| w.to_lowercase())
            .partition(|w| w.starts_with('!'));
        base.extend(additions);
        for word in &negations {
            base.remove(&word[1..]);
        }
        base
    }
}

impl RawColors {
    fn over(&self, base: &ColorScheme) -> ColorScheme {
        ColorScheme {
            positive: self.positive.clone().unwrap_or_else(|| base.positive.clone()),
            negative: self.negative.clone().unwrap_or_else(|| base.negative.clone()),
            neutral: self.neutral.clone().unwrap_or_else(|| base.neutral.clone()),
        }
    }
}

/// Unified configuration for sentree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Name of the hierarchy root (default: "Reviews")
    pub root_name: String,
    /// Where rendered views are written (default: ./sentree-out)
    pub output_dir: PathBuf,
    /// Handling of rows missing Label, Category or sentiment_type
    pub drop_policy: DropPolicy,
    /// Default sentiment filter: all, positive, negative or neutral
    pub filter: String,
    /// Sentiment color map
    pub colors: ColorScheme,
    /// Text cleaning
    pub text: TextConfig,
    /// Default occurrence band for word counts
    pub band: OccurrenceBand,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            output_dir: PathBuf::from("sentree-out"),
            drop_policy: DropPolicy::default(),
            filter: "all".to_string(),
            colors: ColorScheme::default(),
            text: TextConfig::default(),
            band: OccurrenceBand::default(),
        }
    }
}

/// Get the XDG config directory for sentree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sentree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("sentree.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".sentree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// The configured default filter.
    pub fn sentiment_filter(&self) -> Result<SentimentFilter, ApplicationError> {
        Ok(self.filter.parse::<SentimentFilter>()?)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.output_dir.to_string_lossy().as_ref());
        self.output_dir = PathBuf::from(expanded);
    }

    /// Merge overlay config onto self (base) with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            root_name: overlay
                .root_name
                .clone()
                .unwrap_or_else(|| self.root_name.clone()),
            output_dir: overlay
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            drop_policy: overlay.drop_policy.unwrap_or(self.drop_policy),
            filter: overlay.filter.clone().unwrap_or_else(|| self.filter.clone()),
            colors: overlay.colors.over(&self.colors),
            text: self.text.merge(&overlay.text),
            band: OccurrenceBand {
                min: overlay.band.min.or(self.band.min),
                max: overlay.band.max.or(self.band.max),
            },
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            text: self.text.apply_global(&global.text),
            ..self.merge_with(&RawSettings {
                text: RawTextConfig::default(),
                ..global.clone()
            })
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.sentree.toml`
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: UNION with `!item` negation
    /// - Any → Env vars: REPLACE
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply SENTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("SENTREE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("text.stop_words")
                .with_list_parse_key("text.exclude_words"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("root_name") {
            settings.root_name = val;
        }
        if let Ok(val) = config.get_string("output_dir") {
            settings.output_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("drop_policy") {
            settings.drop_policy = match val.to_lowercase().as_str() {
                "silent" => DropPolicy::Silent,
                "report" => DropPolicy::Report,
                other => {
                    return Err(ApplicationError::Config {
                        message: format!("SENTREE_DROP_POLICY: unknown policy '{other}'"),
                    })
                }
            };
        }
        if let Ok(val) = config.get_string("filter") {
            settings.filter = val;
        }
        if let Ok(val) = config.get_string("colors.positive") {
            settings.colors.positive = val;
        }
        if let Ok(val) = config.get_string("colors.negative") {
            settings.colors.negative = val;
        }
        if let Ok(val) = config.get_string("colors.neutral") {
            settings.colors.neutral = val;
        }
        if let Ok(val) = config.get::<usize>("text.min_length") {
            settings.text.min_length = val;
        }
        if let Ok(val) = config.get::<usize>("text.ngram") {
            settings.text.ngram = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("text.stop_words") {
            settings.text.stop_words = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("text.exclude_words") {
            settings.text.exclude_words = val;
        }
        if let Ok(val) = config.get_bool("text.use_default_stop_words") {
            settings.text.use_default_stop_words = val;
        }
        if let Ok(val) = config.get::<usize>("band.min") {
            settings.band.min = Some(val);
        }
        if let Ok(val) = config.get::<usize>("band.max") {
            settings.band.max = Some(val);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r##"# sentree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/sentree/sentree.toml  (defines your baseline)
#   Local:  <project_dir>/.sentree.toml     (project-specific additions)
#   Env:    SENTREE_* environment variables (explicit overrides, e.g. SENTREE_TEXT__NGRAM=2)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global.
#   Use "!word" in local config to REMOVE an inherited item:
#     stop_words = ["service", "!not"]  # adds service, re-admits "not"

# Name of the hierarchy root
# root_name = "Reviews"

# Directory for rendered views (~ and $VAR are expanded)
# output_dir = "sentree-out"

# Rows missing Label, Category or sentiment_type: "report" or "silent"
# drop_policy = "report"

# Sentiment filter when --filter is not given: all, positive, negative or neutral
# filter = "all"

[colors]
# positive = "#90EE90"
# negative = "#F08080"
# neutral = "#D3D3D3"

[text]
# Tokens must be longer than this many characters
# min_length = 3

# Default n-gram width (1, 2 or 3)
# ngram = 1

# Start from the built-in English stop-word list
# use_default_stop_words = true

# Extra stop words (use !word to drop a built-in one)
# stop_words = []

# Words never counted
# exclude_words = []

[band]
# Inclusive occurrence band for counted phrases
# min = 2
# max = 50
"##
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::load(None).expect("load defaults");
        assert_eq!(settings.root_name, "Reviews");
        assert_eq!(settings.drop_policy, DropPolicy::Report);
        assert_eq!(settings.colors, ColorScheme::default());
        assert_eq!(settings.text.ngram, 1);
    }

    #[test]
    fn given_tilde_in_output_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            output_dir: PathBuf::from("~/sentree-out"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let out = settings.output_dir.to_string_lossy();
        assert!(out.starts_with(&home), "output_dir should start with home: {}", out);
        assert!(!out.contains('~'));
    }

    #[test]
    fn given_env_var_in_path_when_expand_paths_then_expands_variable() {
        let mut settings = Settings {
            output_dir: PathBuf::from("${HOME}/charts"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert_eq!(settings.output_dir, PathBuf::from(format!("{home}/charts")));
    }

    #[test]
    fn test_merge_array_union() {
        let result = TextConfig::merge_array(&words(&["a", "b"]), &words(&["c"]));
        assert_eq!(result, words(&["a", "b", "c"]));
    }

    #[test]
    fn test_merge_array_negation() {
        let result = TextConfig::merge_array(&words(&["a", "b"]), &words(&["!a", "c"]));
        assert_eq!(result, words(&["b", "c"]));
    }

    #[test]
    fn test_merge_array_negation_nonexistent() {
        let result = TextConfig::merge_array(&words(&["a", "b"]), &words(&["!x"]));
        assert_eq!(result, words(&["!x", "a", "b"]));
    }

    #[test]
    fn test_merge_array_duplicates() {
        let result = TextConfig::merge_array(&words(&["a", "b"]), &words(&["a", "c"]));
        assert_eq!(result, words(&["a", "b", "c"]));
    }

    #[test]
    fn test_merge_text_config() {
        let base = TextConfig {
            stop_words: words(&["service", "support"]),
            ..TextConfig::default()
        };
        let overlay = RawTextConfig {
            min_length: Some(2),
            stop_words: Some(words(&["!service", "team"])),
            ..RawTextConfig::default()
        };

        let result = base.merge(&overlay);

        assert_eq!(result.min_length, 2);
        assert_eq!(result.ngram, 1);
        assert_eq!(result.stop_words, words(&["support", "team"]));
    }

    #[test]
    fn given_unmatched_negation_when_merging_then_negation_is_kept() {
        let result = TextConfig::merge_array(&[], &words(&["!should", "Team"]));
        assert_eq!(result, words(&["!should", "team"]));
    }

    #[test]
    fn given_pending_negation_when_word_added_later_then_negation_is_cancelled() {
        let result = TextConfig::merge_array(&words(&["!should"]), &words(&["should"]));
        assert_eq!(result, words(&["should"]));
    }

    #[test]
    fn given_local_negation_when_merging_then_cleaner_readmits_default_stop_word() {
        let overlay = RawTextConfig {
            stop_words: Some(words(&["!should"])),
            ..RawTextConfig::default()
        };

        let cleaner = TextConfig::default().merge(&overlay).cleaner();

        assert!(!cleaner.stop_words.contains("should"));
        assert_eq!(cleaner.clean("should improve", 1), vec!["should", "improve"]);
    }

    #[test]
    fn given_mixed_case_negation_when_building_cleaner_then_matches_lowercased_word() {
        let text = TextConfig {
            stop_words: words(&["!Should", "Service"]),
            exclude_words: words(&["Slow", "!SLOW"]),
            ..TextConfig::default()
        };

        let cleaner = text.cleaner();

        assert!(!cleaner.stop_words.contains("should"));
        assert!(cleaner.stop_words.contains("service"));
        assert!(cleaner.exclude_words.is_empty());
    }

    #[test]
    fn test_apply_global_replaces_arrays() {
        let base = TextConfig {
            stop_words: words(&["service"]),
            exclude_words: words(&["foo"]),
            ..TextConfig::default()
        };
        let global = RawTextConfig {
            stop_words: Some(words(&["team"])),
            ..RawTextConfig::default()
        };

        let result = base.apply_global(&global);

        assert_eq!(result.stop_words, words(&["team"]));
        assert_eq!(result.exclude_words, words(&["foo"]));
    }

    #[test]
    fn given_negated_default_stop_word_when_building_cleaner_then_word_is_counted() {
        let text = TextConfig {
            stop_words: words(&["!because"]),
            ..TextConfig::default()
        };
        let cleaner = text.cleaner();
        assert_eq!(cleaner.clean("because they care", 1), vec!["because", "care"]);
    }

    #[test]
    fn given_no_default_stop_words_when_building_cleaner_then_only_configured_words_apply() {
        let text = TextConfig {
            use_default_stop_words: false,
            exclude_words: words(&["Slow"]),
            ..TextConfig::default()
        };
        let cleaner = text.cleaner();
        assert_eq!(
            cleaner.clean("there was slow service", 1),
            vec!["there", "service"]
        );
    }

    #[test]
    fn given_settings_when_serializing_then_template_keys_round_trip() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("root_name = \"Reviews\""));
        assert!(toml.contains("[colors]"));
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.root_name.is_none());
    }
}
