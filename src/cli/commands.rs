//! Command dispatch: one render cycle per invocation

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::services::{to_json, NormalizeReport, View, ViewContext};
use crate::cli::args::{Cli, Commands, ConfigCommands, CountArgs, InputArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{
    Aggregation, ChainMode, Grouping, OccurrenceBand, PhraseCount, ReviewRecord, RowLeaf,
};
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Tree { input, leaf, json }) => cmd_tree(cli, input, (*leaf).into(), *json),
        Some(Commands::Words {
            input,
            counting,
            limit,
            json,
        }) => cmd_words(cli, input, counting, *limit, *json),
        Some(Commands::Render {
            input,
            view,
            counting,
            chain,
            leaf,
            out_dir,
            positive_color,
            negative_color,
            neutral_color,
        }) => {
            let colors = ColorFlags {
                positive: positive_color.as_deref(),
                negative: negative_color.as_deref(),
                neutral: neutral_color.as_deref(),
            };
            cmd_render(
                cli,
                input,
                RenderFlags {
                    view: (*view).into(),
                    counting,
                    chain: (*chain).into(),
                    leaf: (*leaf).into(),
                    out_dir: out_dir.as_deref(),
                    colors,
                },
            )
        }
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "sentree", &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, run `sentree --help`".to_string(),
        )),
    }
}

struct ColorFlags<'a> {
    positive: Option<&'a str>,
    negative: Option<&'a str>,
    neutral: Option<&'a str>,
}

struct RenderFlags<'a> {
    view: View,
    counting: &'a CountArgs,
    chain: ChainMode,
    leaf: RowLeaf,
    out_dir: Option<&'a Path>,
    colors: ColorFlags<'a>,
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| CliError::Infra(InfraError::io("determine current directory", e))),
    }
}

fn create_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let dir = project_dir(cli)?;
    let settings = Settings::load(Some(&dir))?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

fn load_records(container: &ServiceContainer, input: &InputArgs) -> CliResult<Vec<ReviewRecord>> {
    let (records, report) = container
        .dataset
        .load(&input.csv, container.settings.drop_policy)?;
    report_drops(&input.csv, &report);
    Ok(records)
}

fn report_drops(csv: &Path, report: &NormalizeReport) {
    for dropped in &report.dropped {
        output::warning(&format!(
            "{}:{}: dropped row, empty {}",
            csv.display(),
            dropped.line,
            dropped.column
        ));
    }
    if report.defaulted_sentiment > 0 {
        output::warning(&format!(
            "{}: {} row(s) without numeric sentiment scored as 0.0",
            csv.display(),
            report.defaulted_sentiment
        ));
    }
}

/// Apply settings, then flags, onto a fresh context.
fn build_context<'a>(
    settings: &Settings,
    records: &'a [ReviewRecord],
    input: &InputArgs,
    counting: Option<&CountArgs>,
) -> CliResult<ViewContext<'a>> {
    let mut ctx = ViewContext::new(records);
    ctx.filter = match input.filter {
        Some(filter) => filter.into(),
        None => settings.sentiment_filter()?,
    };
    ctx.root_name = settings.root_name.clone();
    ctx.colors = settings.colors.clone();
    ctx.cleaner = settings.text.cleaner();
    ctx.ngram = settings.text.ngram;
    ctx.band = settings.band;

    if let Some(counting) = counting {
        if let Some(n) = counting.ngram {
            ctx.ngram = usize::from(n);
        }
        ctx.band = OccurrenceBand::new(
            counting.min.or(settings.band.min),
            counting.max.or(settings.band.max),
        );
        if counting.group {
            ctx.grouping = Grouping::ByLabelCategory;
        }
    }

    if let (Some(min), Some(max)) = (ctx.band.min, ctx.band.max) {
        if min > max {
            return Err(CliError::InvalidArgs(format!(
                "minimum occurrences {min} exceeds maximum {max}"
            )));
        }
    }
    Ok(ctx)
}

#[instrument(skip(cli, input), fields(csv = %input.csv.display()))]
fn cmd_tree(cli: &Cli, input: &InputArgs, leaf: RowLeaf, json: bool) -> CliResult<()> {
    let container = create_container(cli)?;
    let records = load_records(&container, input)?;
    let mut ctx = build_context(&container.settings, &records, input, None)?;
    ctx.leaf = leaf;

    let tree = container.dashboard.row_tree(&ctx)?;
    if json {
        output::info(&to_json(&tree.to_node())?);
    } else {
        output::info(&tree.to_termtree());
    }
    Ok(())
}

/// JSON shape of one counted group.
#[derive(Serialize)]
struct GroupOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    phrases: Vec<&'a PhraseCount>,
}

fn limited(aggregation: &Aggregation, limit: Option<usize>) -> Vec<GroupOut<'_>> {
    aggregation
        .groups
        .iter()
        .map(|group| GroupOut {
            label: group.key.as_ref().map(|k| k.label.as_str()),
            category: group.key.as_ref().map(|k| k.category.as_str()),
            phrases: group
                .ranked()
                .into_iter()
                .take(limit.unwrap_or(usize::MAX))
                .collect(),
        })
        .collect()
}

#[instrument(skip(cli, input, counting), fields(csv = %input.csv.display()))]
fn cmd_words(
    cli: &Cli,
    input: &InputArgs,
    counting: &CountArgs,
    limit: Option<usize>,
    json: bool,
) -> CliResult<()> {
    let container = create_container(cli)?;
    let records = load_records(&container, input)?;
    let ctx = build_context(&container.settings, &records, input, Some(counting))?;

    let aggregation = container.dashboard.phrase_counts(&ctx)?;
    let groups = limited(&aggregation, limit);

    if json {
        output::info(&to_json(&groups)?);
        return Ok(());
    }
    if groups.is_empty() {
        output::warning("no phrases matched the filter and occurrence band");
        return Ok(());
    }
    for group in &groups {
        if let (Some(label), Some(category)) = (group.label, group.category) {
            output::header(&format!("{label} / {category}"));
        }
        for phrase in &group.phrases {
            output::count_row(phrase.count, phrase.average_sentiment, &phrase.text);
        }
    }
    Ok(())
}

#[instrument(skip(cli, input, flags), fields(csv = %input.csv.display(), view = %flags.view))]
fn cmd_render(cli: &Cli, input: &InputArgs, flags: RenderFlags<'_>) -> CliResult<()> {
    let container = create_container(cli)?;
    let records = load_records(&container, input)?;
    let mut ctx = build_context(&container.settings, &records, input, Some(flags.counting))?;
    ctx.chain = flags.chain;
    ctx.leaf = flags.leaf;
    if let Some(c) = flags.colors.positive {
        ctx.colors.positive = c.to_string();
    }
    if let Some(c) = flags.colors.negative {
        ctx.colors.negative = c.to_string();
    }
    if let Some(c) = flags.colors.neutral {
        ctx.colors.neutral = c.to_string();
    }

    let out_dir = flags
        .out_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| container.settings.output_dir.clone());

    let paths = container.dashboard.render(&ctx, flags.view, &out_dir)?;
    for path in &paths {
        output::action("Wrote", &path.display());
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    let dir = project_dir(cli)?;
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(&dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                local_config_path(&dir)
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("Created {}", path.display()));
        }
        ConfigCommands::Path => {
            let marker = |p: &Path| if p.exists() { "" } else { " (not found)" };
            match global_config_path() {
                Some(global) => output::action("global", &format!("{}{}", global.display(), marker(&global))),
                None => output::action("global", &"unavailable"),
            }
            let local = local_config_path(&dir);
            output::action("local", &format!("{}{}", local.display(), marker(&local)));
        }
    }
    Ok(())
}
