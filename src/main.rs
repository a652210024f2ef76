use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use java_completion::classpath::{FsArchiveEnumerator, LoadOutcome, ProjectDescriptor, ProjectKind};
use java_completion::logging::init_logger;
use java_completion::metrics::{metrics, MetricsSummary};
use java_completion::{CompletionConfig, CompletionProvider, SuggestionOutcome};

/// Index a classpath and print the completions at one position of a Java file
#[derive(Parser, Debug)]
#[command(name = "java-completion", version, about, long_about = None)]
struct Cli {
    /// Compiled output of the project itself (directory or archive)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory whose archives are all on the classpath
    #[arg(long)]
    lib_dir: Option<PathBuf>,

    /// Library archive; may be repeated
    #[arg(long = "lib")]
    libs: Vec<PathBuf>,

    /// Treat the project as a platform project (platform classes stay visible)
    #[arg(long)]
    platform: bool,

    /// Java source file to complete in
    #[arg(long)]
    file: PathBuf,

    /// Cursor position as a char offset; defaults to the end of the file
    #[arg(long)]
    offset: Option<usize>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level for stderr (otherwise RUST_LOG, else info)
    #[arg(long)]
    log_level: Option<String>,

    #[arg(long)]
    no_color: bool,

    /// Also write a debug session log to the user cache directory
    #[arg(long)]
    log_file: bool,
}

#[derive(Serialize)]
struct Report {
    file: PathBuf,
    offset: usize,
    classes_indexed: usize,
    outcome: SuggestionOutcome,
    metrics: MetricsSummary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logger(cli.no_color, cli.log_level.as_deref(), cli.log_file)
        .context("Failed to initialize logging")?;

    let config = match &cli.config {
        Some(path) => CompletionConfig::from_json_file(path)?,
        None => CompletionConfig::default(),
    };

    let text = fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let offset = cli
        .offset
        .unwrap_or_else(|| text.chars().count())
        .min(text.chars().count());

    let project_name = cli
        .file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("project")
        .to_string();
    let project = ProjectDescriptor {
        kind: if cli.platform {
            ProjectKind::Platform
        } else {
            ProjectKind::Java
        },
        output: cli.output.clone(),
        library_dir: cli.lib_dir.clone(),
        libraries: cli.libs.clone(),
        ..ProjectDescriptor::new(project_name)
    };

    let enumerator = Arc::new(FsArchiveEnumerator::new(config.archive_extension.clone()));
    let provider = CompletionProvider::new(config);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let outcome = runtime.block_on(provider.load(project, enumerator));
    match &outcome {
        LoadOutcome::Loaded(report) => info!(
            "Loaded {} classes ({} archives skipped)",
            report.classes_indexed, report.skipped_archives
        ),
        other => info!("Load finished without indexing: {:?}", other),
    }

    let report = Report {
        file: cli.file.clone(),
        offset,
        classes_indexed: provider.index().len(),
        outcome: provider.get_suggestions(&text, offset),
        metrics: metrics().summary(),
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{json}");

    provider.dispose();
    Ok(())
}
