use anyhow::{bail, Context, Result};
use arxiv_scout::config::{find_config_file, get_config, load_config, Config, LOCAL_CONFIG_FILE};
use arxiv_scout::digest::{DigestReport, DigestRunner};
use arxiv_scout::inspect::{
    inspect_bundle, ConcurrencyGate, SignatureMatcher, SourceInspection,
    SourceInspectionResult, SourceInspector,
};
use arxiv_scout::ui::{self, Spinner, Status};
use clap::{Parser, Subcommand, ValueEnum};
use futures_util::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// arXiv Scout - daily research digest with source-archive inspection
#[derive(Parser, Debug)]
#[command(name = "arxiv-scout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search recent arXiv preprints, score them with an LLM and dig venue and code links out of their LaTeX sources", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv, -vvv)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Cards on a terminal, JSON otherwise
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full digest: search, trend statistics, enrichment, report
    Run {
        /// Manual queries, separated by `,` or `;` (overrides configuration)
        #[arg(long)]
        query: Option<String>,

        /// Results per query
        #[arg(long)]
        max_results: Option<usize>,

        /// Submission window in days; 0 disables it
        #[arg(long)]
        days: Option<u32>,

        /// Category prefix for trend statistics (e.g. cs, q-bio)
        #[arg(long)]
        category: Option<String>,

        /// Skip field-wide trend statistics
        #[arg(long)]
        no_stats: bool,
    },

    /// Inspect the source bundles of the given papers
    Inspect {
        /// arXiv identifiers (versions are ignored)
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Scan a local source bundle or LaTeX file
    Scan {
        /// File to scan
        file: PathBuf,
    },

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration with secrets masked
    Show,

    /// Write the effective configuration to a file
    Init {
        /// Destination (defaults to ./arxiv-scout.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("arxiv_scout={}", env_filter)),
        ))
        .with(
            cli.log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("loading {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)?
    } else {
        get_config()
    };

    let format = resolve_format(cli.output);

    match cli.command {
        Commands::Run {
            query,
            max_results,
            days,
            category,
            no_stats,
        } => {
            if let Some(query) = query {
                config.search.queries = query;
            }
            if let Some(max_results) = max_results {
                config.search.max_results = max_results;
            }
            if let Some(days) = days {
                config.search.days = days;
            }
            if let Some(category) = category {
                config.search.broad_category = category;
            }
            if config.search.query_list().is_empty() {
                bail!("no search queries configured");
            }

            let mut runner = DigestRunner::from_config(&config)?;
            runner.settings_mut().collect_stats = !no_stats;
            tracing::debug!(runner = ?runner, "Digest runner ready");

            let spinner = spinner(cli.quiet, "Searching and analyzing recent papers...");
            let report = runner.run(chrono::Local::now().date_naive()).await;
            spinner.finish_with_success(&format!("{} papers processed", report.papers.len()));

            output_report(&report, format)?;
        }

        Commands::Inspect { ids } => {
            let matcher = Arc::new(SignatureMatcher::default());
            let inspector = SourceInspector::new(&config.inspection, matcher)?;
            let gate = ConcurrencyGate::new(config.inspection.max_concurrent_downloads);

            let spinner = spinner(cli.quiet, &format!("Inspecting {} source bundles...", ids.len()));
            let results: Vec<(String, SourceInspectionResult)> =
                join_all(ids.into_iter().map(|id| {
                    let inspector = &inspector;
                    let gate = &gate;
                    async move {
                        let result = inspector.inspect(&id, gate).await;
                        (id, result)
                    }
                }))
                .await;
            spinner.finish_with_success(&format!(
                "{} inspected, at most {} downloads at once",
                results.len(),
                gate.peak()
            ));

            output_inspections(&results, format)?;
        }

        Commands::Scan { file } => {
            let bytes =
                std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let (result, summary) = inspect_bundle(
                &SignatureMatcher::default(),
                &bytes,
                config.inspection.text_fallback_bytes,
            );

            if !cli.quiet && format != OutputFormat::Json {
                ui::print_status(
                    Status::Info,
                    &format!(
                        "{:?}: {} files, {} documents read{}",
                        summary.kind,
                        summary.files,
                        summary.documents,
                        if summary.stopped_early { ", stopped early" } else { "" }
                    ),
                );
            }
            output_inspections(&[(file.display().to_string(), result)], format)?;
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                print!("{}", config.redacted().to_toml()?);
            }
            ConfigCommands::Init { path, force } => {
                let path = path.unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                write_config(&config, &path)?;
                if !cli.quiet {
                    ui::print_status(
                        Status::Success,
                        &format!("Configuration written to {}", path.display()),
                    );
                }
            }
        },
    }

    Ok(())
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format != OutputFormat::Auto {
        return format;
    }
    if ui::is_terminal() {
        OutputFormat::Auto
    } else {
        OutputFormat::Json
    }
}

fn spinner(quiet: bool, msg: &str) -> Spinner {
    if quiet || !ui::is_terminal() {
        Spinner::hidden()
    } else {
        Spinner::new(msg)
    }
}

fn write_config(config: &Config, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    config.save(path)?;
    Ok(())
}

fn output_report(report: &DigestReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Plain => print!("{}", ui::report_plain(report)),
        OutputFormat::Table => {
            println!("{}", ui::summary_line(report));
            println!("{}", ui::report_table(report));
            let trends = ui::trend_line(&report.trends);
            if !trends.is_empty() {
                println!("{}", trends);
            }
            if let Some(briefing) = ui::briefing_text(report) {
                println!("\nBriefing:\n{}", briefing);
            }
        }
        OutputFormat::Auto => {
            if report.is_empty() {
                ui::print_status(Status::Warning, "No new papers in this window");
            } else {
                ui::print_report_cards(report);
            }
        }
    }
    Ok(())
}

fn output_inspections(
    results: &[(String, SourceInspectionResult)],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = results
                .iter()
                .map(|(id, r)| {
                    serde_json::json!({
                        "id": id,
                        "venue": r.venue,
                        "repository_url": r.repository_url,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Plain => print!("{}", ui::inspection_plain(results)),
        OutputFormat::Table | OutputFormat::Auto => {
            println!("{}", ui::inspection_table(results))
        }
    }
    Ok(())
}
