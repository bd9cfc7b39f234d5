use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use danmaku_spike::analysis::{Analyzer, search};
use danmaku_spike::config::{AnalysisConfig, HighlightStrategy};
use danmaku_spike::input::{DanmakuFeed, analyze_path};
use danmaku_spike::logging::{LogFormat, default_log_format, init_logging};
use danmaku_spike::text::CommentCategory;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "danmaku-spike",
    version,
    about = "Comment density charts and highlight detection for video danmaku"
)]
struct Cli {
    /// Log output format (defaults to pretty on a terminal, JSON otherwise)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct AnalysisArgs {
    /// JSON feed: {"duration": <seconds>, "danmaku": [{"timestamp", "content"}]}
    feed: PathBuf,

    /// TOML file with analysis settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window width in seconds
    #[arg(long)]
    interval: Option<u64>,

    #[arg(long, value_enum)]
    strategy: Option<HighlightStrategy>,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chart data and highlights
    Analyze {
        #[command(flatten)]
        args: AnalysisArgs,

        /// Include chart-marker peaks in the result
        #[arg(long)]
        markers: bool,
    },

    /// Per-window top words with counts
    Summary {
        #[command(flatten)]
        args: AnalysisArgs,
    },

    /// Per-window counts of one reaction category
    Density {
        #[command(flatten)]
        args: AnalysisArgs,

        #[arg(long, value_enum, default_value = "laughter")]
        category: CommentCategory,
    },

    /// Comments containing a query string
    Search {
        feed: PathBuf,
        query: String,

        #[arg(long)]
        pretty: bool,
    },

    /// Inspect analysis settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    /// Validate a config file and exit
    Check { path: PathBuf },

    /// Print the effective configuration as TOML
    Dump { path: Option<PathBuf> },
}

fn load_config(args: &AnalysisArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(interval) = args.interval {
        config.interval_seconds = interval;
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{s}");
    Ok(())
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Analyze { args, markers } => {
            let mut config = load_config(&args)?;
            config.peak_markers |= markers;
            let analyzer = Analyzer::new(config)?;
            let result = analyze_path(&analyzer, &args.feed)?;
            if result.highlights.is_empty() {
                tracing::info!("no highlights found");
            }
            println!("{}", result.to_json(args.pretty)?);
            Ok(())
        }
        Command::Summary { args } => {
            let analyzer = Analyzer::new(load_config(&args)?)?;
            let feed = DanmakuFeed::from_path(&args.feed)?;
            print_json(&analyzer.summary(&feed.danmaku, feed.duration), args.pretty)
        }
        Command::Density { args, category } => {
            let analyzer = Analyzer::new(load_config(&args)?)?;
            let feed = DanmakuFeed::from_path(&args.feed)?;
            print_json(
                &analyzer.category_density(&feed.danmaku, feed.duration, category),
                args.pretty,
            )
        }
        Command::Search {
            feed,
            query,
            pretty,
        } => {
            let feed = DanmakuFeed::from_path(&feed)?;
            let hits = search(&feed.danmaku, &query);
            tracing::info!(query = %query, hits = hits.len(), "search complete");
            print_json(&hits, pretty)
        }
        Command::Config { cmd } => match cmd {
            ConfigCmd::Check { path } => {
                let config = AnalysisConfig::from_file(&path)?;
                println!("✔ Config loaded successfully");
                println!("✔ {}s windows", config.interval_seconds);
                println!(
                    "✔ {} highlights, {}s minimum spacing",
                    config.detector().name(),
                    config.min_highlight_spacing()
                );
                Ok(())
            }
            ConfigCmd::Dump { path } => {
                let config = match path {
                    Some(path) => AnalysisConfig::from_file(&path)?,
                    None => AnalysisConfig::default(),
                };
                let s = toml::to_string_pretty(&config).context("failed to render config")?;
                print!("{s}");
                Ok(())
            }
        },
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format.unwrap_or_else(default_log_format));

    if let Err(e) = run(cli.command) {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
