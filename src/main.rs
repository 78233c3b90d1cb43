use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use corpus_store::{CorpusStore, DataLayout};
use lean_classifier::{load_training_data, LeanClassifier};
use leanscope_core::{AppConfig, CoreError, ErrorReporter};
use reddit_client::{Collector, RedditClient, RetryConfig};
use sentiment_bridge::{AttachMode, ImportOptions, SentimentBridge};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "leanscope=info,leanscope_core=info,reddit_client=info,\
corpus_store=info,sentiment_bridge=info,lean_classifier=info";

#[derive(Parser)]
#[command(name = "leanscope", version, about = "Reddit political-lean corpus tool")]
struct Cli {
    /// Optional TOML config file, overridden by the environment
    #[arg(long, global = true, env = "LEANSCOPE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the newest posts and their comments for each community
    Collect {
        #[arg(required = true)]
        communities: Vec<String>,
        #[arg(long, default_value_t = 1000)]
        limit: usize,
    },
    /// Write comment text files for the external sentiment tool
    Export { community: String },
    /// Attach the sentiment tool's results to the comment files
    Import {
        community: String,
        /// Match results by line order instead of through the manifest
        #[arg(long)]
        positional: bool,
        /// Keep the text folder after importing
        #[arg(long)]
        keep_text: bool,
    },
    /// Compute per-post averages and acceptance
    Aggregate { community: String },
    /// Train the lean classifier and label post titles
    Classify {
        #[arg(long)]
        training: PathBuf,
        #[arg(required = true)]
        posts: Vec<PathBuf>,
    },
}

fn report(error: CoreError) -> anyhow::Error {
    ErrorReporter::new().report_error(&error);
    error.into()
}

async fn collect(config: &AppConfig, communities: &[String], limit: usize) -> Result<()> {
    let credentials = config
        .reddit_credentials()
        .context("Reddit credentials are required to collect")?;
    let client = RedditClient::new(credentials).map_err(report)?;
    let collector = Collector::new(client, RetryConfig::with_delay(config.retry_delay));
    let store = CorpusStore::new(DataLayout::new(config.data_dir.clone()));

    for community in communities {
        let posts = collector
            .scrape_subreddit(community, limit)
            .await
            .map_err(report)
            .with_context(|| format!("collecting r/{}", community))?;

        let summary = store
            .save_posts(community, &posts)
            .map_err(|e| report(e.into()))
            .with_context(|| format!("saving r/{}", community))?;
        info!(
            "r/{}: saved {} posts, {} comment files ({} skipped)",
            community, summary.posts, summary.comment_files, summary.skipped
        );
    }

    let metrics = collector.retry_metrics();
    if metrics.total_retries > 0 {
        warn!(
            "{} retries ({} rate limited), {:?} spent waiting",
            metrics.total_retries, metrics.rate_limited, metrics.total_delay
        );
    }
    let pacing = collector.api().api().get_rate_limit_status().await;
    info!(
        "Request budget at {:.0}% of the {} request burst ({} requests/minute)",
        pacing.utilization_percentage(),
        pacing.max_tokens,
        pacing.requests_per_minute
    );
    Ok(())
}

fn classify(training: &Path, posts: &[PathBuf]) -> Result<()> {
    let records = load_training_data(training)
        .map_err(report)
        .with_context(|| format!("loading training data from {}", training.display()))?;

    let mut classifier = LeanClassifier::new();
    let report_card = classifier
        .train(&records)
        .map_err(report)
        .context("training the classifier")?;
    info!(
        "Trained on {} records, tested on {} ({} features)",
        report_card.train_size, report_card.test_size, report_card.vocabulary
    );

    for path in posts {
        let labeled = classifier
            .label_posts(path)
            .map_err(report)
            .with_context(|| format!("labeling {}", path.display()))?;
        info!("Labeled {} posts in {}", labeled, path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let bridge = SentimentBridge::new(DataLayout::new(config.data_dir.clone()));

    match cli.command {
        Command::Collect { communities, limit } => collect(&config, &communities, limit).await?,
        Command::Export { community } => {
            let summary = bridge
                .export(&community)
                .map_err(report)
                .with_context(|| format!("exporting r/{}", community))?;
            info!(
                "Exported {} files ({} lines, {} without comments)",
                summary.files, summary.lines, summary.empty_posts
            );
        }
        Command::Import {
            community,
            positional,
            keep_text,
        } => {
            let options = ImportOptions {
                result_suffix: config.result_suffix.clone(),
                mode: if positional {
                    AttachMode::Positional
                } else {
                    AttachMode::Keyed
                },
                keep_text,
            };
            let summary = bridge
                .import(&community, &options)
                .map_err(report)
                .with_context(|| format!("importing sentiment for r/{}", community))?;
            info!(
                "Imported {} files, {} skipped, {} unmatched rows",
                summary.files, summary.skipped, summary.unmatched_rows
            );
        }
        Command::Aggregate { community } => {
            let summary = bridge
                .aggregate(&community)
                .map_err(report)
                .with_context(|| format!("aggregating r/{}", community))?;
            info!(
                "Aggregated {} posts ({} without comment files)",
                summary.posts, summary.missing
            );
        }
        Command::Classify { training, posts } => classify(&training, &posts)?,
    }

    Ok(())
}
