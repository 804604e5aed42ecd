mod clustering;
mod config;
mod errors;
mod matching;
mod models;
mod persist;
mod routes;
mod sources;
mod state;
mod store;

use std::fs::File;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::clustering::PipelineContext;
use crate::config::Config;
use crate::matching::alerts::{build_alerts, render_digest, UserPreferences};
use crate::matching::{match_postings, SkillQuery};
use crate::routes::build_router;
use crate::sources::{CsvJobSource, JobSource};
use crate::state::AppState;
use crate::store::batch::read_batch;
use crate::store::{run_merge_cycle, JobStore, LoadOutcome};

#[derive(Parser, Debug)]
#[command(
    name = "jobmatch",
    version,
    about = "Cluster scraped job postings by skill and match them against your skills"
)]
struct Cli {
    /// Job Store CSV (overrides JOBMATCH_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Vectorizer artifact (overrides JOBMATCH_VECTORIZER_PATH)
    #[arg(long, global = true)]
    vectorizer: Option<PathBuf>,

    /// Cluster model artifact (overrides JOBMATCH_MODEL_PATH)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the vectorizer and k-means model on a scraped corpus (offline retraining)
    Train {
        #[arg(long, default_value = "scraped_jobs.csv")]
        input: PathBuf,

        /// Where to write the clustered training set
        #[arg(long, default_value = "clustered_jobs.csv")]
        output: PathBuf,

        /// Number of clusters (overrides JOBMATCH_CLUSTERS)
        #[arg(long)]
        clusters: Option<usize>,
    },
    /// Label a freshly scraped batch with the frozen model and merge it into the store
    Merge {
        #[arg(long, default_value = "new_jobs.csv")]
        input: PathBuf,
    },
    /// List stored postings whose skills contain any of the given phrases
    Match {
        /// Comma-separated skill phrases, e.g. "python, machine learning"
        #[arg(long)]
        skills: String,
    },
    /// Print a match digest per user from a JSON preferences file
    Alerts {
        #[arg(long)]
        preferences: PathBuf,
    },
    /// Serve the Jobs API over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(path) = cli.store {
        config.store_path = path;
    }
    if let Some(path) = cli.vectorizer {
        config.vectorizer_path = path;
    }
    if let Some(path) = cli.model {
        config.model_path = path;
    }

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Train {
            input,
            output,
            clusters,
        } => train(&config, input, output, clusters),
        Command::Merge { input } => merge(&config, input).await,
        Command::Match { skills } => query(&config, &skills),
        Command::Alerts { preferences } => alerts(&config, preferences),
        Command::Serve => serve(config).await,
    }
}

fn load_pipeline(config: &Config) -> Result<PipelineContext> {
    PipelineContext::load(&config.vectorizer_path, &config.model_path).with_context(|| {
        format!(
            "Failed to load model artifacts ({}, {}); run `jobmatch train` first",
            config.vectorizer_path.display(),
            config.model_path.display()
        )
    })
}

/// Read-only store access for queries. A recovered-empty store is also reported on stdout.
fn load_store(config: &Config) -> JobStore {
    let (store, load) = JobStore::load(&config.store_path);
    if let LoadOutcome::RecoveredEmpty { reason } = &load {
        println!("Warning: job store could not be read ({reason}); showing no jobs.");
    }
    store
}

fn train(config: &Config, input: PathBuf, output: PathBuf, clusters: Option<usize>) -> Result<()> {
    let file = File::open(&input).with_context(|| format!("Cannot open {}", input.display()))?;
    let postings = read_batch(file)?;
    info!("Loaded {} jobs from {}", postings.len(), input.display());

    let mut params = config.kmeans_params();
    if let Some(k) = clusters {
        params.k = k;
    }

    let (ctx, records) = PipelineContext::train(postings, params)?;
    ctx.save(&config.vectorizer_path, &config.model_path)?;

    let training_set = JobStore::from_records(records);
    training_set.save(&output)?;
    println!(
        "Trained {} clusters over {} skills; wrote {} clustered jobs to {}",
        ctx.model().params().k,
        ctx.vectorizer().dimension()?,
        training_set.len(),
        output.display()
    );
    Ok(())
}

async fn merge(config: &Config, input: PathBuf) -> Result<()> {
    let ctx = load_pipeline(config)?;
    let batch = CsvJobSource::new(input).fetch().await?;
    if batch.is_empty() {
        println!("No new jobs found.");
    }

    let report = run_merge_cycle(&ctx, &config.store_path, batch)?;
    if report.load.is_recovered_empty() {
        warn!("Job store was unreadable and has been rebuilt from this batch only");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn query(config: &Config, skills: &str) -> Result<()> {
    let query = SkillQuery::parse(skills);
    anyhow::ensure!(!query.is_empty(), "--skills must contain at least one phrase");

    let store = load_store(config);
    let matches = match_postings(store.records(), &query);
    if matches.is_empty() {
        println!("No matching jobs found for your skills.");
        return Ok(());
    }
    println!("Found {} matching jobs:", matches.len());
    for job in matches {
        println!(
            "- {} at {} in {} [cluster {}] ({})",
            job.title, job.company, job.location, job.cluster, job.skills
        );
    }
    Ok(())
}

fn alerts(config: &Config, preferences: PathBuf) -> Result<()> {
    let file = File::open(&preferences)
        .with_context(|| format!("Cannot open {}", preferences.display()))?;
    let prefs: UserPreferences = serde_json::from_reader(file)
        .with_context(|| format!("Invalid preferences file {}", preferences.display()))?;

    let store = load_store(config);
    for alert in build_alerts(store.records(), &prefs) {
        println!("{}", render_digest(&alert));
    }
    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting jobmatch API v{}", env!("CARGO_PKG_VERSION"));

    let pipeline = load_pipeline(&config)?;
    info!(
        "Pipeline ready: {} clusters over {} skills",
        pipeline.model().params().k,
        pipeline.vectorizer().dimension()?
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let app = build_router(AppState::new(config, pipeline))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
