// crates/core/src/bin/pipeline_demo.rs
//! Runs the generate → process → check pipeline against a job directory and
//! prints where every job ended up.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use job_ledger_core::pipeline::{run_pipeline, PipelineOptions};
use job_ledger_core::{JobStore, RunOutcome, StoreConfig};

#[derive(Debug, Parser)]
#[command(name = "pipeline-demo", version, about = "Drive a fan-out job pipeline on disk")]
struct Args {
    /// Directory holding live job files (default: $JOB_LEDGER_ROOT_DIR or ./jobs)
    #[arg(long)]
    root_dir: Option<PathBuf>,

    /// Directory archived jobs are moved into (default: <root-dir>/archive)
    #[arg(long)]
    archive_dir: Option<PathBuf>,

    /// Number of child jobs the main job generates
    #[arg(long, default_value_t = 5)]
    count: u64,

    /// Process at most this many children per run
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Archive completed children along with the main job
    #[arg(long)]
    archive_children: bool,

    /// Keep everything in memory; write nothing to disk
    #[arg(long)]
    simulate: bool,
}

fn print_stage(label: &str, outcome: &RunOutcome) {
    eprintln!(
        "  {label:<10} matched {:>3}  ok {:>3}  failed {:>3}  skipped {:>3}",
        outcome.matched,
        outcome.succeeded.len(),
        outcome.failed.len(),
        outcome.skipped.len()
    );
    for key in &outcome.failed {
        eprintln!("    failed: {key}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,job_ledger_core=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = StoreConfig::from_env();
    if let Some(root) = args.root_dir {
        config = StoreConfig::new(root).with_simulate(config.simulate);
    }
    if let Some(archive) = args.archive_dir {
        config = config.with_archive_dir(archive);
    }
    if args.simulate {
        config = config.with_simulate(true);
    }

    eprintln!("\njob-ledger pipeline v{}\n", env!("CARGO_PKG_VERSION"));
    eprintln!("  root:    {}", config.root_dir.display());
    eprintln!("  archive: {}", config.archive_dir.display());
    if config.simulate {
        eprintln!("  (simulate: nothing is written)");
    }

    let mut store = JobStore::open(config).await?;
    let options = PipelineOptions {
        count: args.count,
        chunk_size: args.chunk_size,
        archive_children: args.archive_children,
    };
    let summary = run_pipeline(&mut store, &options).await?;

    eprintln!();
    print_stage("generate", &summary.generated);
    print_stage("process", &summary.processed);
    print_stage("check", &summary.checked);

    eprintln!("\n  live jobs:");
    for job in store.fetch_jobs(false).await? {
        let error = job
            .error
            .as_ref()
            .map(|e| format!("  error: {}", e.message))
            .unwrap_or_default();
        eprintln!("    {:<12} {}{}", job.key().to_string(), job.status, error);
    }
    eprintln!();
    Ok(())
}
