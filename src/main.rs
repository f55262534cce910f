//! labeldesk command line: follow backend jobs from a terminal.

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use labeldesk::EditorConfig;
use labeldesk::error::MonitorError;
use labeldesk::job::{JobEvent, JobStatus, JobWatcher, MetricsReader, MetricsState};
use labeldesk_api::HttpBackend;
use labeldesk_api::types::DbId;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow a job until it reaches a terminal status
    WatchJob {
        job_id: DbId,
        /// Skip the push channel and poll the status endpoint
        #[arg(long)]
        poll: bool,
        /// Also print the live metrics tail of training jobs
        #[arg(long)]
        metrics: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match EditorConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => EditorConfig::load_or_default(),
    };
    config.apply_env(|key| std::env::var(key).ok());

    // RUST_LOG wins over the configured level
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let local = tokio::task::LocalSet::new();

    match args.command {
        Command::WatchJob {
            job_id,
            poll,
            metrics,
        } => {
            if poll {
                config.jobs.prefer_push = false;
            }
            let result = local.block_on(&runtime, watch_job(&config, job_id, metrics));
            match result {
                Ok(JobStatus::Failed) => ExitCode::from(2),
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn watch_job(
    config: &EditorConfig,
    job_id: DbId,
    with_metrics: bool,
) -> Result<JobStatus, MonitorError> {
    let session = config.session();
    let backend = Rc::new(HttpBackend::new(session.clone()));
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::task::spawn_local(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let mut watcher = JobWatcher::new(Rc::clone(&backend), session, job_id, &config.jobs);
    let mut reader = MetricsReader::new(Rc::clone(&backend), job_id, config.jobs.metrics_rows);
    let status = watcher.subscribe();

    let watch = async {
        let result = watcher.run(cancel.clone(), print_event).await;
        // Stops the metrics reader too
        cancel.cancel();
        result
    };
    let follow = async {
        if with_metrics {
            reader
                .follow(config.jobs.metrics_interval(), status, cancel.clone(), print_metrics)
                .await;
        }
    };
    let (result, ()) = tokio::join!(watch, follow);
    result.map(|job| job.status)
}

fn print_event(event: JobEvent) {
    match event {
        JobEvent::SourceChanged(kind) => println!("source: {}", kind.name()),
        JobEvent::Updated(job) => println!(
            "{:>8} {:>5.1}% {}",
            job.status,
            job.progress * 100.0,
            job.message
        ),
        JobEvent::Error(reason) => println!("   error {}", reason),
        JobEvent::Finished(job) => println!("{:>8} {}", job.status, job.message),
    }
}

fn print_metrics(state: &MetricsState) {
    match state {
        MetricsState::Pending => {}
        MetricsState::Ready(table) => {
            println!("{}", table.columns.join("\t"));
            for row in &table.rows {
                println!("{}", row.join("\t"));
            }
        }
        MetricsState::Failed(reason) => println!(" metrics {}", reason),
    }
}
