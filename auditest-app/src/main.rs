mod app;
mod clock_media;
mod config;
mod console;
mod http;

use anyhow::{Context, Result};
use app::App;
use auditest_task::{Mushra, Pairwise, SessionContext};
use auditest_timing::MonotonicTimer;
use clap::{Parser, ValueEnum};
use clock_media::ClockMedia;
use http::{HttpSubmitter, SUBMIT_TIMEOUT};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TaskKind {
    Mushra,
    Pairwise,
}

#[derive(Parser, Debug)]
#[command(name = "auditest")]
#[command(about = "Console host for MUSHRA and pairwise listening tests")]
#[command(version)]
struct Args {
    /// Experiment configuration (JSON)
    #[arg(short, long, env = "AUDITEST_CONFIG")]
    config: PathBuf,

    /// Rating scheme
    #[arg(short, long, value_enum, default_value_t = TaskKind::Mushra)]
    task: TaskKind,

    #[arg(short, long, env = "AUDITEST_PARTICIPANT_ID")]
    participant_id: String,

    /// Endpoint receiving the results form
    #[arg(long, env = "AUDITEST_SUBMISSION_URL")]
    submission_url: String,

    /// Where the participant goes once results are accepted
    #[arg(long, env = "AUDITEST_REDIRECT_URL", default_value = "/")]
    redirect_url: String,

    /// Directory audio paths resolve against (default: the config's directory)
    #[arg(long)]
    media_root: Option<PathBuf>,

    /// Submission timeout in seconds
    #[arg(long, default_value_t = SUBMIT_TIMEOUT.as_secs())]
    submit_timeout: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auditest=info,auditest_task=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("Starting auditest v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config(&args.config)?;
    let media_root = args
        .media_root
        .clone()
        .or_else(|| args.config.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    info!("Media root: {}", media_root.display());

    let context = SessionContext {
        participant_id: args.participant_id.clone(),
        redirect_url: args.redirect_url.clone(),
    };
    let timer = MonotonicTimer::new();
    let media = ClockMedia::new(media_root, timer.clone());
    let submitter = HttpSubmitter::new(
        args.submission_url.as_str(),
        Duration::from_secs(args.submit_timeout),
    )
    .context("Failed to build HTTP client")?;

    match args.task {
        TaskKind::Mushra => App::new(config, context, media, timer, submitter, Mushra)?.run(),
        TaskKind::Pairwise => {
            App::new(config, context, media, timer, submitter, Pairwise::default())?.run()
        }
    }
}
