use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;
use vollog::config::Config;
use vollog::report::{self, Period};
use vollog::{EventProjector, PactlMonitor};

#[derive(Parser, Debug)]
#[command(name = "vollog")]
#[command(about = "Log audio server volume changes per sink and per playback stream", long_about = None)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,
    #[arg(long, env = "VOLLOG_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch sinks and sink inputs and append a record on every volume change.
    Record(RecordOpts),
    /// Summarize listening time and volume from a stream log.
    Report(ReportOpts),
    /// Serve the summary and hour-wise usage of a stream log as JSON.
    Serve(ServeOpts),
    /// Print the effective configuration.
    Config,
    /// Generate shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(clap::Args, Debug)]
struct RecordOpts {
    #[arg(long)]
    log_dir: Option<String>,
    #[arg(long)]
    server: Option<String>,
}

#[derive(clap::Args, Debug)]
struct ReportOpts {
    logfile: PathBuf,
    #[arg(long, default_value = "today")]
    period: Period,
}

#[derive(clap::Args, Debug)]
struct ServeOpts {
    logfile: PathBuf,
    #[arg(long, default_value_t = 5000)]
    port: u16,
    /// Directory of static files served next to the API.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let config = match cli.config {
        Some(ref path) => Config::load_from_path(path.clone())
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable config: {}", e);
            Config::default()
        }),
    };

    match cli.command {
        Commands::Record(opts) => run_record(opts, config).await?,
        Commands::Report(opts) => run_report(opts)?,
        Commands::Serve(opts) => {
            let state = report::ReportState::new(opts.logfile, jiff::tz::TimeZone::system());
            report::serve(state, opts.port, opts.static_dir).await?
        }
        Commands::Config => print!("{}", config.to_toml()?),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "vollog", &mut std::io::stdout());
        }
    }

    Ok(())
}

async fn run_record(opts: RecordOpts, mut config: Config) -> Result<()> {
    if opts.log_dir.is_some() {
        config.logging.dir = opts.log_dir;
    }
    if opts.server.is_some() {
        config.pulse.server = opts.server;
    }

    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    tracing::info!("Writing node logs to {}", log_dir.display());

    let mut projector = EventProjector::new(&log_dir);
    let (monitor, mut events) = PactlMonitor::new(&config.pulse);
    let mut monitor_task = tokio::spawn(monitor.run());

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let deadline = tokio::time::sleep(Duration::from_millis(config.pulse.bootstrap_timeout_ms));
    tokio::pin!(deadline);

    let outcome: Result<()> = loop {
        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("Got SIGINT, exiting");
                break Ok(());
            }
            _ = sigterm.recv() => {
                tracing::info!("Got SIGTERM, exiting");
                break Ok(());
            }
            _ = &mut deadline, if !projector.bootstrap().is_ready() => {
                if let Err(e) = projector.bootstrap().checkpoint() {
                    tracing::error!("{}", e);
                    break Err(e.into());
                }
            }
            event = events.recv() => match event {
                Some(notification) => {
                    if let Err(e) = projector.handle(notification) {
                        tracing::error!("{}", e);
                        break Err(e.into());
                    }
                }
                None => {
                    break match (&mut monitor_task).await {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(e).context("Audio server connection failure"),
                        Err(e) => Err(e.into()),
                    };
                }
            }
        }
    };

    monitor_task.abort();
    let drained = projector.shutdown();
    outcome?;
    drained?;
    Ok(())
}

fn run_report(opts: ReportOpts) -> Result<()> {
    let now = jiff::Zoned::now();
    let text = report::report(&opts.logfile, opts.period, &now)?;
    print!("{}", text);
    Ok(())
}
