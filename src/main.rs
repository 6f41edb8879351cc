use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use cdcf_e2e::DockerRuntime;
use cdcf_e2e::Error;
use cdcf_e2e::Result;
use cdcf_e2e::RunSummary;
use cdcf_e2e::ScenarioRunner;
use cdcf_e2e::Settings;
use clap::Parser;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Feature files, or directories holding them
    #[arg(default_value = "features")]
    paths: Vec<PathBuf>,

    /// Settings file; falls back to E2E_CONFIG_PATH
    #[arg(long)]
    config: Option<String>,

    /// Also write logs to <LOG_DIR>/e2e.log
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initializing Logs
    let _guard = init_observability(cli.log_dir.as_deref())?;

    let settings = Settings::load(cli.config.as_deref())?;
    let runtime = Arc::new(DockerRuntime::connect()?);

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(false);
    tokio::spawn(async {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to listen for shutdown: {:?}", e);
        }
    });

    let mut runner = ScenarioRunner::new(runtime, settings).with_shutdown(graceful_rx);
    let mut summary = RunSummary::default();
    for path in &cli.paths {
        let partial = runner.run_path(path).await?;
        summary.outcomes.extend(partial.outcomes);
    }

    report(&summary);
    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn report(summary: &RunSummary) {
    for outcome in &summary.outcomes {
        match &outcome.failure {
            None => println!("PASS  {} / {}", outcome.feature, outcome.scenario),
            Some(failure) => println!(
                "FAIL  {} / {}\n      line {}: {}\n      {}",
                outcome.feature, outcome.scenario, failure.line, failure.step, failure.message
            ),
        }
        for leftover in &outcome.teardown.failures {
            println!(
                "      teardown {} of {} failed: {}",
                leftover.operation, leftover.node, leftover.error
            );
        }
    }
    println!(
        "\n{} scenarios: {} passed, {} failed",
        summary.outcomes.len(),
        summary.passed(),
        summary.failed()
    );
}

async fn graceful_shutdown(graceful_tx: watch::Sender<bool>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
    }

    info!("Finishing the current scenario, then shutting down");
    graceful_tx.send(true).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        Error::Io(std::io::Error::other(e.to_string()))
    })
}

fn init_observability(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout = tracing_subscriber::fmt::layer().with_filter(filter());

    let (file, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, "e2e.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(stdout).with(file).init();
    Ok(guard)
}
