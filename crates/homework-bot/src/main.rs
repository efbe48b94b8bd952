use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;

use homework_bot::cli::{Cli, Commands};
use homework_bot::logging::{init_logger, log_configuration};
use homework_bot::{Config, CycleOutcome, LogSettings, Poller, PracticumClient, SystemClock, TelegramNotifier};

/// Entry point
///
/// Loads `.env`, sets up logging, validates configuration and dispatches to
/// the selected subcommand. Any configuration error ends the process with a
/// non-zero status before the poll loop is entered.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let log_settings = LogSettings::from_env().context("invalid logging configuration")?;
    init_logger(&log_settings)?;

    let config = Config::from_env().context("configuration check failed")?;

    match cli.command {
        Some(Commands::CheckConfig) => {
            log_configuration(&config);
            log::info!("Configuration is valid");
            Ok(())
        }
        Some(Commands::Run { from_date, once }) => run_bot(config, from_date, once).await,
        None => run_bot(config, None, false).await,
    }
}

/// Builds the clients and runs the poll loop until a shutdown signal.
async fn run_bot(config: Config, from_date: Option<i64>, once: bool) -> Result<()> {
    log_configuration(&config);

    let api = PracticumClient::new(&config).context("failed to build Practicum API client")?;
    let notifier = TelegramNotifier::new(&config).context("failed to build Telegram client")?;

    let mut poller = Poller::new(api, notifier, SystemClock, config.retry_period);
    if let Some(from_date) = from_date {
        poller = poller.with_cursor(from_date);
    }

    if once {
        match poller.poll_once().await {
            CycleOutcome::Completed { sent } => log::info!("Single poll finished, {} message(s) sent", sent),
            CycleOutcome::Failed { kind, reported } => {
                log::warn!("Single poll failed ({} error, reported to chat: {})", kind, reported)
            }
        }
        return Ok(());
    }

    poller.run(shutdown_signal(), None).await;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl-C, shutting down gracefully..."),
        _ = terminate => log::info!("Received SIGTERM, shutting down gracefully..."),
    }
}
