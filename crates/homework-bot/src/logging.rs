//! Logging initialization and startup diagnostics
//!
//! Console output always; a log file as well when `LOG_FILE_PATH` is set.

use std::fs::File;

use anyhow::Result;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode, WriteLogger};

use crate::config::{self, Config, LogSettings};

/// Initialize logger for console and, optionally, file output
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Log file could not be created or a logger is already set
pub fn init_logger(settings: &LogSettings) -> Result<()> {
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        settings.level,
        log_config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = &settings.file {
        let log_file = File::create(path)
            .map_err(|e| anyhow::anyhow!("Failed to create log file {}: {}", path.display(), e))?;
        loggers.push(WriteLogger::new(settings.level, log_config, log_file));
    }

    CombinedLogger::init(loggers).map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration with secrets masked
pub fn log_configuration(config: &Config) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("{}: {}", config::PRACTICUM_TOKEN, config::redact(&config.practicum_token));
    log::info!("{}: {}", config::TELEGRAM_TOKEN, config::redact(&config.telegram_token));
    log::info!("{}: {}", config::TELEGRAM_CHAT_ID, config.chat);
    log::info!("Endpoint: {}", config.endpoint);
    log::info!("Retry period: {}s", config.retry_period.as_secs());
    log::info!("Request timeout: {}s", config.request_timeout.as_secs());
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
