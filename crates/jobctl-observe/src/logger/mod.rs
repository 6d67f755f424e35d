mod config;
mod error;
mod format;
mod log;

pub use config::{ENV_LOG_FORMAT, ENV_LOG_LEVEL, LoggerConfig};
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the global tracing subscriber described by `cfg` and log a startup line.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    match cfg.format {
        LoggerFormat::Text => log::Logger::text(cfg)?,
        LoggerFormat::Json => log::Logger::json(cfg)?,
        LoggerFormat::Journald => log::Logger::journald(cfg)?,
    }
    tracing::info!(
        target: "jobctl.observe.logger",
        service = %cfg.service,
        format = %cfg.format,
        level = %cfg.level,
        "logger initialized"
    );
    Ok(())
}
