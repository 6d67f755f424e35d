use std::io::IsTerminal;

use crate::logger::{error::LoggerError, format::LoggerFormat};

pub const ENV_LOG_LEVEL: &str = "JOBCTL_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "JOBCTL_LOG_FORMAT";

const DEFAULT_SERVICE: &str = "jobctld";

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Process name: the journald syslog identifier, and the `service` field of the startup line.
    pub service: String,
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `info,jobctl.core=debug`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || std::io::stdout().is_terminal();
        Self {
            service: DEFAULT_SERVICE.to_string(),
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color,
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by `JOBCTL_LOG_LEVEL` and `JOBCTL_LOG_FORMAT`.
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoggerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|l| !l.trim().is_empty()) {
            cfg.level = level.trim().to_string();
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT).filter(|f| !f.trim().is_empty()) {
            cfg.format = format.parse()?;
        }
        if cfg.format != LoggerFormat::Text {
            cfg.use_color = false;
        }
        Ok(cfg)
    }
}
