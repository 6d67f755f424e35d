use std::{str::FromStr, time::Duration};

use crate::error::CoreError;

pub const ENV_MAX_CONCURRENCY: &str = "JOBCTL_MAX_CONCURRENCY";
pub const ENV_GRACE_MS: &str = "JOBCTL_GRACE_MS";
pub const ENV_MAX_RETAINED: &str = "JOBCTL_MAX_RETAINED";
pub const ENV_MAX_OUTPUT_LINES: &str = "JOBCTL_MAX_OUTPUT_LINES";
pub const ENV_DEFAULT_TIMEOUT_MS: &str = "JOBCTL_DEFAULT_TIMEOUT_MS";

/// Orchestrator tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Hard ceiling on simultaneously running jobs. Must be positive.
    pub max_concurrency: usize,
    /// How long a graceful termination waits after SIGTERM before SIGKILL.
    /// Also bounds how long a finished run waits for its output readers to drain.
    pub grace_period: Duration,
    /// Terminal jobs kept for snapshots before the oldest are evicted. Must be positive.
    pub max_retained: usize,
    /// Output lines kept per job; later lines are published but not retained.
    pub max_output_lines: usize,
    /// Applied to descriptors that carry no timeout of their own.
    pub default_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            grace_period: Duration::from_secs(5),
            max_retained: 256,
            max_output_lines: 10_000,
            default_timeout: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    pub fn with_max_retained(mut self, n: usize) -> Self {
        self.max_retained = n;
        self
    }

    pub fn with_max_output_lines(mut self, n: usize) -> Self {
        self.max_output_lines = n;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_concurrency == 0 {
            return Err(CoreError::InvalidConfiguration(
                "max_concurrency must be positive".into(),
            ));
        }
        if self.max_retained == 0 {
            return Err(CoreError::InvalidConfiguration(
                "max_retained must be positive".into(),
            ));
        }
        if self.default_timeout == Some(Duration::ZERO) {
            return Err(CoreError::InvalidConfiguration(
                "default_timeout must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Defaults overridden by `JOBCTL_*` environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(n) = parse(&lookup, ENV_MAX_CONCURRENCY)? {
            cfg.max_concurrency = n;
        }
        if let Some(ms) = parse::<u64, _>(&lookup, ENV_GRACE_MS)? {
            cfg.grace_period = Duration::from_millis(ms);
        }
        if let Some(n) = parse(&lookup, ENV_MAX_RETAINED)? {
            cfg.max_retained = n;
        }
        if let Some(n) = parse(&lookup, ENV_MAX_OUTPUT_LINES)? {
            cfg.max_output_lines = n;
        }
        if let Some(ms) = parse::<u64, _>(&lookup, ENV_DEFAULT_TIMEOUT_MS)? {
            cfg.default_timeout = Some(Duration::from_millis(ms));
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>, CoreError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CoreError::InvalidConfiguration(format!("{key}: invalid value {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = OrchestratorConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_concurrency, 4);
        assert!(cfg.default_timeout.is_none());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let cfg = OrchestratorConfig::default().with_max_concurrency(0);
        assert!(matches!(
            cfg.validate(),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn zero_retention_is_rejected() {
        let cfg = OrchestratorConfig::default().with_max_retained(0);
        assert!(matches!(
            cfg.validate(),
            Err(CoreError::InvalidConfiguration(msg)) if msg.contains("max_retained")
        ));
        assert!(matches!(
            OrchestratorConfig::from_lookup(lookup(&[(ENV_MAX_RETAINED, "0")])),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn lookup_overrides_defaults() {
        let cfg = OrchestratorConfig::from_lookup(lookup(&[
            (ENV_MAX_CONCURRENCY, "8"),
            (ENV_GRACE_MS, "250"),
            (ENV_DEFAULT_TIMEOUT_MS, "60000"),
            (ENV_MAX_RETAINED, " "),
        ]))
        .unwrap();

        assert_eq!(cfg.max_concurrency, 8);
        assert_eq!(cfg.grace_period, Duration::from_millis(250));
        assert_eq!(cfg.default_timeout, Some(Duration::from_secs(60)));
        assert_eq!(cfg.max_retained, 256);
    }

    #[test]
    fn garbage_values_are_reported() {
        let err = OrchestratorConfig::from_lookup(lookup(&[(ENV_MAX_CONCURRENCY, "many")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_CONCURRENCY));

        let err =
            OrchestratorConfig::from_lookup(lookup(&[(ENV_MAX_CONCURRENCY, "0")])).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
    }
}
