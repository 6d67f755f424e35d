use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

pub const ENV_HTTP_ADDR: &str = "JOBCTL_HTTP_ADDR";
pub const ENV_JOB_FILE: &str = "JOBCTL_JOB_FILE";

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";

/// Daemon-level settings; orchestrator and logger settings are read by their own crates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub http_addr: SocketAddr,
    /// Descriptors submitted at startup, one JSON object per line.
    pub job_file: Option<PathBuf>,
}

impl DaemonConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup(ENV_HTTP_ADDR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = addr
            .trim()
            .parse()
            .with_context(|| format!("{ENV_HTTP_ADDR}: invalid socket address {addr:?}"))?;

        let job_file = lookup(ENV_JOB_FILE)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            http_addr,
            job_file,
        })
    }
}
