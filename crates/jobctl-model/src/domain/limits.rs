use serde::{Deserialize, Serialize};

/// Declarative POSIX rlimits for a job's process.
///
/// `None` means "inherit from the orchestrator" for that resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessLimits {
    /// `RLIMIT_NOFILE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_open_files: Option<u64>,
    /// `RLIMIT_FSIZE`, in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size_bytes: Option<u64>,
    /// Sets `RLIMIT_CORE` to zero.
    #[serde(default)]
    pub disable_core_dumps: bool,
}

impl ProcessLimits {
    /// Returns `true` if no explicit limits are configured.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_open_files.is_none()
            && !self.disable_core_dumps
            && self.max_file_size_bytes.is_none()
    }
}
