use std::{path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{JobEnv, ModelError, ProcessLimits, TimeoutMs};

/// Immutable description of a unit of work.
///
/// Built through [`JobDescriptor::builder`] (validated on `build`) or deserialized, in which case
/// the orchestrator runs [`JobDescriptor::validate`] on submission. A descriptor is never mutated
/// and may be submitted any number of times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    id: String,
    command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<String>,
    /// If `None`, the process inherits the working directory of the orchestrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cwd: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "JobEnv::is_empty")]
    env: JobEnv,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<TimeoutMs>,
    #[serde(default, skip_serializing_if = "ProcessLimits::is_empty")]
    limits: ProcessLimits,
}

impl JobDescriptor {
    pub fn builder(id: impl Into<String>, command: impl Into<String>) -> JobDescriptorBuilder {
        JobDescriptorBuilder {
            inner: JobDescriptor {
                id: id.into(),
                command: command.into(),
                args: Vec::new(),
                cwd: None,
                env: JobEnv::new(),
                timeout_ms: None,
                limits: ProcessLimits::default(),
            },
        }
    }

    /// Descriptor that runs `script` through the platform shell (`sh -c` / `cmd /C`).
    pub fn shell(id: impl Into<String>, script: impl Into<String>) -> JobDescriptorBuilder {
        let script = script.into();
        cfg_if::cfg_if! {
            if #[cfg(target_family = "windows")] {
                let (shell, flag) = ("cmd", "/C");
            } else {
                let (shell, flag) = ("sh", "-c");
            }
        }
        Self::builder(id, shell).arg(flag).arg(script)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn env(&self) -> &JobEnv {
        &self.env
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn limits(&self) -> &ProcessLimits {
        &self.limits
    }

    /// Checks every field that can be checked without touching the filesystem.
    ///
    /// The working directory is checked by the runner at dispatch time.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.id.trim().is_empty() {
            return Err(ModelError::EmptyId);
        }
        if self.command.trim().is_empty() {
            return Err(ModelError::EmptyCommand);
        }
        if self.command.contains('\0') {
            return Err(ModelError::NulByte { field: "command" });
        }
        if self.args.iter().any(|a| a.contains('\0')) {
            return Err(ModelError::NulByte { field: "args" });
        }
        if self.timeout_ms == Some(0) {
            return Err(ModelError::ZeroTimeout);
        }
        self.env.validate()
    }
}

/// Builder for [`JobDescriptor`].
#[derive(Debug, Clone)]
pub struct JobDescriptorBuilder {
    inner: JobDescriptor,
}

impl JobDescriptorBuilder {
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.inner.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.inner.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.env.push(key, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        let ms = TimeoutMs::try_from(timeout.as_millis()).unwrap_or(TimeoutMs::MAX);
        self.inner.timeout_ms = Some(ms);
        self
    }

    pub fn limits(mut self, limits: ProcessLimits) -> Self {
        self.inner.limits = limits;
        self
    }

    pub fn build(self) -> Result<JobDescriptor, ModelError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_fields() {
        let d = JobDescriptor::builder("build", "cargo")
            .arg("build")
            .args(["--release", "--locked"])
            .cwd("/tmp")
            .env("RUST_LOG", "debug")
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap();

        assert_eq!(d.id(), "build");
        assert_eq!(d.command(), "cargo");
        assert_eq!(d.args(), ["build", "--release", "--locked"]);
        assert_eq!(d.cwd(), Some(Path::new("/tmp")));
        assert_eq!(d.env().get("RUST_LOG"), Some("debug"));
        assert_eq!(d.timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn oversized_timeout_saturates() {
        let d = JobDescriptor::builder("long", "sleep")
            .timeout(Duration::MAX)
            .build()
            .unwrap();
        assert_eq!(d.timeout(), Some(Duration::from_millis(u64::MAX)));
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = JobDescriptor::builder("x", "   ").build().unwrap_err();
        assert_eq!(err, ModelError::EmptyCommand);
    }

    #[test]
    fn empty_id_is_rejected() {
        let err = JobDescriptor::builder("", "ls").build().unwrap_err();
        assert_eq!(err, ModelError::EmptyId);
    }

    #[test]
    fn nul_in_args_is_rejected() {
        let err = JobDescriptor::builder("x", "echo")
            .arg("a\0b")
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::NulByte { field: "args" });
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = JobDescriptor::builder("x", "ls")
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::ZeroTimeout);
    }

    #[cfg(unix)]
    #[test]
    fn shell_wraps_script_in_sh() {
        let d = JobDescriptor::shell("s", "echo hi").build().unwrap();
        assert_eq!(d.command(), "sh");
        assert_eq!(d.args(), ["-c", "echo hi"]);
    }

    #[test]
    fn deserialized_descriptor_skips_validation_until_asked() {
        let d: JobDescriptor = serde_json::from_str(r#"{"id":"a","command":""}"#).unwrap();
        assert_eq!(d.validate(), Err(ModelError::EmptyCommand));
    }

    #[test]
    fn serde_uses_camel_case() {
        let d = JobDescriptor::builder("a", "sleep")
            .arg("1")
            .timeout(Duration::from_millis(1500))
            .build()
            .unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains(r#""timeoutMs":1500"#));
        assert!(!json.contains("cwd"));
        assert!(!json.contains("limits"));
    }
}
