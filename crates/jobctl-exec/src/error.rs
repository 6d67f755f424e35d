use std::{io, path::PathBuf};

use jobctl_core::RunnerError;
use jobctl_model::SpawnCause;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("working directory does not exist: {}", .0.display())]
    MissingCwd(PathBuf),

    #[error("spawn failed: {0}")]
    Spawn(#[source] io::Error),

    #[error("wait failed: {0}")]
    Wait(#[source] io::Error),

    #[error("kill failed: {0}")]
    Kill(#[source] io::Error),
}

impl From<ExecError> for RunnerError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::MissingCwd(_) => RunnerError::InvalidConfiguration(e.to_string()),
            ExecError::Spawn(ref source) => RunnerError::Spawn {
                cause: spawn_cause(source),
                os_code: source.raw_os_error(),
                message: source.to_string(),
            },
            ExecError::Wait(_) | ExecError::Kill(_) => RunnerError::Io(e.to_string()),
        }
    }
}

/// Classify an error returned by `spawn`.
pub(crate) fn spawn_cause(e: &io::Error) -> SpawnCause {
    match e.kind() {
        io::ErrorKind::NotFound => return SpawnCause::NotFound,
        io::ErrorKind::PermissionDenied => return SpawnCause::PermissionDenied,
        _ => {}
    }
    #[cfg(unix)]
    {
        if let Some(libc::EAGAIN | libc::EMFILE | libc::ENFILE | libc::ENOMEM) = e.raw_os_error() {
            return SpawnCause::ResourceLimit;
        }
    }
    SpawnCause::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_errors_keep_cause_and_errno() {
        let err: RunnerError =
            ExecError::Spawn(io::Error::from(io::ErrorKind::PermissionDenied)).into();
        assert!(matches!(
            err,
            RunnerError::Spawn {
                cause: SpawnCause::PermissionDenied,
                ..
            }
        ));

        let err: RunnerError = ExecError::MissingCwd("/nope".into()).into();
        assert_eq!(
            err,
            RunnerError::InvalidConfiguration("working directory does not exist: /nope".into())
        );
    }

    #[cfg(unix)]
    #[test]
    fn resource_exhaustion_is_classified() {
        let e = io::Error::from_raw_os_error(libc::EAGAIN);
        assert_eq!(spawn_cause(&e), SpawnCause::ResourceLimit);

        let e = io::Error::from_raw_os_error(libc::ENOENT);
        assert_eq!(spawn_cause(&e), SpawnCause::NotFound);

        let e = io::Error::from_raw_os_error(libc::E2BIG);
        assert_eq!(spawn_cause(&e), SpawnCause::Other);
    }
}
