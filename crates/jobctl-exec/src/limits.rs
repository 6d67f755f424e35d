//! POSIX rlimits for spawned jobs.
//!
//! On Unix the limits from a descriptor's [`ProcessLimits`] are applied in a `pre_exec` hook,
//! which runs in the forked child right before `execve`, so the job never runs unrestricted.
//! Elsewhere the request is logged and ignored.

use jobctl_model::ProcessLimits;
use tokio::process::Command;

/// Attach `limits` to `cmd`. Empty limits leave the command untouched.
pub fn attach_rlimits(cmd: &mut Command, limits: &ProcessLimits) {
    if limits.is_empty() {
        return;
    }

    #[cfg(unix)]
    {
        unix_impl::attach_rlimits(cmd, limits);
    }

    #[cfg(not(unix))]
    {
        let _ = cmd;
        tracing::warn!(
            target: "jobctl.exec.limits",
            ?limits,
            "process limits requested on a non-Unix OS; ignoring"
        );
    }
}

#[cfg(unix)]
mod unix_impl {
    use std::io;

    use jobctl_model::ProcessLimits;
    use tokio::process::Command;

    pub fn attach_rlimits(cmd: &mut Command, limits: &ProcessLimits) {
        let max_open_files = limits.max_open_files;
        let max_file_size_bytes = limits.max_file_size_bytes;
        let disable_core_dumps = limits.disable_core_dumps;

        // Only async-signal-safe calls below: this runs between fork and exec.
        unsafe {
            cmd.pre_exec(move || {
                if let Some(nofile) = max_open_files {
                    check(libc::setrlimit(libc::RLIMIT_NOFILE, &rlimit(nofile)))?;
                }
                if let Some(fsize) = max_file_size_bytes {
                    check(libc::setrlimit(libc::RLIMIT_FSIZE, &rlimit(fsize)))?;
                }
                if disable_core_dumps {
                    check(libc::setrlimit(libc::RLIMIT_CORE, &rlimit(0)))?;
                }
                Ok(())
            });
        }
    }

    fn rlimit(value: u64) -> libc::rlimit {
        libc::rlimit {
            rlim_cur: value as libc::rlim_t,
            rlim_max: value as libc::rlim_t,
        }
    }

    fn check(rc: libc::c_int) -> io::Result<()> {
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_limits_are_a_noop() {
        let limits = ProcessLimits::default();
        assert!(limits.is_empty());

        let mut cmd = Command::new("sh");
        attach_rlimits(&mut cmd, &limits);
    }

    #[test]
    fn non_empty_limits_attach_without_panicking() {
        let limits = ProcessLimits {
            max_open_files: Some(256),
            max_file_size_bytes: Some(10 * 1024 * 1024),
            disable_core_dumps: true,
        };

        let mut cmd = Command::new("sh");
        attach_rlimits(&mut cmd, &limits);
    }
}
