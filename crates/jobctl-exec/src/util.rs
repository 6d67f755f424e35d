use std::process::ExitStatus;

use jobctl_model::{ExitResult, TerminationCause};

/// Convert a reaped status. `requested` marks signals sent by the orchestrator.
pub(crate) fn exit_result(status: ExitStatus, requested: bool) -> ExitResult {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExitResult::signaled(signal, requested);
        }
    }
    match status.code() {
        Some(code) => ExitResult::exited(code),
        None => ExitResult {
            code: None,
            signal: None,
            cause: TerminationCause::Crashed,
        },
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        pub(crate) const SIGTERM: i32 = libc::SIGTERM;
        pub(crate) const SIGKILL: i32 = libc::SIGKILL;

        /// Send `signal` to the process group led by `pid`.
        ///
        /// A group that no longer exists is not an error.
        pub(crate) fn signal_group(pid: u32, signal: i32) -> std::io::Result<()> {
            let pgid = pid as libc::pid_t;
            if unsafe { libc::killpg(pgid, signal) } == 0 {
                return Ok(());
            }
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ESRCH) {
                return Ok(());
            }
            Err(err)
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn exit_codes_and_signals_are_told_apart() {
        // Raw wait statuses: exit code in the high byte, signal in the low bits.
        let exited = exit_result(ExitStatus::from_raw(3 << 8), false);
        assert_eq!(exited, ExitResult::exited(3));

        let killed = exit_result(ExitStatus::from_raw(libc::SIGKILL), true);
        assert_eq!(killed.signal, Some(libc::SIGKILL));
        assert_eq!(killed.cause, TerminationCause::Killed);

        let crashed = exit_result(ExitStatus::from_raw(libc::SIGSEGV), false);
        assert_eq!(crashed.cause, TerminationCause::Crashed);
        assert_eq!(crashed.code, None);
    }

    #[test]
    fn signalling_a_missing_group_is_fine() {
        // Far above any default pid_max.
        assert!(signal_group(0x3fff_fff0, SIGTERM).is_ok());
    }
}
