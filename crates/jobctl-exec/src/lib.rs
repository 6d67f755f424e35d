//! OS process runner for the orchestrator.
//!
//! [`ProcRunner`] spawns each job as a child process in its own process group with piped
//! stdout/stderr, and hands the orchestrator a [`ChildProcess`] that streams output lines and
//! terminates the whole group on cancellation.

mod error;
pub use error::ExecError;

pub mod limits;
pub mod proc;
pub use proc::{ChildProcess, ProcRunner};

mod util;

pub mod prelude {
    pub use crate::error::ExecError;
    pub use crate::{ChildProcess, ProcRunner};
}
