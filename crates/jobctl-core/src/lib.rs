pub mod error;
pub use error::CoreError;

pub mod config;
pub use config::OrchestratorConfig;

pub mod runner;
pub use runner::{OutputLines, OutputSink, Process, Runner, RunnerError};

pub mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoOpMetrics};

pub mod bus;
pub use bus::{Bus, Subscription};

pub mod subscribe;
pub use subscribe::Subscribe;

mod handle;
mod registry;

pub mod orchestrator;
pub use orchestrator::{
    Cancellation, Orchestrator, OrchestratorBuilder, OrchestratorStats, OutputFollow,
};

#[cfg(test)]
mod testing;
