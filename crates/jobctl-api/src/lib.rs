//! Request/response surface over the job orchestrator.
//!
//! [`ApiHandler`] is the transport-neutral contract, [`OrchestratorAdapter`] the ready-made
//! implementation. With the `http` feature, [`HttpApi`] mounts it on an axum router.

mod error;
pub use error::ApiError;

mod handler;
pub use handler::ApiHandler;

mod adapter;
pub use adapter::OrchestratorAdapter;

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpApi;

#[cfg(feature = "http")]
pub use axum;
