//! Core plumbing shared by every nowplaying crate: deployment environment,
//! access-secret checks and tracing setup.

pub mod environment;
pub mod tracing;

pub use environment::{AccessSecretError, Environment};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
