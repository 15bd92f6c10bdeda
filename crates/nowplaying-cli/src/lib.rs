//! The `nowplaying` command-line interface.
//!
//! [`App`] is the composition root: it reads [`AuthConfig`](nowplaying_auth::AuthConfig),
//! picks the token store once and shares it between the lifecycle manager and
//! the authorization flow.

pub mod app;
pub mod cli;
pub mod commands;
pub mod error;

pub use app::App;
pub use cli::Cli;
pub use error::{CliError, CliResult};
