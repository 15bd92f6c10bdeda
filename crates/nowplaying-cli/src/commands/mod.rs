//! Subcommand implementations. Each returns the text to print on stdout.

pub mod auth;
pub mod track;
