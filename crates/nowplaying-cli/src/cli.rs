//! Command-line interface definition.

use clap::{Parser, Subcommand};

/// Environment variable holding the shared access secret.
pub const ACCESS_SECRET_ENV: &str = "NOWPLAYING_ACCESS_SECRET";

/// nowplaying - Spotify track lookup backed by a self-refreshing OAuth token
#[derive(Debug, Parser)]
#[command(name = "nowplaying")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Shared secret required outside the dev environment
    #[arg(long, global = true, env = ACCESS_SECRET_ENV, hide_env_values = true)]
    pub access_secret: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// One-time authorization with Spotify
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Print a valid access token, refreshing it if needed
    Token,

    /// Show a track as JSON
    Track {
        /// Spotify track ID
        id: String,
    },

    /// Show the track currently playing
    NowPlaying,

    /// Save a track to the library
    Love {
        /// Spotify track ID
        id: String,
    },
}

/// Authorization steps.
#[derive(Debug, Subcommand)]
pub enum AuthAction {
    /// Print the consent URL to open in a browser
    Url,

    /// Exchange the `code` from the redirect and store the token
    Callback {
        /// Value of the `code` query parameter
        code: String,
    },
}
