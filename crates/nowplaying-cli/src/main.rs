//! nowplaying CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use nowplaying_cli::cli::{AuthAction, Cli, Command};
use nowplaying_cli::commands;
use nowplaying_cli::{App, CliResult};
use nowplaying_core::{Environment, TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = TracingConfig::for_environment(Environment::from_env());
    if cli.debug {
        tracing_config = tracing_config.with_level(Level::DEBUG);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {e}");
    }

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(hint) = e.hint() {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<String> {
    let app = App::from_env()?;
    let secret = cli.access_secret.as_deref();

    match cli.command {
        Command::Auth { action } => match action {
            AuthAction::Url => Ok(commands::auth::url(&app)),
            AuthAction::Callback { code } => commands::auth::callback(&app, &code).await,
        },
        Command::Token => commands::track::token(&app, secret).await,
        Command::Track { id } => commands::track::show(&app, secret, &id).await,
        Command::NowPlaying => commands::track::now_playing(&app, secret).await,
        Command::Love { id } => commands::track::love(&app, secret, &id).await,
    }
}
