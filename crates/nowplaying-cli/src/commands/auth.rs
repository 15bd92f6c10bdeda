//! Authorization bootstrap commands.

use tracing::info;

use crate::app::App;
use crate::error::CliResult;

/// The consent page URL.
pub fn url(app: &App) -> String {
    app.flow().authorize_url()
}

/// Exchanges the redirect `code` and stores the first token record.
pub async fn callback(app: &App, code: &str) -> CliResult<String> {
    let record = app.flow().handle_callback(code).await?;
    info!(backend = app.store().name(), "token stored");
    Ok(format!(
        "Authorization complete. Token stored in the {} store (expires at {}).",
        app.store().name(),
        record.expires_at
    ))
}
