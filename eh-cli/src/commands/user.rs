//! User command - show the currently authenticated user.

use console::style;

use eh_core::config::AppConfig;
use eh_core::error::EhResult;

use crate::OutputFormat;

/// Run the user command.
pub async fn run(config: &AppConfig, format: OutputFormat) -> EhResult<()> {
    let api = super::create_api_client(config)?;
    let user = api.user().await?;

    if let OutputFormat::Text = format {
        println!("{}", style("Current User").bold().underlined());
    }
    super::print_value(user.as_ref(), format);
    Ok(())
}
