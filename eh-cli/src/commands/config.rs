//! Configuration commands.

use std::path::Path;

use clap::Subcommand;
use console::style;

use eh_core::config::AppConfig;
use eh_core::error::{EhError, EhResult};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (token masked).
    Show,
    /// Print the configuration file path.
    Path,
    /// Write a configuration file with the effective settings.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Store a bearer token in the configuration file.
    SetToken {
        /// Bearer token.
        token: String,
    },
}

/// Effective configuration with the token masked.
fn redacted(config: &AppConfig) -> AppConfig {
    let mut shown = config.clone();
    shown.api.auth_token = shown.api.auth_token.as_deref().map(super::mask_secret);
    shown
}

pub fn run(
    config: &AppConfig,
    path: &Path,
    action: ConfigAction,
    format: OutputFormat,
) -> EhResult<()> {
    match action {
        ConfigAction::Show => {
            let shown = redacted(config);
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&shown)?);
                }
                OutputFormat::Text => {
                    let text = toml::to_string_pretty(&shown).map_err(|e| {
                        EhError::Config(format!("failed to serialize config: {e}"))
                    })?;
                    println!("{}", style("Configuration").bold().underlined());
                    print!("{text}");
                }
            }
        }
        ConfigAction::Path => match format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({ "path": path.display().to_string(), "exists": path.exists() })
                );
            }
            OutputFormat::Text => println!("{}", path.display()),
        },
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(EhError::Config(format!(
                    "{} already exists; use --force to overwrite",
                    path.display()
                )));
            }
            config.save_to_file(path)?;
            println!(
                "  {} wrote {}",
                style("OK").green().bold(),
                path.display()
            );
        }
        ConfigAction::SetToken { token } => {
            let mut stored = AppConfig::load_or_default(path)?;
            stored.apply_overrides(Some(token), None);
            stored.save_to_file(path)?;
            println!(
                "  {} token saved to {}",
                style("OK").green().bold(),
                path.display()
            );
        }
    }
    Ok(())
}
