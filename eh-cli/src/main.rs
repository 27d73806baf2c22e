//! everHome CLI - Command-line interface for the everHome cloud API.
//!
//! Useful for checking a token, inspecting the account and devices, and
//! issuing ad-hoc requests from scripts.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing::{debug, warn};

use eh_core::config::AppConfig;
use eh_core::error::EhResult;
use eh_core::logging;

/// everHome - client for the everHome smart home cloud.
#[derive(Parser)]
#[command(
    name = "everhome",
    version,
    about = "everHome cloud API client",
    long_about = "A command-line client for the everHome cloud API.\n\
                  Authenticate with a bearer token obtained from everHome (OAuth2)."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bearer token (overrides config and EVERHOME_TOKEN).
    #[arg(short, long, global = true)]
    token: Option<String>,

    /// API base URL (overrides config and EVERHOME_BASE_URL).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the currently authenticated user.
    User,
    /// List the devices of the account.
    Devices,
    /// Check that the API accepts the token.
    Test,
    /// Send a request to an arbitrary API path.
    Request(commands::request::RequestArgs),
    /// View and edit the configuration file.
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {e}", style("ERROR").red().bold());
            std::process::exit(1);
        }
    }
}

/// Run the selected command. `Ok(false)` means the command already
/// reported its failure.
async fn run(cli: Cli) -> EhResult<bool> {
    let config_path = match cli.config {
        Some(path) => path,
        None => AppConfig::default_config_path()?,
    };
    let mut config = AppConfig::load_or_default(&config_path)?;
    config.apply_env_overrides();
    config.apply_overrides(cli.token, cli.base_url);

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let _guard = match config
        .effective_log_dir()
        .and_then(|dir| logging::init_logging(&log_level, &dir, config.logging.json_output))
    {
        Ok(guard) => Some(guard),
        Err(e) => {
            logging::init_console_logging(&log_level);
            warn!("file logging disabled: {e}");
            None
        }
    };

    debug!(
        "everHome CLI v{}, config {}",
        eh_core::constants::APP_VERSION,
        config_path.display()
    );

    match cli.command {
        Commands::User => commands::user::run(&config, cli.format).await?,
        Commands::Devices => commands::devices::run(&config, cli.format).await?,
        Commands::Test => return commands::devices::run_self_test(&config, cli.format).await,
        Commands::Request(args) => commands::request::run(&config, args, cli.format).await?,
        Commands::Config { action } => {
            commands::config::run(&config, &config_path, action, cli.format)?
        }
    }
    Ok(true)
}
