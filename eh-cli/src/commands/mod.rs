//! CLI command implementations.

pub mod config;
pub mod devices;
pub mod request;
pub mod user;

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;

use eh_api::ApiClient;
use eh_core::config::AppConfig;
use eh_core::error::{EhError, EhResult};

use crate::OutputFormat;

/// Helper to create an API client from config.
pub fn create_api_client(config: &AppConfig) -> EhResult<ApiClient> {
    config.validate()?;
    if !config.has_token() {
        return Err(EhError::MissingConfig(
            "no token; pass --token, set EVERHOME_TOKEN or api.auth_token".into(),
        ));
    }
    ApiClient::from_config(&config.api, &config.retry)
}

/// Print a response body in the requested format.
pub fn print_value(value: Option<&serde_json::Value>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let value = value.cloned().unwrap_or(serde_json::Value::Null);
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        }
        OutputFormat::Text => match value {
            None => println!("  {}", style("(empty response)").dim()),
            Some(serde_json::Value::Object(map)) => {
                let mut table = new_table(&["Field", "Value"]);
                for (key, v) in map {
                    table.add_row(vec![key.clone(), truncate(&display_scalar(v), 80)]);
                }
                println!("{table}");
            }
            Some(serde_json::Value::Array(items)) => {
                let mut table = new_table(&["#", "Entry"]);
                for (i, v) in items.iter().enumerate() {
                    table.add_row(vec![i.to_string(), truncate(&display_scalar(v), 100)]);
                }
                println!("{table}");
                println!("  {} entries", items.len());
            }
            Some(other) => println!("{}", display_scalar(other)),
        },
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

/// Strings print without quotes, everything else as compact JSON.
fn display_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Truncate a string to a maximum number of characters, appending an
/// ellipsis if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

/// Hide all but the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}
