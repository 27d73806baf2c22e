//! Device listing and the self-test.

use std::time::{Duration, Instant};

use console::style;

use eh_core::config::AppConfig;
use eh_core::error::EhResult;

use crate::OutputFormat;

/// Run the devices command.
pub async fn run(config: &AppConfig, format: OutputFormat) -> EhResult<()> {
    let api = super::create_api_client(config)?;
    let devices = api.devices().await?;

    if let OutputFormat::Text = format {
        println!("{}", style("Devices").bold().underlined());
    }
    super::print_value(devices.as_ref(), format);
    Ok(())
}

/// Run the self-test: succeed iff `GET devices` succeeds.
///
/// A failed check is reported here and yields `Ok(false)`; only errors
/// raised before the check (such as a missing token) are returned.
pub async fn run_self_test(config: &AppConfig, format: OutputFormat) -> EhResult<bool> {
    let api = super::create_api_client(config)?;

    let start = Instant::now();
    let result = api.self_test().await;
    Ok(report_self_test(&result, start.elapsed(), format))
}

/// Print the self-test outcome and return whether it passed.
fn report_self_test(result: &EhResult<()>, elapsed: Duration, format: OutputFormat) -> bool {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "ok": result.is_ok(),
                    "latency_ms": elapsed.as_millis(),
                    "http_status": result.as_ref().err().and_then(|e| e.http_status()),
                    "error": result.as_ref().err().map(|e| e.to_string()),
                })
            );
        }
        OutputFormat::Text => match result {
            Ok(()) => println!(
                "  {} API reachable, token accepted ({}ms)",
                style("OK").green().bold(),
                elapsed.as_millis()
            ),
            Err(e) => println!("  {} {e}", style("FAIL").red().bold()),
        },
    }

    result.is_ok()
}
