//! Ad-hoc request command.

use clap::{Args, ValueEnum};

use eh_api::{Payload, RequestOptions};
use eh_core::config::AppConfig;
use eh_core::error::{EhError, EhResult};

use crate::OutputFormat;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Args)]
pub struct RequestArgs {
    /// HTTP method.
    #[arg(value_enum, ignore_case = true)]
    method: HttpMethod,

    /// Path relative to the base URL, or an absolute URL.
    url: String,

    /// Query argument as key=value (repeatable).
    #[arg(short, long = "query", value_parser = parse_key_val)]
    query: Vec<(String, String)>,

    /// Request body. JSON unless --content-type is given.
    #[arg(short, long)]
    data: Option<String>,

    /// Send --data unmodified with this content type.
    #[arg(long)]
    content_type: Option<String>,
}

/// Parse a `key=value` argument.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Build the request options and payload from the command arguments.
fn build_request(args: &RequestArgs) -> EhResult<(RequestOptions, Option<Payload>)> {
    let mut options = RequestOptions::new().with_args(args.query.iter().cloned());
    if let Some(ct) = &args.content_type {
        options = options.raw(ct.clone());
    }

    let payload = match (&args.data, &args.content_type) {
        (None, _) => None,
        (Some(data), Some(_)) => Some(Payload::from(data.as_str())),
        (Some(data), None) => {
            let value: serde_json::Value = serde_json::from_str(data)
                .map_err(|e| EhError::Serialization(format!("--data is not valid JSON: {e}")))?;
            Some(Payload::from(value))
        }
    };
    Ok((options, payload))
}

/// Run the request command.
pub async fn run(config: &AppConfig, args: RequestArgs, format: OutputFormat) -> EhResult<()> {
    let (options, payload) = build_request(&args)?;
    let api = super::create_api_client(config)?;

    let result = match args.method {
        HttpMethod::Get => {
            if payload.is_some() {
                return Err(EhError::InvalidRequest("GET requests take no --data".into()));
            }
            api.get(&args.url, options).await?
        }
        HttpMethod::Post => api.post(&args.url, payload, options).await?,
        HttpMethod::Put => api.put(&args.url, payload, options).await?,
        HttpMethod::Delete => api.delete(&args.url, payload, options).await?,
    };

    super::print_value(result.as_ref(), format);
    Ok(())
}
