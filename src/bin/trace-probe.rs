use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use trace_context_service::trace_context::{parse_traceparent, TraceContext, TRACEPARENT_HEADER};

#[derive(Parser)]
#[command(name = "trace-probe")]
#[command(about = "Send traced requests to the trace context service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,
    /// Call /info with a traceparent header
    Info {
        /// traceparent to send. A new sampled root context is generated if omitted.
        #[arg(short, long)]
        traceparent: Option<String>,

        /// Send the value even if it does not parse.
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Info { traceparent, raw } => {
            let value = outgoing_traceparent(traceparent, raw)?;
            println!("traceparent sent:     {}", value);

            let mut headers = HeaderMap::new();
            headers.insert(TRACEPARENT_HEADER, HeaderValue::from_str(&value)?);

            let res = client
                .get(format!("{}/info", cli.url))
                .headers(headers)
                .send()
                .await?;
            if let Some(echoed) = res.headers().get(TRACEPARENT_HEADER) {
                println!("traceparent received: {}", echoed.to_str().unwrap_or("<invalid>"));
            }
            print_response(res).await?;
        }
    }

    Ok(())
}

/// The value to send: the given one if it parses (or `raw` is set), else a new sampled root.
fn outgoing_traceparent(
    traceparent: Option<String>,
    raw: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    match traceparent {
        Some(value) => {
            if let Err(e) = parse_traceparent(&value) {
                if !raw {
                    return Err(format!("invalid traceparent ({}); pass --raw to send it anyway", e).into());
                }
            }
            Ok(value)
        }
        None => Ok(TraceContext::new_root(true).to_string()),
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(format!("service returned status {}: {}", status, text).into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
