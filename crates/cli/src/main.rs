//! Offline Queue CLI - Command-line client for the offline queue daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9531";

#[derive(Parser)]
#[command(name = "offline-queue")]
#[command(about = "Offline request queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "OFFLINE_QUEUE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue an API call for delivery
    Enqueue {
        /// Endpoint, relative to the daemon's API base URL
        endpoint: String,

        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        #[arg(short, long, default_value = "POST")]
        method: String,

        /// Priority: critical, high, medium, low
        #[arg(short, long)]
        priority: Option<String>,

        /// Payload as JSON string
        #[arg(long)]
        payload: Option<String>,

        /// Send without the bearer token
        #[arg(long)]
        no_auth: bool,
    },

    /// Remove a queued call
    Remove {
        /// Request ID
        id: String,
    },

    /// Drop every queued call
    Clear,

    /// List queued calls in delivery order
    List {
        /// Only this priority tier
        #[arg(short, long)]
        priority: Option<String>,

        /// Only endpoints starting with this prefix
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Show queue status
    Status,

    /// Run a processing pass now
    Process,

    /// Drop calls older than the given age
    Cleanup {
        /// Maximum age in hours (default: 24)
        #[arg(long)]
        max_age_hours: Option<u64>,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct EnqueueResult {
    id: String,
    priority: String,
    queue_size: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueuedRequest {
    id: String,
    endpoint: String,
    method: String,
    priority: String,
    created_at: i64,
    #[serde(default)]
    retry_count: u32,
}

#[derive(Tabled)]
struct RequestRow {
    id: String,
    priority: String,
    method: String,
    endpoint: String,
    retries: u32,
    queued_at: String,
}

impl From<QueuedRequest> for RequestRow {
    fn from(req: QueuedRequest) -> Self {
        Self {
            id: req.id,
            priority: req.priority,
            method: req.method,
            endpoint: req.endpoint,
            retries: req.retry_count,
            queued_at: format_millis(req.created_at),
        }
    }
}

fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn hours_to_secs(hours: u64) -> u64 {
    hours.saturating_mul(3600)
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Enqueue {
            endpoint,
            method,
            priority,
            payload,
            no_auth,
        } => {
            let mut params = json!({
                "endpoint": endpoint,
                "method": method,
                "requires_auth": !no_auth,
            });
            if let Some(payload) = payload {
                let payload_json: serde_json::Value =
                    serde_json::from_str(&payload).context("Invalid JSON payload")?;
                params["payload"] = payload_json;
            }
            if let Some(priority) = priority {
                params["priority"] = json!(priority);
            }

            let result = call_rpc(&cli.rpc_url, "queue.enqueue.v1", params).await?;
            let enqueue_result: EnqueueResult = serde_json::from_value(result)?;

            println!("{}", "✓ Request queued".green().bold());
            println!();
            println!("{}", Table::new(vec![enqueue_result]));
        }

        Commands::Remove { id } => {
            let result = call_rpc(&cli.rpc_url, "queue.remove.v1", json!({ "id": id })).await?;

            if result["removed"].as_bool().unwrap_or(false) {
                println!("{}", format!("✓ Request {} removed", id).green().bold());
            } else {
                println!("{}", format!("○ Request {} was not queued", id).yellow());
            }
        }

        Commands::Clear => {
            let result = call_rpc(&cli.rpc_url, "queue.clear.v1", json!({})).await?;
            println!(
                "{}",
                format!("✓ {} requests cleared", result["cleared"]).green().bold()
            );
        }

        Commands::List { priority, endpoint } => {
            let params = json!({
                "priority": priority,
                "endpoint_prefix": endpoint,
            });
            let result = call_rpc(&cli.rpc_url, "queue.list.v1", params).await?;
            let requests: Vec<QueuedRequest> =
                serde_json::from_value(result["requests"].clone()).context("Unexpected list result")?;

            if requests.is_empty() {
                println!("{}", "Queue is empty".yellow());
            } else {
                let rows: Vec<RequestRow> = requests.into_iter().map(RequestRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Status => {
            println!("{}", "Queue Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "queue.stats.v1", json!({})).await {
                Ok(status) => {
                    let stats = &status["stats"];
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Queued:".bold(), status["size"]);
                    for tier in ["critical", "high", "medium", "low"] {
                        println!("    {:<9} {}", tier, stats["byPriority"][tier]);
                    }
                    println!();
                    if let Some(oldest) = stats["oldestRequest"].as_i64() {
                        println!("  {} {}", "Oldest:".bold(), format_millis(oldest));
                    }
                    if let Some(newest) = stats["newestRequest"].as_i64() {
                        println!("  {} {}", "Newest:".bold(), format_millis(newest));
                    }
                    let avg_secs = stats["averageAgeMs"].as_i64().unwrap_or(0) / 1000;
                    println!("  {} {} seconds", "Average age:".bold(), avg_secs);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Process => {
            println!("{}", "Running processing pass...".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "queue.process.v1", json!({})).await {
                Ok(report) => match report["outcome"].as_str() {
                    Some("offline") => {
                        println!("  {} Offline, nothing attempted", "○".yellow());
                    }
                    Some("already_running") => {
                        println!("  {} A pass is already running", "○".yellow());
                    }
                    _ => {
                        println!("  {} {} attempted", "•".bold(), report["attempted"]);
                        println!("  {} {} delivered", "✓".green(), report["delivered"]);
                        println!("  {} {} kept for retry", "↻".yellow(), report["retried"]);
                        println!("  {} {} abandoned", "✗".red(), report["abandoned"]);
                    }
                },
                Err(e) => {
                    println!("  {} Processing failed: {}", "✗".red(), e);
                }
            }
        }

        Commands::Cleanup { max_age_hours } => {
            let params = json!({
                "max_age_secs": max_age_hours.map(hours_to_secs),
            });
            let result = call_rpc(&cli.rpc_url, "queue.cleanup.v1", params).await?;
            println!(
                "{}",
                format!("✓ {} expired requests removed", result["removed"])
                    .green()
                    .bold()
            );
        }
    }

    Ok(())
}
