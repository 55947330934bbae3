use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "fleet-cli")]
#[command(about = "Management CLI for the fleet admin control plane", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "admin-secret-key")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check control plane status
    Status,
    /// List replicas, or show one by id, url or name
    Replicas {
        #[arg(long)]
        id: Option<i64>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Register a replica (probes its health endpoint first)
    Add {
        name: String,
        url: String,
        #[arg(long, default_value = "health")]
        health_check_endpoint: String,
    },
    /// Disable a replica by id or url
    Remove {
        #[arg(long)]
        id: Option<i64>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Change a replica's status (inactive, active, disabled)
    SetStatus { id: i64, status: String },
    /// Show the audit trail
    Activity,
    /// Show the effective prequal parameters
    Params,
    /// Show every prequal parameter version
    ParamsHistory,
    /// Store a new prequal parameter version
    SetParams {
        #[arg(long)]
        max_life_time: i64,
        #[arg(long)]
        pool_size: i64,
        #[arg(long)]
        probe_factor: f64,
        #[arg(long)]
        probe_remove_factor: i64,
        #[arg(long)]
        mu: i64,
        /// Version to activate
        #[arg(long)]
        activate_id: Option<i64>,
    },
    /// Show accumulated traffic statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)),
        Commands::Replicas { id, url, name } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(id) = id {
                query.push(("id", id.to_string()));
            }
            if let Some(url) = url {
                query.push(("url", url));
            }
            if let Some(name) = name {
                query.push(("name", name));
            }
            client.get(format!("{}/admin/get-replica", base)).query(&query)
        }
        Commands::Add { name, url, health_check_endpoint } => client
            .post(format!("{}/admin/add-replica", base))
            .json(&json!({ "name": name, "url": url, "health_check_endpoint": health_check_endpoint })),
        Commands::Remove { id, url } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(id) = id {
                query.push(("id", id.to_string()));
            }
            if let Some(url) = url {
                query.push(("url", url));
            }
            client.delete(format!("{}/admin/remove-replica", base)).query(&query)
        }
        Commands::SetStatus { id, status } => client
            .patch(format!("{}/admin/change-status", base))
            .json(&json!({ "id": id, "status": status })),
        Commands::Activity => client.get(format!("{}/admin/activity-logs", base)),
        Commands::Params => client.get(format!("{}/admin/get-prequal-parameters", base)),
        Commands::ParamsHistory => client.get(format!("{}/admin/get-prequal-parameter-history", base)),
        Commands::SetParams {
            max_life_time,
            pool_size,
            probe_factor,
            probe_remove_factor,
            mu,
            activate_id,
        } => client
            .post(format!("{}/admin/update-prequal-parameters", base))
            .json(&json!({
                "max_life_time": max_life_time,
                "pool_size": pool_size,
                "probe_factor": probe_factor,
                "probe_remove_factor": probe_remove_factor,
                "mu": mu,
                "activate_id": activate_id,
            })),
        Commands::Stats => client.get(format!("{}/admin/get-statistics", base)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
