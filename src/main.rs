use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use fleet_admin::config::loader::load_or_default;
use fleet_admin::lifecycle::{bootstrap, signals, Shutdown, StartupError};
use fleet_admin::observability::{logging, metrics};
use fleet_admin::AdminServer;

#[derive(Parser)]
#[command(name = "fleet-admin")]
#[command(about = "Control plane for the load-balancer replica fleet", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref()).map_err(StartupError::from)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "fleet-admin starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let services = bootstrap(&config, &shutdown).await?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(StartupError::from)?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let consumer_rx = shutdown.subscribe();
    let consumer_shutdown = shutdown.clone();
    let consumer = services.consumer;
    let consumer_task = tokio::spawn(async move {
        let result = consumer.run(consumer_rx).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Inbound consumer stopped, shutting down");
            consumer_shutdown.trigger();
        }
        result
    });

    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let server = AdminServer::new(
        services.state,
        Duration::from_secs(config.admin.request_timeout_secs),
    );
    server.run(listener, shutdown.subscribe()).await?;

    shutdown.trigger();
    match consumer_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e.into()),
        Err(e) => tracing::error!(error = %e, "Inbound consumer task panicked"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
