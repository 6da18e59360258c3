use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use userbase::config::Configuration;
use userbase::directory::{self, Directory, DirectoryClient};
use userbase::telemetry;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host to listen on and advertise in the directory.
    host: Option<String>,
    /// Log entry and exit timestamps of every store call.
    #[clap(long)]
    debug: bool,
    /// Path of the YAML configuration file.
    #[clap(long, short)]
    config: Option<PathBuf>,
    /// Service port, `0` lets the system pick one.
    #[clap(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let (mut config, config_error) = match Configuration::default()
        .path(args.config.unwrap_or_default())
        .read()
    {
        Ok(config) => (config, None),
        Err(err) => (Configuration::default(), Some(err)),
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.debug |= args.debug;

    telemetry::setup_logging(&config.telemetry, "info");
    if let Some(err) = config_error {
        tracing::warn!(error = %err, "using default configuration");
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server stopped");
            ExitCode::FAILURE
        },
    }
}

async fn run(config: Configuration) -> Result<(), Box<dyn std::error::Error>> {
    let tracer = if config.telemetry.otlp {
        Some(telemetry::setup_tracer()?)
    } else {
        None
    };
    let metrics = if config.telemetry.metrics {
        Some(telemetry::setup_metrics_recorder()?)
    } else {
        None
    };
    let config = Arc::new(config);

    if config.directory.embedded {
        let listener =
            TcpListener::bind((config.host.as_str(), config.directory.port)).await?;
        tracing::info!(address = %listener.local_addr()?, "directory listening");

        let router = directory::router(Arc::new(Directory::new()));
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                tracing::error!(error = %err, "directory stopped");
            }
        });
    }

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let endpoint = directory::http_endpoint(&config.host, listener.local_addr()?.port())?;

    // publish under the service name.
    let directory = DirectoryClient::locate(&config.host, config.directory.port)?;
    directory.rebind(&config.name, &endpoint).await?;
    tracing::info!(name = %config.name, %endpoint, debug = config.debug, "ready");

    let state = userbase::initialize_state(Arc::clone(&config), metrics);
    axum::serve(listener, userbase::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(err) = directory.unbind(&config.name).await {
        tracing::warn!(error = %err, name = %config.name, "cannot unbind name");
    }
    if let Some(provider) = tracer {
        if let Err(err) = provider.shutdown() {
            tracing::warn!(error = %err, "cannot flush traces");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
