//! Stablemap CLI and server binary
//!
//! Commands for initializing and validating configuration, printing a
//! one-off estimate, and serving the volume API.

use anyhow::{Context, Result};
use cli::{Cli, Commands, FilterArg};
use config::{generate_default_config, load_config, save_config, validate_config, AppConfig};
use observability::{init_logging, init_metrics, LogFormat};
use server::{
    validate_config_ports, validate_ports_available, HttpServer, Server, ServerConfig,
    ShutdownController,
};
use sources::StaticSources;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use volume_service::{aggregator, app_router, load_reference_data, RefreshWorker, VolumeService};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Serve { config, http } => serve_command(config, http).await,
        Commands::Snapshot {
            config,
            filter,
            pretty,
            fixture,
        } => snapshot_command(config, filter, pretty, fixture).await,
        Commands::Validate { config } => {
            init_logging("stablemap", LogFormat::Pretty)?;
            validate_command(config)
        }
        Commands::Init { output } => {
            init_logging("stablemap", LogFormat::Pretty)?;
            init_command(output)
        }
    }
}

fn log_format(config: &AppConfig) -> LogFormat {
    LogFormat::parse(&config.logging.format).unwrap_or_default()
}

/// Log warnings and refuse to continue on validation errors
fn ensure_valid(config: &AppConfig) -> Result<()> {
    let report = validate_config(config);

    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }

    if !report.is_valid() {
        error!(error_count = report.errors.len(), "Configuration validation failed");
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start due to configuration errors");
    }
    Ok(())
}

async fn serve_command(config_path: PathBuf, http_override: Option<u16>) -> Result<()> {
    let config = load_config(&config_path)?;
    init_logging(&config.service.name, log_format(&config))?;
    ensure_valid(&config)?;

    let http_port = http_override.unwrap_or(config.service.http_port);
    if http_override.is_some() {
        debug!(port = http_port, "Using HTTP port from command line");
    }
    let metrics_port = config.metrics.enabled.then_some(config.metrics.port);
    let server_config =
        ServerConfig::new(config.service.host.clone(), http_port).with_metrics_port(metrics_port);

    validate_config_ports(&server_config)?;
    validate_ports_available(&server_config).await?;

    if let Some(port) = metrics_port {
        init_metrics(port)?;
    }

    let service = Arc::new(VolumeService::from_config(&config)?);
    let shutdown = ShutdownController::with_signals();

    let worker = RefreshWorker::new(Arc::clone(&service), &config.refresh);
    let worker_handle = tokio::spawn(worker.run(shutdown.child_token()));

    info!(
        service = %config.service.name,
        http_port,
        metrics_port,
        refresh_interval_secs = config.refresh.interval_seconds,
        "Starting stablemap"
    );

    let server = HttpServer::new(server_config, app_router(service))
        .with_request_metrics(&config.service.name);
    let result = server.run(shutdown.child_token()).await;

    // The server may have stopped on its own; make sure the worker follows.
    shutdown.shutdown();
    worker_handle.await.context("refresh worker panicked")?;

    result?;
    info!("Shutdown complete");
    Ok(())
}

async fn snapshot_command(
    config_path: PathBuf,
    filter: FilterArg,
    pretty: bool,
    fixture: Option<PathBuf>,
) -> Result<()> {
    // A fixture run works without a config file
    let config = match &fixture {
        Some(_) if !config_path.exists() => generate_default_config(),
        _ => load_config(&config_path)?,
    };
    init_logging(&config.service.name, log_format(&config))?;
    ensure_valid(&config)?;

    let service = match fixture {
        Some(path) => {
            info!(?path, "Reading inputs from fixture");
            let data = load_reference_data(&config.reference_data)?;
            let sources = Arc::new(StaticSources::from_json_file(&path)?);
            VolumeService::with_static_sources(aggregator(data, &config.model), sources)
        }
        None => VolumeService::from_config(&config)?,
    };

    service.refresh().await?;
    let response = service.volume(filter.into())?;

    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", json);
    Ok(())
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Service: {}", config.service.name);
    println!("HTTP: {}:{}", config.service.host, config.service.http_port);
    println!(
        "Metrics: {}",
        if config.metrics.enabled {
            format!("enabled on port {}", config.metrics.port)
        } else {
            "disabled".to_string()
        }
    );
    println!("Refresh interval: {}s", config.refresh.interval_seconds);
    println!(
        "Reference data: {}",
        config.reference_data.path.as_deref().unwrap_or("built-in")
    );

    Ok(())
}

fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Optionally set sources.coingecko.api_key (e.g. \"${{COINGECKO_API_KEY}}\")");
    println!(
        "  2. Run 'stablemap validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  3. Run 'stablemap serve --config {:?}' to start the API",
        output_path
    );

    Ok(())
}
