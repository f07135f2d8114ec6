//! PaySync service binary
//!
//! Entry point for the account state and settlement synchronizer. It
//! provides commands for initializing, validating, and starting the
//! service.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cli::{Cli, Commands};
use config::{generate_default_config, load_config, save_config, validate_config, MasterConfig};
use observability::{init_logging, LogFormat};
use tracing::{error, info, warn};

use accountsync::{
    create_router, AccountManager, HttpEngineClient, HttpProviderClient, MemoryStore,
    PostgresStore, ProviderIdResolver, SettlementCoordinator, SyncApiState, SyncStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start {
            config,
            port,
            in_memory,
        } => start_service(config, port, in_memory).await,
        Commands::Validate { config } => validate_command(config).await,
        Commands::Init { output } => init_command(output).await,
    }
}

async fn start_service<P: AsRef<Path>>(
    config_path: P,
    port_override: Option<u16>,
    in_memory: bool,
) -> Result<()> {
    let config = load_config(config_path.as_ref())?;

    let format = LogFormat::parse(&config.service.log_format).unwrap_or_default();
    init_logging(&config.service.name, format)?;

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }
    if !report.is_valid() {
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start service due to configuration errors");
    }

    let store = build_store(&config, in_memory).await?;

    let engine = Arc::new(HttpEngineClient::from_config(&config.engine));
    let provider = Arc::new(HttpProviderClient::from_config(&config.provider));

    let resolver = Arc::new(ProviderIdResolver::new(store.clone(), provider));
    let manager = Arc::new(AccountManager::new(store.clone(), engine.clone(), resolver));
    let coordinator = Arc::new(SettlementCoordinator::new(store, engine));

    let state = Arc::new(SyncApiState {
        manager,
        coordinator,
    });
    let router = create_router(state);

    let port = port_override.unwrap_or(config.service.listen_port);
    let addr = format!("{}:{}", config.service.listen_host, port);

    info!(%addr, engine = %config.engine.base_url, "Starting synchronizer");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Synchronizer stopped");
    Ok(())
}

async fn build_store(config: &MasterConfig, in_memory: bool) -> Result<Arc<dyn SyncStore>> {
    if in_memory {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    info!(max_connections = config.database.max_connections, "Connecting to PostgreSQL");
    let store = PostgresStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to PostgreSQL")?;
    store
        .ensure_schema()
        .await
        .context("Failed to ensure database schema")?;
    Ok(Arc::new(store))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(%e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

async fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = match load_config(config_path.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[error] Failed to load configuration: {}", e);
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

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
    println!(
        "Listen: {}:{}",
        config.service.listen_host, config.service.listen_port
    );
    println!(
        "Engine: {}",
        if config.engine.base_url.is_empty() {
            "(not configured)"
        } else {
            &config.engine.base_url
        }
    );
    println!("Provider: {}", config.provider.base_url);

    Ok(())
}

async fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();

    let config = generate_default_config();

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Edit the configuration file to customize settings");
    println!("  2. Set DATABASE_URL in the environment");
    println!(
        "  3. Run 'paysyncd validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  4. Run 'paysyncd start --config {:?}' to start the service",
        output_path
    );

    Ok(())
}
