use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liftwatch_core::{
    build_channels, create_alert_system, create_authenticator, load_config, open_store,
    validate_config, AdapterRegistry, AlertHandle, CollectionPipeline, OrchestratorConfig,
    PageFetcher, Scheduler,
};
use liftwatch_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("LIFTWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        auth = ?config.auth.method,
        storage = ?config.storage.backend,
        "Configuration loaded"
    );

    let authenticator =
        create_authenticator(&config.auth).context("Failed to create authenticator")?;
    info!("Using authenticator: {}", authenticator.method_name());

    let store = open_store(&config.storage).context("Failed to open status store")?;

    let registry = Arc::new(config.registry().context("Invalid resort roster")?);
    info!(
        resorts = registry.all_targets().len(),
        batches = registry.batch_count(),
        "Resort roster loaded"
    );

    let fetcher = PageFetcher::new(&config.scraper).context("Failed to build HTTP client")?;
    let adapters = AdapterRegistry::from_targets(registry.all_targets(), &fetcher);

    let (alerts, alert_worker) = if config.alerts.enabled {
        let channels = build_channels(&config.alerts.webhooks);
        info!(channels = channels.len(), "Alert dispatch enabled");
        let (handle, worker) = create_alert_system(channels, config.alerts.queue_size);
        (handle, Some(tokio::spawn(worker.run())))
    } else {
        info!("Alert dispatch disabled in config");
        (AlertHandle::disabled(), None)
    };

    let pipeline = Arc::new(CollectionPipeline::new(
        registry,
        adapters,
        store,
        alerts,
        OrchestratorConfig::from(&config.scraper),
    ));

    let orphan_after = config
        .scheduler
        .orphan_after()
        .context("scheduler.orphan_after_secs is out of range")?;
    match pipeline.sweep_orphans(orphan_after) {
        Ok(swept) if !swept.is_empty() => warn!(count = swept.len(), "Marked orphaned runs failed"),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Orphan sweep failed"),
    }

    let scheduler = if config.scheduler.enabled {
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&pipeline),
            config.scheduler.clone(),
        ));
        scheduler.start();
        Some(scheduler)
    } else {
        info!("Scheduler disabled in config");
        None
    };

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(
        config,
        pipeline,
        authenticator,
        scheduler.clone(),
    ));
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutting down...");
    if let Some(scheduler) = &scheduler {
        scheduler.stop();
    }

    // The pipeline owns the only AlertHandle; the worker drains its queue and
    // exits once the router and scheduler have released the pipeline.
    drop(scheduler);
    if let Some(worker) = alert_worker {
        let _ = worker.await;
        info!("Alert worker stopped");
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
