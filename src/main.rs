use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interview_room::bootstrap::{Backends, RoomServices, StartupError};
use interview_room::config::{AppConfig, ConfigError};

const LOCK_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate().map_err(ConfigError::from)?;

    tracing::info!(
        environment = ?config.server.environment,
        "interview-room starting"
    );

    let shutdown = CancellationToken::new();
    let backends = Backends::connect(&config).await?;
    let services = RoomServices::assemble(backends, &config.events, shutdown.clone());

    let drain_task = if config.drain.enabled {
        let drain = services.drain_service(config.drain.to_drain_config());
        let token = shutdown.clone();
        tracing::info!(interval_secs = config.drain.interval_secs, "Event drain enabled");
        Some(tokio::spawn(async move { drain.run(token).await }))
    } else {
        tracing::info!("Event drain disabled");
        None
    };

    let sweep_task = {
        let dispatcher = services.dispatcher.clone();
        let token = shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(LOCK_SWEEP_INTERVAL);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = dispatcher.sweep_idle_locks();
                        tracing::trace!(removed, "Swept idle room locks");
                    }
                }
            }
        })
    };

    let app = services.router(&config.server);
    let addr = config.server.socket_addr().map_err(ConfigError::from)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    let server_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
            server_token.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Some(task) = drain_task {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Drain task ended abnormally");
        }
    }
    let _ = sweep_task.await;

    tracing::info!("interview-room stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
