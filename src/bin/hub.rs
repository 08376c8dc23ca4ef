use std::time::Duration;

use clap::Parser;
use crop_surveillance::{
    actors::{
        coordinator::{CoordinatorConfig, CoordinatorError, CoordinatorHandle},
        forwarder::ForwarderHandle,
        storage::StorageHandle,
    },
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, StorageConfig, read_config_file},
    storage::{StorageBackend, log::LogBackend, memory::MemoryBackend},
};
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tracing::{debug, error, info, instrument, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound for draining the coordinator on ctrl-c
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("crop_surveillance", LevelFilter::TRACE),
        ("hub", LevelFilter::TRACE),
        ("tower_http", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;

    let (summary_tx, _) = broadcast::channel(config.summary_channel_capacity);

    let (coordinator, mut coordinator_task) = CoordinatorHandle::spawn(
        CoordinatorConfig {
            max_regions: config.max_regions,
        },
        summary_tx.clone(),
    );

    let forwarder = match &config.forward {
        Some(forward) => {
            info!("forwarding summaries to {}", forward.url);
            Some(ForwarderHandle::spawn(forward.clone(), summary_tx.subscribe())?)
        }
        None => None,
    };

    let backends = build_backends(&config).await?;
    let storage = if backends.is_empty() {
        debug!("no storage backend configured");
        None
    } else {
        Some(StorageHandle::spawn(summary_tx.subscribe(), backends))
    };

    let addr = spawn_api_server(
        ApiConfig::from(config.ingress.clone()),
        ApiState::new(coordinator.clone(), storage.clone()),
    )
    .await?;
    info!("accepting alerts on http://{addr}/alert");

    let stopped = tokio::select! {
        joined = &mut coordinator_task => Some(joined),
        _ = tokio::signal::ctrl_c() => None,
    };

    let result = match stopped {
        Some(joined) => coordinator_outcome(joined),
        None => {
            info!("received ctrl-c, shutting down");
            coordinator.shutdown();

            // Let workers finish the events that were already acknowledged
            match tokio::time::timeout(SHUTDOWN_GRACE, coordinator_task).await {
                Ok(joined) => coordinator_outcome(joined),
                Err(_) => {
                    warn!("coordinator did not stop within {SHUTDOWN_GRACE:?}");
                    Ok(())
                }
            }
        }
    };

    if let Some(forwarder) = &forwarder
        && let Err(e) = forwarder.shutdown().await
    {
        debug!("forwarder already stopped: {e:#}");
    }

    if let Some(storage) = &storage {
        if let Err(e) = storage.flush().await {
            error!("final storage flush failed: {e:#}");
        }
        storage.shutdown().await;
    }

    result
}

fn coordinator_outcome(
    joined: Result<Result<(), CoordinatorError>, JoinError>,
) -> anyhow::Result<()> {
    match joined {
        Ok(Ok(())) => {
            info!("coordinator stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            error!("coordinator failed: {e}");
            Err(e.into())
        }
        Err(e) => Err(anyhow::anyhow!("coordinator task panicked: {e}")),
    }
}

/// Structured store first, so that queries are answered by it
#[instrument(skip_all)]
async fn build_backends(config: &Config) -> anyhow::Result<Vec<Box<dyn StorageBackend>>> {
    let mut backends: Vec<Box<dyn StorageBackend>> = vec![];

    match &config.storage {
        StorageConfig::None => {}
        StorageConfig::Memory => backends.push(Box::new(MemoryBackend::new())),
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => {
            use crop_surveillance::storage::sqlite::SqliteBackend;

            info!("storing summaries in {}", path.display());
            backends.push(Box::new(SqliteBackend::new(path).await?));
        }
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            anyhow::bail!("sqlite storage requested but the storage-sqlite feature is disabled");
        }
    }

    if let Some(log_store) = &config.log_store {
        info!("writing summary documents to {}", log_store.directory.display());
        backends.push(Box::new(LogBackend::new(&log_store.directory).await?));
    }

    Ok(backends)
}
