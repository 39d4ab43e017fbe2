//! Main application entry point for reportchart.

use crate::api;
use crate::core::{Config, ReportError, Result};
use crate::ingest::{IgnoreList, Ingestor};
use crate::poller::{PollStats, Poller};
use crate::storage::{RedbSeriesStore, SeriesStore, SharedStore};
use std::sync::Arc;
use tokio::sync::watch;

/// Main application struct that wires the store, poller and API together.
pub struct Application {
    /// Series store shared by ingestion and queries
    store: SharedStore,
    /// Ingestion front of the store
    ingestor: Ingestor,
    /// Names skipped during ingestion
    ignore: Arc<IgnoreList>,
    /// Poller counters reported by the health endpoint
    stats: Arc<PollStats>,
    /// Application configuration
    config: Config,
}

impl Application {
    /// Open the store and load the ignore list for `config`.
    pub fn new(config: Config) -> Result<Self> {
        let bucket = RedbSeriesStore::open(&config.storage.db_file)?;
        if config.storage.clear_on_start {
            bucket.clear()?;
        }
        let store: SharedStore = Arc::new(bucket);

        let ignore = Arc::new(IgnoreList::load(&config.ignore.file, config.ignore.required)?);

        Ok(Self {
            ingestor: Ingestor::new(Arc::clone(&store)),
            store,
            ignore,
            stats: Arc::new(PollStats::default()),
            config,
        })
    }

    /// Run the poller (unless view-only) and the API until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        tracing::info!("Starting reportchart");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let poller_handle = if self.config.poller.enabled {
            let url = self
                .config
                .poller
                .url
                .clone()
                .ok_or_else(|| ReportError::config("poller enabled without a report url"))?;
            let poller = Poller::new(
                url,
                &self.config.poller,
                self.ingestor.clone(),
                Arc::clone(&self.ignore),
            )?
            .with_stats(Arc::clone(&self.stats));
            Some(tokio::spawn(poller.run(shutdown_rx)))
        } else {
            tracing::info!("View-only mode, not polling");
            None
        };

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            tracing::info!("Received shutdown signal, stopping...");
        };

        let served = api::serve(
            Arc::clone(&self.store),
            Arc::clone(&self.stats),
            &self.config.server,
            shutdown,
        )
        .await;

        // The receiver may already be gone if the poller exited.
        let _ = shutdown_tx.send(true);
        if let Some(handle) = poller_handle {
            handle.await?;
        }

        served
    }

    /// Get a reference to the series store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Get a reference to the ingestor.
    pub fn ingestor(&self) -> &Ingestor {
        &self.ingestor
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
