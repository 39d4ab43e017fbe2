//! Periodic polling of the upstream report endpoint.
//!
//! Each tick fetches the report, turns it into a raw batch and hands it to
//! the ingestor. A failed tick is logged and counted; the next tick simply
//! tries again.

use crate::core::{PollerConfig, ReportError, Result};
use crate::ingest::{IgnoreList, IngestReport, Ingestor, RawBatch};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Counters describing poller activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollStatsSnapshot {
    /// Ticks attempted
    pub ticks: u64,
    /// Ticks that stored their batch
    pub successes: u64,
    /// Ticks that failed to fetch or store
    pub failures: u64,
    /// Samples appended over all ticks
    pub samples_stored: u64,
    /// Message of the most recent failure
    pub last_error: Option<String>,
    /// Unix milliseconds of the most recent success
    pub last_success_ms: Option<i64>,
}

/// Shared, lock-protected poller counters.
#[derive(Debug, Default)]
pub struct PollStats {
    inner: RwLock<PollStatsSnapshot>,
}

impl PollStats {
    /// Copy of the current counters
    pub fn snapshot(&self) -> PollStatsSnapshot {
        self.inner.read().clone()
    }

    fn record_success(&self, report: IngestReport) {
        let mut stats = self.inner.write();
        stats.ticks += 1;
        stats.successes += 1;
        stats.samples_stored += report.accepted as u64;
        stats.last_success_ms = Some(chrono::Utc::now().timestamp_millis());
    }

    fn record_failure(&self, error: &ReportError) {
        let mut stats = self.inner.write();
        stats.ticks += 1;
        stats.failures += 1;
        stats.last_error = Some(error.to_string());
    }
}

/// Fetches reports on a fixed interval and ingests them.
pub struct Poller {
    client: reqwest::Client,
    url: String,
    interval: Duration,
    ingestor: Ingestor,
    ignore: Arc<IgnoreList>,
    stats: Arc<PollStats>,
}

impl Poller {
    /// Create a poller for `url`.
    pub fn new(
        url: impl Into<String>,
        config: &PollerConfig,
        ingestor: Ingestor,
        ignore: Arc<IgnoreList>,
    ) -> Result<Self> {
        if config.interval.is_zero() {
            return Err(ReportError::config("poll interval must be greater than zero"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            interval: config.interval,
            ingestor,
            ignore,
            stats: Arc::new(PollStats::default()),
        })
    }

    /// Share counters with another component, such as the health endpoint.
    pub fn with_stats(mut self, stats: Arc<PollStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Poller counters
    pub fn stats(&self) -> &Arc<PollStats> {
        &self.stats
    }

    /// Fetch one report and ingest it.
    pub async fn poll_once(&self) -> Result<IngestReport> {
        let report: serde_json::Value = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let batch = RawBatch::from_report(&report);
        let ingestor = self.ingestor.clone();
        let ignore = Arc::clone(&self.ignore);

        tokio::task::spawn_blocking(move || ingestor.ingest(&batch, |name| ignore.contains(name)))
            .await?
    }

    /// Poll every interval until `shutdown` flips to true.
    ///
    /// The first poll happens one interval after start.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Polling {} every {:?}", self.url, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Poller stopping");
                        break;
                    }
                }
            }
        }
    }

    async fn tick(&self) {
        match self.poll_once().await {
            Ok(report) => {
                tracing::debug!(
                    "Poll stored {} samples ({} ignored)",
                    report.accepted,
                    report.ignored
                );
                self.stats.record_success(report);
            },
            Err(e) => {
                if e.is_recoverable() {
                    tracing::warn!("Poll of {} failed, retrying next tick: {}", self.url, e);
                } else {
                    tracing::error!("Poll of {} failed [{}]: {}", self.url, e.category(), e);
                }
                self.stats.record_failure(&e);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{RedbSeriesStore, SeriesStore, SharedStore};
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(20),
            request_timeout: Duration::from_secs(2),
            ..PollerConfig::default()
        }
    }

    fn setup(url: String, ignore: IgnoreList) -> (TempDir, SharedStore, Poller) {
        let dir = TempDir::new().unwrap();
        let store: SharedStore = Arc::new(RedbSeriesStore::open(dir.path().join("report.db")).unwrap());
        let poller = Poller::new(
            url,
            &fast_config(),
            Ingestor::new(Arc::clone(&store)),
            Arc::new(ignore),
        )
        .unwrap();
        (dir, store, poller)
    }

    #[test]
    fn test_zero_interval_rejected() {
        let dir = TempDir::new().unwrap();
        let store: SharedStore = Arc::new(RedbSeriesStore::open(dir.path().join("report.db")).unwrap());
        let config = PollerConfig {
            interval: Duration::ZERO,
            ..fast_config()
        };

        let result = Poller::new(
            "http://127.0.0.1:1/report",
            &config,
            Ingestor::new(store),
            Arc::new(IgnoreList::default()),
        );
        assert!(matches!(result, Err(ReportError::Config(_))));
    }

    #[tokio::test]
    async fn test_poll_once_stores_samples() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/report"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "http": {"used": [
                    {"name": "/api/users", "avg": 12, "count": 4},
                    {"name": "/health", "avg": 1}
                ]}
            })))
            .mount(&server)
            .await;

        let ignore: IgnoreList = vec!["/health".to_string()].into_iter().collect();
        let (_dir, store, poller) = setup(format!("{}/report", server.uri()), ignore);

        let report = poller.poll_once().await.unwrap();
        assert_eq!(report, IngestReport { accepted: 1, ignored: 1 });

        let series = store.get("/api/users").unwrap();
        assert_eq!(series.values(), vec![12]);
        assert!(store.get("/health").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_report_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"http": {"used": []}})))
            .mount(&server)
            .await;

        let (_dir, _store, poller) = setup(server.uri(), IgnoreList::new());
        assert!(matches!(poller.poll_once().await, Err(ReportError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (_dir, _store, poller) = setup(server.uri(), IgnoreList::new());
        assert!(matches!(poller.poll_once().await, Err(ReportError::Network(_))));
    }

    #[tokio::test]
    async fn test_run_keeps_polling_after_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "http": {"used": [{"name": "svc-a", "avg": 5}]}
            })))
            .mount(&server)
            .await;

        let (_dir, store, poller) = setup(server.uri(), IgnoreList::new());
        let stats = Arc::clone(poller.stats());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(poller.run(rx));
        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        let snapshot = stats.snapshot();
        assert!(snapshot.failures >= 1);
        assert!(snapshot.successes >= 1);
        assert!(snapshot.last_error.is_some());
        assert!(!store.get("svc-a").unwrap().is_empty());
    }
}
