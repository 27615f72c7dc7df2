// Periodic reload of active groups and alarm re-evaluation
use crate::application::engine::TelemetryEngine;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to the background refresh task. Dropping the handle does not stop
/// the task; call [`RefreshScheduler::shutdown`].
pub struct RefreshScheduler {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// Spawn the refresh loop: every `period`, reload all active groups and
    /// re-run alarm evaluation on the fresh snapshots.
    pub fn spawn(engine: Arc<TelemetryEngine>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The immediate first tick warms the cache for anything selected
            // before the server came up.
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let reloaded = engine.refresh_active().await;
                        if reloaded > 0 {
                            tracing::debug!("refreshed {reloaded} groups");
                        }
                        let events = engine.observe_alarms(Local::now().naive_local()).await;
                        if !events.is_empty() {
                            tracing::info!("{} alarm notification(s) emitted", events.len());
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("refresh scheduler stopping");
                        break;
                    }
                }
            }
        });

        Self { shutdown_tx, handle }
    }

    /// Stop scheduling further reloads. An in-flight reload completes and
    /// swaps its result in; it is never cancelled midway.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::series_cache::SeriesCache;
    use crate::application::telemetry_repository::{ArchiveRow, TelemetryRepository};
    use crate::infrastructure::config::{GroupConfig, GroupsConfig, SeriesConfig};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRepository {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TelemetryRepository for CountingRepository {
        async fn query_group(&self, _group: &GroupConfig) -> anyhow::Result<Vec<ArchiveRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ArchiveRow {
                timestamp: "2024-01-02 10:00:00".to_string(),
                fields: HashMap::from([("NormalTemp_RF".to_string(), Some(21.0))]),
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_reloads_active_groups_until_shutdown() {
        let config = Arc::new(GroupsConfig {
            selection_cap: 4,
            refresh_secs: 30,
            alarm_cooldown_secs: 60,
            groups: vec![GroupConfig {
                id: "rx_2ghz".to_string(),
                title: "2GHz Receiver".to_string(),
                table: Some("frontend_2ghz".to_string()),
                series: vec![SeriesConfig {
                    id: "normal_temp_rf".to_string(),
                    name: "Normal Temperature RF".to_string(),
                    column: "NormalTemp_RF".to_string(),
                }],
            }],
        });
        let repo = Arc::new(CountingRepository {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(SeriesCache::new(repo.clone(), config.clone()));
        let engine = Arc::new(TelemetryEngine::new(config, cache));

        engine.toggle_group("rx_2ghz").await.unwrap();
        let after_toggle = repo.calls.load(Ordering::SeqCst);

        let scheduler = RefreshScheduler::spawn(engine.clone(), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(95)).await;
        scheduler.shutdown().await;

        let ticked = repo.calls.load(Ordering::SeqCst) - after_toggle;
        // Immediate tick plus three 30s periods inside 95s.
        assert!(ticked >= 3, "expected at least 3 reloads, got {ticked}");

        let calls_at_shutdown = repo.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(repo.calls.load(Ordering::SeqCst), calls_at_shutdown);
    }
}
