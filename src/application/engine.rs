// Telemetry engine - the context object behind the rendering interface
use crate::application::alarm_center::{AlarmCenter, AlarmEvent};
use crate::application::resampler::resample;
use crate::application::selection::SelectionSet;
use crate::application::series_cache::SeriesCache;
use crate::domain::error::EngineError;
use crate::domain::series::{Sample, SeriesKey};
use crate::domain::stats::{self, Stats};
use crate::domain::threshold::{Severity, ThresholdBook, ThresholdSpec, GROUP_LEVEL_KEY};
use crate::domain::window::{self, TimeWindow, WindowMode};
use chrono::{Duration, NaiveDateTime};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone, Copy)]
struct WindowState {
    mode: WindowMode,
    custom: Option<(NaiveDateTime, NaiveDateTime)>,
}

/// Everything the rendering collaborator talks to: selection, window,
/// thresholds and alarms over the raw-series cache. Holds no process-wide
/// state; tests build as many independent engines as they need.
pub struct TelemetryEngine {
    config: Arc<crate::infrastructure::config::GroupsConfig>,
    cache: Arc<SeriesCache>,
    selection: RwLock<SelectionSet>,
    window: RwLock<WindowState>,
    thresholds: RwLock<ThresholdBook>,
    alarms: Mutex<AlarmCenter>,
}

impl TelemetryEngine {
    pub fn new(
        config: Arc<crate::infrastructure::config::GroupsConfig>,
        cache: Arc<SeriesCache>,
    ) -> Self {
        let cooldown = Duration::seconds(config.alarm_cooldown_secs);
        Self {
            selection: RwLock::new(SelectionSet::new(config.selection_cap)),
            window: RwLock::new(WindowState {
                mode: WindowMode::H24,
                custom: None,
            }),
            thresholds: RwLock::new(ThresholdBook::default()),
            alarms: Mutex::new(AlarmCenter::new(cooldown)),
            config,
            cache,
        }
    }

    pub fn config(&self) -> &crate::infrastructure::config::GroupsConfig {
        &self.config
    }

    /// Activate or deactivate a group. First activation triggers an initial
    /// load; a failed load leaves the group active with no data yet (the
    /// scheduler retries on its next tick).
    pub async fn toggle_group(&self, group_id: &str) -> Result<(), EngineError> {
        if self.config.group(group_id).is_none() {
            return Err(EngineError::unknown_group(group_id));
        }
        let newly_active = {
            let mut selection = self.selection.write().await;
            selection.toggle_group(group_id);
            selection.is_active(group_id)
        };
        if newly_active {
            self.ensure_loaded(group_id).await;
        }
        Ok(())
    }

    /// Select or deselect one series; selecting into a full group evicts the
    /// oldest selection. Unknown group/series leaves everything untouched.
    pub async fn toggle_series(&self, group_id: &str, series_id: &str) -> Result<(), EngineError> {
        let group = self
            .config
            .group(group_id)
            .ok_or_else(|| EngineError::unknown_group(group_id))?;
        if group.series(series_id).is_none() {
            return Err(EngineError::unknown_series(group_id, series_id));
        }
        self.selection.write().await.toggle_series(group_id, series_id);
        self.ensure_loaded(group_id).await;
        Ok(())
    }

    async fn ensure_loaded(&self, group_id: &str) {
        if self.cache.get(group_id).await.is_some() {
            return;
        }
        if let Err(e) = self.cache.reload(group_id).await {
            tracing::warn!("initial load for {group_id} failed: {e}");
        }
    }

    /// Replace the reporting window wholesale. An invalid custom range is
    /// rejected and the prior window stays in force.
    pub async fn set_window(
        &self,
        mode: WindowMode,
        custom: Option<(NaiveDateTime, NaiveDateTime)>,
        now: NaiveDateTime,
    ) -> Result<TimeWindow, EngineError> {
        let resolved = window::resolve(mode, now, custom)?;
        *self.window.write().await = WindowState {
            mode,
            custom: if mode == WindowMode::Custom { custom } else { None },
        };
        Ok(resolved)
    }

    pub async fn current_window(&self, now: NaiveDateTime) -> Result<TimeWindow, EngineError> {
        let state = *self.window.read().await;
        window::resolve(state.mode, now, state.custom)
    }

    /// All selected (group, series) pairs in group-then-insertion order,
    /// the layout contract the renderer depends on.
    pub async fn active_series(&self) -> Vec<SeriesKey> {
        self.selection.read().await.active_series()
    }

    /// Windowed, bucket-resampled points for one series under the current
    /// reporting window. An unloaded or table-less group yields no points;
    /// load *failures* surface at reload time, never as silent empties here.
    pub async fn plot_data(
        &self,
        key: &SeriesKey,
        now: NaiveDateTime,
    ) -> Result<Vec<Sample>, EngineError> {
        self.validate_key(key)?;
        let state = *self.window.read().await;
        let window = window::resolve(state.mode, now, state.custom)?;

        let Some(snapshot) = self.cache.get(&key.group_id).await else {
            return Ok(Vec::new());
        };
        let samples = snapshot.samples(&key.series_id).unwrap_or_default();
        Ok(resample(&samples, &window, state.mode))
    }

    /// Summary statistics over exactly the points `plot_data` would return.
    pub async fn summary(
        &self,
        key: &SeriesKey,
        now: NaiveDateTime,
    ) -> Result<Option<Stats>, EngineError> {
        let points = self.plot_data(key, now).await?;
        let values: Vec<f64> = points.iter().map(|s| s.value).collect();
        Ok(stats::summarize(&values))
    }

    /// Classify a value against the series' effective threshold spec.
    pub async fn classification(
        &self,
        key: &SeriesKey,
        value: f64,
    ) -> Result<Severity, EngineError> {
        self.validate_key(key)?;
        Ok(self.thresholds.read().await.classify(key, value))
    }

    /// Set the caution/warning bounds for a series, or for the whole group
    /// when `series_id` is the reserved group-level key.
    pub async fn set_threshold(
        &self,
        group_id: &str,
        series_id: &str,
        spec: ThresholdSpec,
    ) -> Result<(), EngineError> {
        let group = self
            .config
            .group(group_id)
            .ok_or_else(|| EngineError::unknown_group(group_id))?;
        if series_id != GROUP_LEVEL_KEY && group.series(series_id).is_none() {
            return Err(EngineError::unknown_series(group_id, series_id));
        }
        self.thresholds.write().await.set(group_id, series_id, spec);
        Ok(())
    }

    /// Reload every active group. Returns how many reloads actually ran
    /// (in-flight duplicates are dropped, failures logged and skipped).
    pub async fn refresh_active(&self) -> usize {
        let groups = self.selection.read().await.active_groups();
        let mut reloaded = 0;
        for group_id in groups {
            match self.cache.reload(&group_id).await {
                Ok(true) => reloaded += 1,
                Ok(false) => {}
                Err(e) => tracing::error!("reload failed for {group_id}: {e}"),
            }
        }
        reloaded
    }

    /// Classify the freshest reading of every selected series and drive the
    /// alarm machines. Emitted notifications land in the event feed and the
    /// log; displayed values and statistics are never touched.
    pub async fn observe_alarms(&self, now: NaiveDateTime) -> Vec<AlarmEvent> {
        let keys = self.selection.read().await.active_series();
        let thresholds = self.thresholds.read().await;
        let mut alarms = self.alarms.lock().await;

        let mut emitted = Vec::new();
        for key in keys {
            let Some(snapshot) = self.cache.get(&key.group_id).await else {
                continue;
            };
            let Some(latest) = snapshot.latest(&key.series_id) else {
                continue;
            };
            let severity = thresholds.classify(&key, latest.value);
            if let Some(event) = alarms.observe(&key, severity, latest.value, now) {
                tracing::warn!("alarm: {} crossed warning at {:.2}", event.key, event.value);
                emitted.push(event);
            }
        }
        emitted
    }

    pub async fn recent_events(&self) -> Vec<AlarmEvent> {
        self.alarms.lock().await.recent_events()
    }

    fn validate_key(&self, key: &SeriesKey) -> Result<(), EngineError> {
        let group = self
            .config
            .group(&key.group_id)
            .ok_or_else(|| EngineError::unknown_group(&key.group_id))?;
        if group.series(&key.series_id).is_none() {
            return Err(EngineError::unknown_series(&key.group_id, &key.series_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::telemetry_repository::{ArchiveRow, TelemetryRepository};
    use crate::infrastructure::config::{GroupConfig, GroupsConfig, SeriesConfig};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct FixedRepository {
        rows: Vec<ArchiveRow>,
    }

    #[async_trait]
    impl TelemetryRepository for FixedRepository {
        async fn query_group(&self, group: &GroupConfig) -> anyhow::Result<Vec<ArchiveRow>> {
            if group.table.is_none() {
                return Ok(Vec::new());
            }
            Ok(self.rows.clone())
        }
    }

    fn dt(h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn test_engine(rows: Vec<ArchiveRow>) -> TelemetryEngine {
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
        let cache = Arc::new(SeriesCache::new(
            Arc::new(FixedRepository { rows }),
            config.clone(),
        ));
        TelemetryEngine::new(config, cache)
    }

    fn rows_every_30s(from: NaiveDateTime, count: usize, value: f64) -> Vec<ArchiveRow> {
        (0..count)
            .map(|i| ArchiveRow {
                timestamp: (from + Duration::seconds(i as i64 * 30))
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
                fields: HashMap::from([("NormalTemp_RF".to_string(), Some(value))]),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_unknown_selection_is_a_noop() {
        let engine = test_engine(Vec::new());
        assert!(engine.toggle_group("bogus").await.is_err());
        assert!(engine.toggle_series("rx_2ghz", "bogus").await.is_err());
        assert!(engine.active_series().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_custom_range_keeps_prior_window() {
        let engine = test_engine(Vec::new());
        let now = dt(12, 0);

        engine
            .set_window(WindowMode::H6, None, now)
            .await
            .unwrap();
        let err = engine
            .set_window(WindowMode::Custom, Some((dt(13, 0), dt(11, 0))), now)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange(_)));

        let window = engine.current_window(now).await.unwrap();
        assert_eq!(window.start, dt(6, 0));
        assert_eq!(window.end, now);
    }

    #[tokio::test]
    async fn test_plot_summary_and_classification_end_to_end() {
        let now = dt(12, 0);
        let engine = test_engine(rows_every_30s(dt(9, 0), 240, 21.5));
        let key = SeriesKey::new("rx_2ghz", "normal_temp_rf");

        engine.toggle_series("rx_2ghz", "normal_temp_rf").await.unwrap();
        engine.set_window(WindowMode::H6, None, now).await.unwrap();

        // 6h mode uses one 6-hour bucket; data spans 09:00-11:59:30 so the
        // aligned bucket starts 06:00 and holds everything.
        let points = engine.plot_data(&key, now).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, dt(9, 0));

        let stats = engine.summary(&key, now).await.unwrap().unwrap();
        assert_eq!(stats.mean, 21.5);
        assert_eq!(stats.stability, 100.0);

        engine
            .set_threshold(
                "rx_2ghz",
                "normal_temp_rf",
                ThresholdSpec {
                    caution: Some(20.0),
                    warning: Some(25.0),
                },
            )
            .await
            .unwrap();
        assert_eq!(
            engine.classification(&key, 21.5).await.unwrap(),
            Severity::Caution
        );
    }

    #[tokio::test]
    async fn test_observe_alarms_notifies_once_while_active() {
        let now = dt(12, 0);
        let engine = test_engine(rows_every_30s(dt(11, 0), 10, 30.0));
        let key = SeriesKey::new("rx_2ghz", "normal_temp_rf");

        engine.toggle_series("rx_2ghz", "normal_temp_rf").await.unwrap();
        engine
            .set_threshold(
                "rx_2ghz",
                crate::domain::threshold::GROUP_LEVEL_KEY,
                ThresholdSpec {
                    caution: None,
                    warning: Some(25.0),
                },
            )
            .await
            .unwrap();

        let first = engine.observe_alarms(now).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].key, key);

        // Same warning on the next tick: machine already Active, no storm.
        let second = engine.observe_alarms(now + Duration::seconds(30)).await;
        assert!(second.is_empty());
        assert_eq!(engine.recent_events().await.len(), 1);
    }
}
