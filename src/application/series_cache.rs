// Raw series cache - full-history snapshots per group, swapped atomically
use crate::application::telemetry_repository::{ArchiveRow, TelemetryRepository};
use crate::domain::error::EngineError;
use crate::domain::series::RawSeries;
use crate::infrastructure::config::{GroupConfig, GroupsConfig};
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Holds the most recently loaded full-history series per group.
///
/// A reload builds the new snapshot in a local value and only then swaps it
/// into the map, so a computation holding a snapshot `Arc` never observes a
/// partial update. On repository failure the previous snapshot stays put:
/// stale-but-available beats empty.
pub struct SeriesCache {
    repository: Arc<dyn TelemetryRepository>,
    config: Arc<GroupsConfig>,
    snapshots: RwLock<HashMap<String, Arc<RawSeries>>>,
    in_flight: Mutex<HashSet<String>>,
}

impl SeriesCache {
    pub fn new(repository: Arc<dyn TelemetryRepository>, config: Arc<GroupsConfig>) -> Self {
        Self {
            repository,
            config,
            snapshots: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Current snapshot for a group, if one has ever been loaded.
    pub async fn get(&self, group_id: &str) -> Option<Arc<RawSeries>> {
        self.snapshots.read().await.get(group_id).cloned()
    }

    /// Reload one group from the archive. Returns `Ok(false)` when a reload
    /// for the same group is already in flight (the trigger is dropped, not
    /// queued; reloads are idempotent).
    pub async fn reload(&self, group_id: &str) -> Result<bool, EngineError> {
        let group = self
            .config
            .group(group_id)
            .ok_or_else(|| EngineError::unknown_group(group_id))?;

        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(group_id.to_string()) {
                tracing::debug!("reload already in flight for {group_id}, skipping");
                return Ok(false);
            }
        }

        let result = self.fetch_snapshot(group).await;
        self.in_flight.lock().await.remove(group_id);

        let series = result?;
        tracing::debug!("loaded {} rows for group {group_id}", series.len());
        self.snapshots
            .write()
            .await
            .insert(group_id.to_string(), Arc::new(series));
        Ok(true)
    }

    async fn fetch_snapshot(&self, group: &GroupConfig) -> Result<RawSeries, EngineError> {
        let rows = self
            .repository
            .query_group(group)
            .await
            .map_err(EngineError::DataAccess)?;
        Ok(build_raw_series(group, rows))
    }
}

/// Turn archive rows into a group snapshot. Rows with an unparseable
/// timestamp are skipped; everything else keeps its timestamp slot, with
/// non-numeric cells as `None`.
fn build_raw_series(group: &GroupConfig, rows: Vec<ArchiveRow>) -> RawSeries {
    let mut parsed: Vec<(NaiveDateTime, ArchiveRow)> = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for row in rows {
        match parse_timestamp(&row.timestamp) {
            Some(t) => parsed.push((t, row)),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::warn!(
            "group {}: dropped {dropped} rows with unparseable timestamps",
            group.id
        );
    }
    // The archive orders rows oldest-first already; hold the invariant here
    // regardless of what the source returned.
    parsed.sort_by_key(|(t, _)| *t);

    let mut series = RawSeries {
        timestamps: Vec::with_capacity(parsed.len()),
        columns: group
            .series
            .iter()
            .map(|s| (s.id.clone(), Vec::with_capacity(parsed.len())))
            .collect(),
    };

    for (timestamp, row) in parsed {
        series.timestamps.push(timestamp);
        for cfg in &group.series {
            let value = row.fields.get(&cfg.column).copied().flatten();
            if let Some(column) = series.columns.get_mut(&cfg.id) {
                column.push(value.filter(|v| v.is_finite()));
            }
        }
    }

    series
}

/// The archive stores `%Y-%m-%d %H:%M:%S` text timestamps; newer writers use
/// RFC 3339. Accept both.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|t| t.naive_utc())
        })
}
