// Series domain models
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;

/// Identifies one named signal within one instrument group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SeriesKey {
    pub group_id: String,
    pub series_id: String,
}

impl SeriesKey {
    pub fn new(group_id: impl Into<String>, series_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            series_id: series_id.into(),
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.group_id, self.series_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Full-history snapshot for one group: a shared timestamp axis plus one
/// value column per configured series. A `None` cell means the source row
/// held nothing numeric for that column; the timestamp slot itself stays.
///
/// Owned by the series cache and replaced wholesale on every reload, so a
/// computation holding an `Arc` to one always sees a consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct RawSeries {
    pub timestamps: Vec<NaiveDateTime>,
    pub columns: HashMap<String, Vec<Option<f64>>>,
}

impl RawSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Present, finite samples for one series, oldest first. Returns `None`
    /// for a series id this snapshot has no column for.
    pub fn samples(&self, series_id: &str) -> Option<Vec<Sample>> {
        let column = self.columns.get(series_id)?;
        Some(
            self.timestamps
                .iter()
                .zip(column.iter())
                .filter_map(|(t, v)| match v {
                    Some(value) if value.is_finite() => Some(Sample::new(*t, *value)),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Most recent present value for one series, if any.
    pub fn latest(&self, series_id: &str) -> Option<Sample> {
        let column = self.columns.get(series_id)?;
        self.timestamps
            .iter()
            .zip(column.iter())
            .rev()
            .find_map(|(t, v)| match v {
                Some(value) if value.is_finite() => Some(Sample::new(*t, *value)),
                _ => None,
            })
    }
}
