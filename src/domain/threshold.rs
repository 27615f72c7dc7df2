// Caution/warning thresholds and severity classification
use crate::domain::series::SeriesKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved pseudo-series id for a group-wide threshold. A per-series spec
/// always wins over it.
pub const GROUP_LEVEL_KEY: &str = "__group__";

/// Caution and warning bounds, each independently optional. No ordering
/// between the two is enforced; classification works regardless of which is
/// numerically larger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    pub caution: Option<f64>,
    pub warning: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Caution,
    Warning,
}

/// Classify one value against one spec. Crossing is `value >= bound`
/// (higher-is-worse, boundary inclusive); warning is checked before caution;
/// an absent bound never triggers.
pub fn classify(value: f64, spec: &ThresholdSpec) -> Severity {
    if spec.warning.is_some_and(|w| value >= w) {
        return Severity::Warning;
    }
    if spec.caution.is_some_and(|c| value >= c) {
        return Severity::Caution;
    }
    Severity::Normal
}

/// All configured thresholds, per series or per group under
/// [`GROUP_LEVEL_KEY`]. Entries persist until explicitly replaced.
#[derive(Debug, Clone, Default)]
pub struct ThresholdBook {
    by_group: HashMap<String, HashMap<String, ThresholdSpec>>,
}

impl ThresholdBook {
    /// Set (or replace) the spec for one series, or for the whole group when
    /// `series_id` is [`GROUP_LEVEL_KEY`].
    pub fn set(&mut self, group_id: &str, series_id: &str, spec: ThresholdSpec) {
        self.by_group
            .entry(group_id.to_string())
            .or_default()
            .insert(series_id.to_string(), spec);
    }

    /// Effective spec for a series: its own entry, else the group-level one.
    pub fn lookup(&self, key: &SeriesKey) -> Option<ThresholdSpec> {
        let group = self.by_group.get(&key.group_id)?;
        group
            .get(&key.series_id)
            .or_else(|| group.get(GROUP_LEVEL_KEY))
            .copied()
    }

    /// Classify `value` for the series, `Normal` when nothing is configured.
    pub fn classify(&self, key: &SeriesKey, value: f64) -> Severity {
        match self.lookup(key) {
            Some(spec) => classify(value, &spec),
            None => Severity::Normal,
        }
    }
}
