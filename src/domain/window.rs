// Time windows and bucket grid alignment
use crate::domain::error::EngineError;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Reporting range selected by the caller. Named modes are anchored to "now"
/// at resolution time; `Custom` carries an explicit start/end pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowMode {
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "7d")]
    D7,
    /// Thirty days at native sample density, like an explicit range.
    #[serde(rename = "30d")]
    D30,
    #[serde(rename = "custom")]
    Custom,
}

impl WindowMode {
    /// Length of the named window; `None` for an explicit range.
    pub fn duration(self) -> Option<Duration> {
        match self {
            WindowMode::H1 => Some(Duration::hours(1)),
            WindowMode::H6 => Some(Duration::hours(6)),
            WindowMode::H24 => Some(Duration::hours(24)),
            WindowMode::D7 => Some(Duration::days(7)),
            WindowMode::D30 => Some(Duration::days(30)),
            WindowMode::Custom => None,
        }
    }

    /// Bucket width used when resampling this mode. `None` means no
    /// resampling: explicit ranges and the 30-day view plot every sample.
    pub fn bucket_interval(self) -> Option<Duration> {
        match self {
            WindowMode::H1 => Some(Duration::hours(1)),
            WindowMode::H6 => Some(Duration::hours(6)),
            WindowMode::H24 => Some(Duration::days(1)),
            WindowMode::D7 => Some(Duration::weeks(1)),
            WindowMode::D30 | WindowMode::Custom => None,
        }
    }

    /// Truncate `t` down to this mode's bucket grid. The grid is anchored to
    /// the calendar (top of hour, 6-hour blocks from midnight, midnight,
    /// Monday midnight), never to the data.
    pub fn align(self, t: NaiveDateTime) -> NaiveDateTime {
        // and_hms_opt cannot fail for an hour taken from a valid timestamp
        let midnight = t.date().and_hms_opt(0, 0, 0).unwrap_or(t);

        match self {
            WindowMode::H1 | WindowMode::D30 | WindowMode::Custom => {
                midnight + Duration::hours(i64::from(t.hour()))
            }
            WindowMode::H6 => midnight + Duration::hours(i64::from(t.hour() / 6) * 6),
            WindowMode::H24 => midnight,
            WindowMode::D7 => {
                midnight - Duration::days(i64::from(t.date().weekday().num_days_from_monday()))
            }
        }
    }
}

/// Absolute reporting range, inclusive at both ends when filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Turn a mode into an absolute window. Named modes end at `now`; `Custom`
/// passes the pair through unchanged after validating `start <= end`.
pub fn resolve(
    mode: WindowMode,
    now: NaiveDateTime,
    custom: Option<(NaiveDateTime, NaiveDateTime)>,
) -> Result<TimeWindow, EngineError> {
    match mode.duration() {
        Some(duration) => Ok(TimeWindow {
            start: now - duration,
            end: now,
        }),
        None => {
            let (start, end) = custom
                .ok_or_else(|| EngineError::InvalidRange("custom window has no range".into()))?;
            if start > end {
                return Err(EngineError::InvalidRange("start is after end".into()));
            }
            Ok(TimeWindow { start, end })
        }
    }
}
