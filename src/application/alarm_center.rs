// Per-series alarm bookkeeping and the recent-event feed
use crate::domain::alarm::AlarmStateMachine;
use crate::domain::series::SeriesKey;
use crate::domain::threshold::Severity;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

const EVENT_LOG_CAPACITY: usize = 100;

/// One emitted alarm notification, kept for the event feed.
#[derive(Debug, Clone, Serialize)]
pub struct AlarmEvent {
    pub key: SeriesKey,
    pub value: f64,
    pub at: NaiveDateTime,
}

/// Owns one state machine per series plus a bounded log of the
/// notifications they emitted, newest last.
pub struct AlarmCenter {
    cooldown: Duration,
    machines: HashMap<SeriesKey, AlarmStateMachine>,
    events: VecDeque<AlarmEvent>,
}

impl AlarmCenter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            machines: HashMap::new(),
            events: VecDeque::new(),
        }
    }

    /// Feed one classified reading. Returns the notification to emit, if the
    /// series' machine entered `Active` on this observation.
    pub fn observe(
        &mut self,
        key: &SeriesKey,
        severity: Severity,
        value: f64,
        at: NaiveDateTime,
    ) -> Option<AlarmEvent> {
        let machine = self
            .machines
            .entry(key.clone())
            .or_insert_with(|| AlarmStateMachine::new(self.cooldown));

        if !machine.observe(severity, at) {
            return None;
        }

        let event = AlarmEvent {
            key: key.clone(),
            value,
            at,
        };
        if self.events.len() == EVENT_LOG_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event.clone());
        Some(event)
    }

    /// Most recent notifications, newest last.
    pub fn recent_events(&self) -> Vec<AlarmEvent> {
        self.events.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            + Duration::seconds(secs)
    }

    #[test]
    fn test_independent_machines_per_series() {
        let mut center = AlarmCenter::new(Duration::seconds(60));
        let a = SeriesKey::new("rx_2ghz", "temp");
        let b = SeriesKey::new("rx_8ghz", "temp");

        assert!(center.observe(&a, Severity::Warning, 30.0, at(0)).is_some());
        // Same severity on another series notifies independently.
        assert!(center.observe(&b, Severity::Warning, 31.0, at(1)).is_some());
        // Series a is already Active: silent.
        assert!(center.observe(&a, Severity::Warning, 32.0, at(2)).is_none());

        assert_eq!(center.recent_events().len(), 2);
    }

    #[test]
    fn test_event_log_is_bounded() {
        let mut center = AlarmCenter::new(Duration::seconds(1));
        let key = SeriesKey::new("rx_2ghz", "temp");

        for i in 0..(EVENT_LOG_CAPACITY as i64 + 20) {
            // Warning then an expired cooldown so every warning re-notifies.
            center.observe(&key, Severity::Warning, 30.0, at(i * 10));
            center.observe(&key, Severity::Normal, 5.0, at(i * 10 + 3));
            center.observe(&key, Severity::Normal, 5.0, at(i * 10 + 6));
        }

        assert_eq!(center.recent_events().len(), EVENT_LOG_CAPACITY);
    }
}
