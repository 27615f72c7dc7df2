// Alarm state machine - one notification per entry into Active
use crate::domain::threshold::Severity;
use chrono::{Duration, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Idle,
    Active,
    Cooldown,
}

/// Debounces warning notifications for one series. A signal oscillating
/// around the warning bound notifies once per entry into `Active`, not once
/// per sample; the cooldown keeps the machine armed for a recurrence.
///
/// Orthogonal to classification: nothing here alters displayed values or
/// statistics.
#[derive(Debug, Clone)]
pub struct AlarmStateMachine {
    state: AlarmState,
    cooldown: Duration,
    cooldown_started: Option<NaiveDateTime>,
}

impl AlarmStateMachine {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: AlarmState::Idle,
            cooldown,
            cooldown_started: None,
        }
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    /// Feed one classification observed at `at`. Returns `true` exactly when
    /// a notification must be emitted, which is every transition into
    /// `Active` and nothing else.
    pub fn observe(&mut self, severity: Severity, at: NaiveDateTime) -> bool {
        match self.state {
            AlarmState::Idle => {
                if severity == Severity::Warning {
                    self.state = AlarmState::Active;
                    return true;
                }
                false
            }
            AlarmState::Active => {
                if severity != Severity::Warning {
                    self.state = AlarmState::Cooldown;
                    self.cooldown_started = Some(at);
                }
                false
            }
            AlarmState::Cooldown => {
                if severity == Severity::Warning {
                    self.state = AlarmState::Active;
                    self.cooldown_started = None;
                    return true;
                }
                let elapsed = self
                    .cooldown_started
                    .is_none_or(|started| at - started >= self.cooldown);
                if elapsed {
                    self.state = AlarmState::Idle;
                    self.cooldown_started = None;
                }
                false
            }
        }
    }
}
