// Engine error taxonomy
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A single row could not be parsed. Always recovered locally by
    /// skipping the row; surfaces only in logs.
    #[error("failed to parse row: {0}")]
    Parse(String),

    /// The backing archive was unreachable or returned garbage. The caller
    /// keeps whatever snapshot it already has.
    #[error("data access failed: {0}")]
    DataAccess(anyhow::Error),

    /// Unusable explicit window: no range supplied, or start after end.
    #[error("invalid time range: {0}")]
    InvalidRange(String),

    /// Reference to a group or series that is not in the configuration.
    /// The triggering operation is a no-op.
    #[error("configuration mismatch: {0}")]
    Config(String),
}

impl EngineError {
    pub fn unknown_group(group_id: &str) -> Self {
        Self::Config(format!("unknown group '{group_id}'"))
    }

    pub fn unknown_series(group_id: &str, series_id: &str) -> Self {
        Self::Config(format!("unknown series '{series_id}' in group '{group_id}'"))
    }
}
