// Repository trait for archive data access
use crate::infrastructure::config::GroupConfig;
use async_trait::async_trait;
use std::collections::HashMap;

/// One archive row: a timestamp string plus the named numeric fields the
/// backing table exposes, keyed by column name. A missing or non-numeric
/// cell arrives as `None` rather than dropping the row.
#[derive(Debug, Clone, Default)]
pub struct ArchiveRow {
    pub timestamp: String,
    pub fields: HashMap<String, Option<f64>>,
}

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// Fetch the full history for one group's backing table, oldest first.
    /// A group without a backing table yields no rows.
    async fn query_group(&self, group: &GroupConfig) -> anyhow::Result<Vec<ArchiveRow>>;
}
