// HTTP archive repository implementation
use crate::application::telemetry_repository::{ArchiveRow, TelemetryRepository};
use crate::infrastructure::config::GroupConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// Talks to the station archive's query endpoint. One backing table per
/// group; the engine never issues anything but a full-history select, row
/// filtering and bucketing happen in-process.
#[derive(Debug, Clone)]
pub struct HttpArchiveRepository {
    host: String,
    token: String,
    database: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ArchiveQueryResponse {
    results: Vec<ArchiveQueryResult>,
}

#[derive(Debug, Deserialize)]
struct ArchiveQueryResult {
    #[serde(default)]
    series: Option<Vec<ArchiveSeriesPayload>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArchiveSeriesPayload {
    columns: Vec<String>,
    values: Vec<Vec<serde_json::Value>>,
}

impl HttpArchiveRepository {
    pub fn new(host: String, token: String, database: String) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            token,
            database,
            client: reqwest::Client::new(),
        }
    }

    fn build_query_url(&self, query: &str) -> String {
        let encoded_query = urlencoding::encode(query);
        format!(
            "{}/query?db={}&q={}",
            self.host, self.database, encoded_query
        )
    }

    async fn execute_query(&self, query: &str) -> Result<ArchiveQueryResponse> {
        let url = self.build_query_url(query);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to archive")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("archive query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<ArchiveQueryResponse>()
            .await
            .context("Failed to parse archive response")?;

        if let Some(result) = data.results.first() {
            if let Some(error) = &result.error {
                anyhow::bail!("archive query error: {}", error);
            }
        }

        Ok(data)
    }
}

#[async_trait]
impl TelemetryRepository for HttpArchiveRepository {
    async fn query_group(&self, group: &GroupConfig) -> Result<Vec<ArchiveRow>> {
        let Some(table) = &group.table else {
            return Ok(Vec::new());
        };

        let query = format!("SELECT * FROM {table} ORDER BY datetime ASC");
        tracing::debug!("executing archive query: {query}");
        let response = self.execute_query(&query).await?;

        let mut rows = Vec::new();
        if let Some(result) = response.results.first() {
            if let Some(series) = &result.series {
                for payload in series {
                    rows.extend(payload_to_rows(payload));
                }
            }
        }

        tracing::debug!("archive returned {} rows for {}", rows.len(), group.id);
        Ok(rows)
    }
}

/// Flatten one series payload into rows. The timestamp column is `datetime`
/// (legacy tables) or `time`; every other column becomes a named field, with
/// non-numeric cells kept as `None` so the timestamp slot survives.
fn payload_to_rows(payload: &ArchiveSeriesPayload) -> Vec<ArchiveRow> {
    let time_idx = payload
        .columns
        .iter()
        .position(|c| c == "datetime" || c == "time")
        .unwrap_or(0);

    let mut rows = Vec::with_capacity(payload.values.len());
    for value_row in &payload.values {
        let Some(timestamp) = value_row.get(time_idx).and_then(|v| v.as_str()) else {
            continue;
        };

        let mut fields = HashMap::new();
        for (idx, column) in payload.columns.iter().enumerate() {
            if idx == time_idx {
                continue;
            }
            let value = value_row.get(idx).and_then(|v| v.as_f64());
            fields.insert(column.clone(), value);
        }

        rows.push(ArchiveRow {
            timestamp: timestamp.to_string(),
            fields,
        });
    }
    rows
}
