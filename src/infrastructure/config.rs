use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    pub archive: ArchiveSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveSettings {
    pub host: String,
    pub token: String,
    pub database: String,
}

/// Static group/series/column table plus engine tunables. Loaded once at
/// startup; there is no runtime schema discovery.
#[derive(Debug, Deserialize, Clone)]
pub struct GroupsConfig {
    /// Maximum number of simultaneously plotted series per group.
    #[serde(default = "default_selection_cap")]
    pub selection_cap: usize,
    /// Refresh scheduler period in seconds.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Alarm cooldown in seconds.
    #[serde(default = "default_alarm_cooldown_secs")]
    pub alarm_cooldown_secs: i64,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroupConfig {
    pub id: String,
    pub title: String,
    /// Backing table in the archive. A group without one is selectable but
    /// never contributes data.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeriesConfig {
    pub id: String,
    pub name: String,
    pub column: String,
}

fn default_selection_cap() -> usize {
    4
}

fn default_refresh_secs() -> u64 {
    30
}

fn default_alarm_cooldown_secs() -> i64 {
    60
}

impl GroupsConfig {
    pub fn group(&self, group_id: &str) -> Option<&GroupConfig> {
        self.groups.iter().find(|g| g.id == group_id)
    }
}

impl GroupConfig {
    pub fn series(&self, series_id: &str) -> Option<&SeriesConfig> {
        self.series.iter().find(|s| s.id == series_id)
    }
}

pub fn load_archive_config() -> anyhow::Result<ArchiveConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/archive"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_groups_config() -> anyhow::Result<GroupsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/groups"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
