// Bounded selection of plotted groups and series
use crate::domain::series::SeriesKey;

/// Which groups, and which series within each group, are currently plotted.
///
/// Groups keep their activation order and each group's series keep insertion
/// order with FIFO eviction at the cap; `active_series` flattens in exactly
/// that order, which is the stable-layout contract the renderer depends on.
#[derive(Debug, Clone)]
pub struct SelectionSet {
    cap: usize,
    groups: Vec<GroupSelection>,
}

#[derive(Debug, Clone)]
struct GroupSelection {
    group_id: String,
    series: Vec<String>,
}

impl SelectionSet {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            groups: Vec::new(),
        }
    }

    pub fn is_active(&self, group_id: &str) -> bool {
        self.groups.iter().any(|g| g.group_id == group_id)
    }

    /// Activate a group (with an empty series list) or deactivate it,
    /// discarding its series selection.
    pub fn toggle_group(&mut self, group_id: &str) {
        if let Some(pos) = self.groups.iter().position(|g| g.group_id == group_id) {
            self.groups.remove(pos);
        } else {
            self.groups.push(GroupSelection {
                group_id: group_id.to_string(),
                series: Vec::new(),
            });
        }
    }

    /// Remove the series if selected, else append it, evicting the oldest
    /// entry when the group already holds `cap` series. Selecting a series
    /// in an inactive group activates the group.
    pub fn toggle_series(&mut self, group_id: &str, series_id: &str) {
        let pos = match self.groups.iter().position(|g| g.group_id == group_id) {
            Some(pos) => pos,
            None => {
                self.groups.push(GroupSelection {
                    group_id: group_id.to_string(),
                    series: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[pos];

        if let Some(pos) = group.series.iter().position(|s| s == series_id) {
            group.series.remove(pos);
            return;
        }
        if group.series.len() >= self.cap {
            group.series.remove(0);
        }
        group.series.push(series_id.to_string());
    }

    pub fn active_groups(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.group_id.clone()).collect()
    }

    /// All selected (group, series) pairs in group-then-insertion order.
    pub fn active_series(&self) -> Vec<SeriesKey> {
        self.groups
            .iter()
            .flat_map(|g| {
                g.series
                    .iter()
                    .map(|s| SeriesKey::new(g.group_id.clone(), s.clone()))
            })
            .collect()
    }
}
