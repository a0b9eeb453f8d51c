use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{host_from_url, TabRecord};

/// Ordered tab records of one window, unique by `id`.
///
/// The order is "least recently updated first": every insert goes through
/// [`TabCollection::append`], which moves an existing id to the end.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabCollection {
    tabs: Vec<TabRecord>,
}

/// Raw lifecycle events reported by the browser extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    Opened { id: i64, title: String, url: String },
    Navigated { id: i64, title: String, url: String },
    Activated { id: i64 },
    /// Carries the page the tab last showed so it can enter history.
    Closed { id: i64, title: String, url: String },
}

impl TabCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = TabRecord>) -> Self {
        let mut collection = Self::new();
        for record in records {
            collection.append(record);
        }
        collection
    }

    /// Appends `record`, removing any prior entry with the same id first.
    pub fn append(&mut self, record: TabRecord) {
        self.tabs.retain(|tab| tab.id != record.id);
        self.tabs.push(record);
    }

    pub fn remove(&mut self, id: i64) -> Option<TabRecord> {
        let position = self.tabs.iter().position(|tab| tab.id == id)?;
        Some(self.tabs.remove(position))
    }

    pub fn get(&self, id: i64) -> Option<&TabRecord> {
        self.tabs.iter().find(|tab| tab.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.tabs.iter().map(|tab| tab.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TabRecord> {
        self.tabs.iter()
    }

    pub fn as_slice(&self) -> &[TabRecord] {
        &self.tabs
    }

    /// Applies one lifecycle event. Returns the removed record for `Closed`.
    ///
    /// `Activated` on an unknown id is ignored; it carries no metadata to
    /// build a record from.
    pub fn apply_event(&mut self, event: &TabEvent) -> Option<TabRecord> {
        match event {
            TabEvent::Opened { id, title, url } | TabEvent::Navigated { id, title, url } => {
                self.append(TabRecord::new(*id, title, &host_from_url(url)));
                None
            }
            TabEvent::Activated { id } => {
                if let Some(existing) = self.remove(*id) {
                    self.tabs.push(existing);
                }
                None
            }
            TabEvent::Closed { id, .. } => self.remove(*id),
        }
    }
}

impl<'a> IntoIterator for &'a TabCollection {
    type Item = &'a TabRecord;
    type IntoIter = std::slice::Iter<'a, TabRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.tabs.iter()
    }
}

/// Identity string for a window: titles concatenated in descending id order.
///
/// Distinct windows whose tabs share the same titles and id ordering collide;
/// snapshot dedup relies on this exact derivation.
pub fn combined_id(tabs: &TabCollection) -> String {
    let mut ordered: Vec<&TabRecord> = tabs.iter().collect();
    ordered.sort_by(|a, b| b.id.cmp(&a.id));
    ordered.iter().map(|tab| tab.title.as_str()).collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub tabs: TabCollection,
    #[serde(rename = "combinedID")]
    pub combined_id: String,
}

impl WindowSnapshot {
    pub fn capture(tabs: TabCollection) -> Self {
        let combined_id = combined_id(&tabs);
        Self { tabs, combined_id }
    }
}

/// Snapshots of every known window, unique by `combined_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct WindowsCollection {
    windows: Vec<WindowSnapshot>,
}

impl WindowsCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(windows: Vec<WindowSnapshot>) -> Self {
        Self { windows }
    }

    /// Appends a snapshot and drops older snapshots with the same identity.
    pub fn push(&mut self, snapshot: WindowSnapshot) {
        self.windows.push(snapshot);
        self.dedup();
    }

    /// Pushes `snapshot` as the new state of the window last recorded as
    /// `previous`, dropping that older snapshot even when the identity
    /// changed.
    pub fn replace(&mut self, previous: Option<&str>, snapshot: WindowSnapshot) {
        if let Some(previous) = previous {
            self.windows.retain(|existing| existing.combined_id != previous);
        }
        self.push(snapshot);
    }

    /// Keeps only the last occurrence of each `combined_id`, in place.
    pub fn dedup(&mut self) {
        let mut seen = HashSet::new();
        let mut kept: Vec<WindowSnapshot> = Vec::with_capacity(self.windows.len());
        for snapshot in self.windows.drain(..).rev() {
            if seen.insert(snapshot.combined_id.clone()) {
                kept.push(snapshot);
            }
        }
        kept.reverse();
        self.windows = kept;
    }

    /// Drops snapshots that no longer match a live window.
    pub fn prune_to_live(&mut self, live_ids: &[String]) {
        self.windows
            .retain(|snapshot| live_ids.iter().any(|id| *id == snapshot.combined_id));
    }

    pub fn latest(&self) -> Option<&WindowSnapshot> {
        self.windows.last()
    }

    pub fn find(&self, combined_id: &str) -> Option<&WindowSnapshot> {
        self.windows
            .iter()
            .find(|snapshot| snapshot.combined_id == combined_id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WindowSnapshot> {
        self.windows.iter()
    }
}

pub fn encode_windows(windows: &WindowsCollection) -> Result<String, serde_json::Error> {
    serde_json::to_string(windows)
}

/// Decodes the persisted snapshot. Anything undecodable yields an empty
/// collection.
pub fn decode_windows(payload: &str) -> WindowsCollection {
    match serde_json::from_str::<WindowsCollection>(payload) {
        Ok(windows) => windows,
        Err(error) => {
            tracing::warn!(%error, "discarding undecodable windows snapshot");
            WindowsCollection::new()
        }
    }
}
