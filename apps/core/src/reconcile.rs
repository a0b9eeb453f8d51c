use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::model::{host_from_url, TabRecord};
use crate::tab_store::TabCollection;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tab inspection failed: {message}")]
pub struct InspectError {
    message: String,
}

impl InspectError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageProperties {
    pub title: String,
    pub url: String,
}

/// Browser-provided tab inspection. Handles are opaque to the core; each
/// metadata call may block on the browser.
pub trait TabInspector: Sync {
    type Window;
    type Tab: Sync;
    type Page;

    fn all_tabs(&self, window: &Self::Window) -> Result<Vec<Self::Tab>, InspectError>;
    fn tab_id(&self, tab: &Self::Tab) -> i64;
    fn active_page(&self, tab: &Self::Tab) -> Option<Self::Page>;
    fn properties(&self, page: &Self::Page) -> PageProperties;
}

/// Fetches title and host for every tab concurrently.
///
/// Each fetch writes into the slot matching its input position, so the
/// output order is the input order regardless of completion order. A tab
/// without an active page keeps an empty title and host.
pub fn fetch_live_tabs<I: TabInspector>(inspector: &I, tabs: &[I::Tab]) -> Vec<TabRecord> {
    let mut slots: Vec<Option<TabRecord>> = vec![None; tabs.len()];
    slots
        .par_iter_mut()
        .zip(tabs.par_iter())
        .for_each(|(slot, tab)| {
            let id = inspector.tab_id(tab);
            let properties = inspector
                .active_page(tab)
                .map(|page| inspector.properties(&page))
                .unwrap_or_default();
            *slot = Some(TabRecord::new(id, &properties.title, &host_from_url(&properties.url)));
        });

    slots.into_iter().flatten().collect()
}

/// Reconciles the previously known list against the live tab set.
///
/// Surviving tabs keep their prior position with refreshed metadata, tabs
/// gone from `live` are dropped, and new tabs are appended in live order.
pub fn reconcile(previous: &TabCollection, live: &[TabRecord]) -> TabCollection {
    let live_by_id: HashMap<i64, &TabRecord> = live.iter().map(|tab| (tab.id, tab)).collect();

    let mut reconciled = TabCollection::new();
    for known in previous {
        if let Some(fresh) = live_by_id.get(&known.id) {
            reconciled.append((*fresh).clone());
        }
    }

    let known_ids: HashSet<i64> = previous.iter().map(|tab| tab.id).collect();
    for fresh in live {
        if !known_ids.contains(&fresh.id) {
            reconciled.append(fresh.clone());
        }
    }

    reconciled
}

pub fn reconcile_window<I: TabInspector>(
    inspector: &I,
    window: &I::Window,
    previous: &TabCollection,
) -> Result<TabCollection, InspectError> {
    let handles = inspector.all_tabs(window)?;
    let live = fetch_live_tabs(inspector, &handles);
    let reconciled = reconcile(previous, &live);
    tracing::debug!(
        live = live.len(),
        previous = previous.len(),
        reconciled = reconciled.len(),
        "reconciled window tabs"
    );
    Ok(reconciled)
}
