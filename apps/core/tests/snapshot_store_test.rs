use std::sync::Arc;
use std::thread;

use tabfinder_core::model::TabRecord;
use tabfinder_core::snapshot_store::{
    MemoryDefaults, SharedDefaults, SqliteDefaults, WindowStore, WINDOWS_KEY,
};
use tabfinder_core::tab_store::TabCollection;

fn window(records: &[(i64, &str)]) -> TabCollection {
    TabCollection::from_records(
        records
            .iter()
            .map(|(id, title)| TabRecord::new(*id, title, "example.com")),
    )
}

#[test]
fn empty_store_loads_empty_collection() {
    let store = WindowStore::in_memory();
    assert!(store.load().is_empty());
}

#[test]
fn record_window_returns_identity_and_persists() {
    let store = WindowStore::in_memory();
    let id = store.record_window(window(&[(1, "A"), (2, "B")])).unwrap();
    assert_eq!(id, "BA");

    let loaded = store.load();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.latest().unwrap().tabs.ids(), vec![1, 2]);
}

#[test]
fn re_recording_same_window_replaces_previous_snapshot() {
    let store = WindowStore::in_memory();
    store.record_window(window(&[(1, "A")])).unwrap();
    store.record_window(window(&[(2, "B")])).unwrap();
    store.record_window(window(&[(1, "A")])).unwrap();

    let ids: Vec<String> = store.load().iter().map(|w| w.combined_id.clone()).collect();
    assert_eq!(ids, vec!["B".to_string(), "A".to_string()]);
}

#[test]
fn prune_drops_windows_that_are_no_longer_live() {
    let store = WindowStore::in_memory();
    store.record_window(window(&[(1, "A")])).unwrap();
    store.record_window(window(&[(2, "B")])).unwrap();

    let remaining = store.prune_to_live(&["A".to_string()]).unwrap();
    assert_eq!(remaining, 1);
    assert!(store.load().find("B").is_none());
}

#[test]
fn corrupt_payload_is_treated_as_empty_and_overwritten() {
    let defaults = MemoryDefaults::new();
    defaults.set(WINDOWS_KEY, "not json at all").unwrap();
    let store = WindowStore::new(Box::new(defaults));

    assert!(store.load().is_empty());
    store.record_window(window(&[(1, "A")])).unwrap();
    assert_eq!(store.load().len(), 1);
}

#[test]
fn sqlite_defaults_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("shared.sqlite3");

    {
        let store = WindowStore::new(Box::new(SqliteDefaults::open_file(&path).unwrap()));
        store.record_window(window(&[(4, "Inbox")])).unwrap();
    }

    let reopened = WindowStore::new(Box::new(SqliteDefaults::open_file(&path).unwrap()));
    assert_eq!(reopened.load().latest().unwrap().combined_id, "Inbox");
}

#[test]
fn sqlite_defaults_upsert_values() {
    let defaults = SqliteDefaults::open_memory().unwrap();
    assert_eq!(defaults.get("k").unwrap(), None);
    defaults.set("k", "one").unwrap();
    defaults.set("k", "two").unwrap();
    assert_eq!(defaults.get("k").unwrap(), Some("two".to_string()));
}

#[test]
fn concurrent_writers_do_not_lose_updates() {
    let store = Arc::new(WindowStore::in_memory());

    let handles: Vec<_> = (0..8i64)
        .map(|n| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let title = format!("Window {n}");
                store.record_window(window(&[(n, title.as_str())])).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.load().len(), 8);
}
