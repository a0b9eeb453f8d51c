use std::sync::mpsc::Receiver;

use rusqlite::Connection;

use tabfinder_core::config::Config;
use tabfinder_core::contract::{Envelope, TabCommand};
use tabfinder_core::core_service::TabFinderService;
use tabfinder_core::history_store;
use tabfinder_core::overlay_state::{HotkeyAction, SessionAction};
use tabfinder_core::reconcile::{InspectError, PageProperties, TabInspector};
use tabfinder_core::search::{CandidateOrigin, SortMode};
use tabfinder_core::selection::NavigationKey;
use tabfinder_core::snapshot_store::WindowStore;
use tabfinder_core::tab_store::TabEvent;
use tabfinder_core::transport::ChannelDispatcher;

fn service_with(config: Config) -> (TabFinderService, Receiver<Envelope>) {
    let (dispatcher, receiver) = ChannelDispatcher::new();
    let history = history_store::open_memory().unwrap();
    let service = TabFinderService::new(
        config,
        WindowStore::in_memory(),
        Some(history),
        Box::new(dispatcher),
    )
    .unwrap();
    (service, receiver)
}

fn opened(id: i64, title: &str, url: &str) -> TabEvent {
    TabEvent::Opened {
        id,
        title: title.to_string(),
        url: url.to_string(),
    }
}

fn seeded_service() -> (TabFinderService, Receiver<Envelope>) {
    let (mut service, receiver) = service_with(Config::default());
    service
        .apply_tab_event(&opened(1, "Inbox", "https://mail.google.com/mail"))
        .unwrap();
    service
        .apply_tab_event(&opened(2, "Search", "https://google.com/"))
        .unwrap();
    service
        .apply_tab_event(&opened(3, "Pull Requests", "https://github.com/pulls"))
        .unwrap();
    (service, receiver)
}

fn received(receiver: &Receiver<Envelope>) -> Vec<TabCommand> {
    receiver
        .try_iter()
        .map(|envelope| TabCommand::try_from(envelope).unwrap())
        .collect()
}

#[test]
fn rejects_invalid_config() {
    let (dispatcher, _receiver) = ChannelDispatcher::new();
    let config = Config {
        max_closed_tabs: 0,
        ..Config::default()
    };
    let result = TabFinderService::new(config, WindowStore::in_memory(), None, Box::new(dispatcher));
    assert!(result.is_err());
}

#[test]
fn events_are_persisted_as_the_latest_window() {
    let (service, _receiver) = seeded_service();
    let windows = service.windows().load();
    assert_eq!(windows.latest().unwrap().tabs.ids(), vec![1, 2, 3]);
    assert_eq!(service.open_tabs().len(), 3);
}

#[test]
fn opening_the_panel_preselects_the_previous_tab() {
    let (mut service, receiver) = seeded_service();
    assert_eq!(service.on_hotkey(false).unwrap(), HotkeyAction::ShowAndFocus);

    let ids: Vec<i64> = service.candidates().iter().map(|c| c.record.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(service.session().selected_index(), 1);

    let action = service.handle_key(NavigationKey::Return).unwrap();
    assert!(matches!(action, SessionAction::Activate(ref c) if c.record.id == 2));
    assert_eq!(received(&receiver), vec![TabCommand::SwitchTabTo { id: 2 }]);
    assert!(!service.session().overlay().is_visible());
}

#[test]
fn browser_order_starts_at_the_top() {
    let config = Config {
        sort_mode: SortMode::BrowserOrder,
        ..Config::default()
    };
    let (mut service, _receiver) = service_with(config);
    service.apply_tab_event(&opened(1, "A", "https://a.test/")).unwrap();
    service.apply_tab_event(&opened(2, "B", "https://b.test/")).unwrap();
    service.show_panel().unwrap();

    let ids: Vec<i64> = service.candidates().iter().map(|c| c.record.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(service.session().selected_index(), 0);
}

#[test]
fn typing_ranks_and_navigation_wraps() {
    let (mut service, receiver) = seeded_service();
    service.show_panel().unwrap();

    let ids: Vec<i64> = service.set_query("goog").iter().map(|c| c.record.id).collect();
    assert_eq!(ids, vec![2, 1]);

    // The cursor kept index 1 from the empty-query preselect.
    assert_eq!(service.session().selected_index(), 1);
    service.handle_key(NavigationKey::ArrowUp).unwrap();
    assert_eq!(service.session().selected_index(), 0);
    service.handle_key(NavigationKey::ArrowUp).unwrap();
    assert_eq!(service.session().selected_index(), 1);
    service.handle_key(NavigationKey::Tab).unwrap();
    assert_eq!(service.session().selected_index(), 0);

    assert!(service.activate_selected().unwrap());
    assert_eq!(received(&receiver), vec![TabCommand::SwitchTabTo { id: 2 }]);
}

#[test]
fn return_with_no_results_does_nothing() {
    let (mut service, receiver) = seeded_service();
    service.show_panel().unwrap();
    assert!(service.set_query("zzzz").is_empty());

    assert_eq!(service.handle_key(NavigationKey::Return).unwrap(), SessionAction::None);
    assert!(received(&receiver).is_empty());
    assert!(!service.activate_selected().unwrap());
}

#[test]
fn activating_or_closing_unknown_ids_is_a_no_op() {
    let (mut service, receiver) = seeded_service();
    assert!(!service.activate_tab(99));
    assert!(!service.close_tab(99).unwrap());
    assert!(received(&receiver).is_empty());
    assert_eq!(service.open_tabs().len(), 3);
}

#[test]
fn close_removes_the_tab_and_persists() {
    let (mut service, receiver) = seeded_service();
    assert!(service.close_tab(2).unwrap());

    assert_eq!(received(&receiver), vec![TabCommand::CloseTab { id: 2 }]);
    assert_eq!(service.open_tabs().ids(), vec![1, 3]);
    assert_eq!(service.windows().load().latest().unwrap().tabs.ids(), vec![1, 3]);
}

#[test]
fn failed_delivery_keeps_the_tab() {
    let (mut service, receiver) = seeded_service();
    drop(receiver);
    assert!(!service.close_tab(2).unwrap());
    assert!(service.open_tabs().contains(2));
}

#[test]
fn closed_tabs_become_reopenable_candidates() {
    let (mut service, receiver) = seeded_service();
    service
        .apply_tab_event(&TabEvent::Closed {
            id: 3,
            title: "Pull Requests".to_string(),
            url: "https://github.com/pulls".to_string(),
        })
        .unwrap();

    service.show_panel().unwrap();
    let candidates = service.set_query("github");
    assert_eq!(candidates.len(), 1);
    assert_eq!(
        candidates[0].origin,
        CandidateOrigin::Closed {
            url: "https://github.com/pulls".to_string()
        }
    );

    service.handle_key(NavigationKey::Return).unwrap();
    assert_eq!(
        received(&receiver),
        vec![TabCommand::OpenUrl {
            url: "https://github.com/pulls".to_string()
        }]
    );
}

#[test]
fn close_selected_forgets_a_history_entry() {
    let (mut service, receiver) = seeded_service();
    service
        .apply_tab_event(&TabEvent::Closed {
            id: 3,
            title: "Pull Requests".to_string(),
            url: "https://github.com/pulls".to_string(),
        })
        .unwrap();
    service.show_panel().unwrap();
    service.set_query("github");

    assert!(service.close_selected().unwrap());
    assert!(service.candidates().is_empty());
    assert!(received(&receiver).is_empty());
}

#[test]
fn toolbar_transparency_is_forwarded() {
    let (service, receiver) = seeded_service();
    assert!(service.set_toolbar_transparent(true));
    assert_eq!(
        received(&receiver),
        vec![TabCommand::ChangeToolbarIconTransparency {
            should_be_transparent: true
        }]
    );
}

#[test]
fn latest_window_is_restored_on_start() {
    let (service, _receiver) = seeded_service();
    let payload = service.windows().load();

    let (dispatcher, _rx) = ChannelDispatcher::new();
    let store = WindowStore::in_memory();
    store.update(|windows| *windows = payload).unwrap();
    let mut restored =
        TabFinderService::new(Config::default(), store, None, Box::new(dispatcher)).unwrap();

    assert_eq!(restored.load_latest_window(), 3);
    assert_eq!(restored.open_tabs().ids(), vec![1, 2, 3]);
}

struct StaticBrowser {
    tabs: Vec<(i64, &'static str, &'static str)>,
}

impl TabInspector for StaticBrowser {
    type Window = ();
    type Tab = (i64, &'static str, &'static str);
    type Page = (&'static str, &'static str);

    fn all_tabs(&self, _window: &()) -> Result<Vec<Self::Tab>, InspectError> {
        Ok(self.tabs.clone())
    }

    fn tab_id(&self, tab: &Self::Tab) -> i64 {
        tab.0
    }

    fn active_page(&self, tab: &Self::Tab) -> Option<Self::Page> {
        Some((tab.1, tab.2))
    }

    fn properties(&self, page: &Self::Page) -> PageProperties {
        PageProperties {
            title: page.0.to_string(),
            url: page.1.to_string(),
        }
    }
}

#[test]
fn sync_window_reconciles_against_the_browser() {
    let (mut service, _receiver) = seeded_service();
    let browser = StaticBrowser {
        tabs: vec![
            (3, "Pull Requests (2)", "https://github.com/pulls"),
            (1, "Inbox", "https://mail.google.com/mail"),
            (8, "crates.io", "https://crates.io/"),
        ],
    };

    assert_eq!(service.sync_window(&browser, &()).unwrap(), 3);
    assert_eq!(service.open_tabs().ids(), vec![1, 3, 8]);
    assert_eq!(service.open_tabs().get(3).unwrap().title, "Pull Requests (2)");

    let live = vec![service.windows().load().latest().unwrap().combined_id.clone()];
    assert_eq!(service.prune_windows(&live).unwrap(), 1);
}

#[test]
fn retitled_window_keeps_a_single_snapshot() {
    let (mut service, _receiver) = seeded_service();
    for n in 0..50 {
        service
            .apply_tab_event(&TabEvent::Navigated {
                id: 1,
                title: format!("Page {n}"),
                url: format!("https://mail.google.com/page/{n}"),
            })
            .unwrap();
    }

    let windows = service.windows().load();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows.latest().unwrap().combined_id, "Pull RequestsSearchPage 49");
}

#[test]
fn history_failures_do_not_block_the_tab_list() {
    let (dispatcher, _receiver) = ChannelDispatcher::new();
    let unprepared = Connection::open_in_memory().unwrap();
    let mut service = TabFinderService::new(
        Config::default(),
        WindowStore::in_memory(),
        Some(unprepared),
        Box::new(dispatcher),
    )
    .unwrap();

    service.apply_tab_event(&opened(7, "Docs", "https://docs.rs/")).unwrap();
    assert_eq!(service.open_tabs().ids(), vec![7]);
    assert_eq!(service.candidates().len(), 1);
    assert_eq!(service.windows().load().latest().unwrap().tabs.ids(), vec![7]);

    service
        .apply_tab_event(&TabEvent::Closed {
            id: 7,
            title: "Docs".to_string(),
            url: "https://docs.rs/".to_string(),
        })
        .unwrap();
    assert!(service.open_tabs().is_empty());
    assert!(service.candidates().is_empty());
    assert!(service.windows().load().latest().unwrap().tabs.is_empty());
}
