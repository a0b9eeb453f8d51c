use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;

use crate::config::{validate, Config};
use crate::contract::TabCommand;
use crate::history_store::{self, HistoryError};
use crate::model::TabRecord;
use crate::overlay_state::{HotkeyAction, SessionAction, SwitcherSession};
use crate::reconcile::{reconcile_window, InspectError, TabInspector};
use crate::search::{order_for_sort_mode, Candidate, CandidateOrigin};
use crate::selection::NavigationKey;
use crate::snapshot_store::{SqliteDefaults, StoreError, WindowStore};
use crate::tab_store::{TabCollection, TabEvent};
use crate::transport::{send_command, MessageDispatcher};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("history error: {0}")]
    History(#[from] HistoryError),
    #[error(transparent)]
    Inspect(#[from] InspectError),
}

/// The host-side context: configuration, persisted stores, the dispatcher to
/// the extension and the live switcher session. Constructed once by the
/// process entry point and passed explicitly.
pub struct TabFinderService {
    config: Config,
    windows: WindowStore,
    history: Option<Connection>,
    dispatcher: Box<dyn MessageDispatcher>,
    open_tabs: TabCollection,
    /// Identity of the snapshot last written for `open_tabs`.
    window_id: Option<String>,
    session: SwitcherSession,
}

impl TabFinderService {
    pub fn new(
        config: Config,
        windows: WindowStore,
        history: Option<Connection>,
        dispatcher: Box<dyn MessageDispatcher>,
    ) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        let session = SwitcherSession::new(config.sort_mode);
        Ok(Self {
            config,
            windows,
            history,
            dispatcher,
            open_tabs: TabCollection::new(),
            window_id: None,
            session,
        })
    }

    /// Opens the on-disk stores named by `config`.
    pub fn open(config: Config, dispatcher: Box<dyn MessageDispatcher>) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        let windows = WindowStore::new(Box::new(SqliteDefaults::open_file(&config.shared_db_path)?));
        let history = if config.include_closed_tabs {
            Some(history_store::open_file(&config.history_db_path)?)
        } else {
            None
        };
        Self::new(config, windows, history, dispatcher)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn windows(&self) -> &WindowStore {
        &self.windows
    }

    pub fn open_tabs(&self) -> &TabCollection {
        &self.open_tabs
    }

    pub fn session(&self) -> &SwitcherSession {
        &self.session
    }

    pub fn candidates(&self) -> &[Candidate] {
        self.session.candidates()
    }

    /// Adopts the most recent persisted window as the current tab list.
    pub fn load_latest_window(&mut self) -> usize {
        let latest = self.windows.load().latest().cloned();
        self.window_id = latest.as_ref().map(|snapshot| snapshot.combined_id.clone());
        self.open_tabs = latest.map(|snapshot| snapshot.tabs).unwrap_or_default();
        self.refresh_open_tabs();
        self.open_tabs.len()
    }

    /// Applies a browser event to the current list, then persists and
    /// re-renders it. History bookkeeping failures are logged and absorbed.
    pub fn apply_tab_event(&mut self, event: &TabEvent) -> Result<(), ServiceError> {
        let removed = self.open_tabs.apply_event(event);
        self.refresh_open_tabs();

        if let Err(error) = self.record_history(event, removed.as_ref()) {
            tracing::warn!(%error, "failed to update closed tab history");
        }
        if matches!(event, TabEvent::Closed { .. }) {
            if let Err(error) = self.refresh_closed_tabs() {
                tracing::warn!(%error, "failed to reload closed tab history");
            }
        }

        self.persist_window()
    }

    /// Reconciles the current list against the browser, persists the result
    /// and rebuilds the rendered list.
    pub fn sync_window<I: TabInspector>(&mut self, inspector: &I, window: &I::Window) -> Result<usize, ServiceError> {
        let reconciled = reconcile_window(inspector, window, &self.open_tabs)?;
        self.open_tabs = reconciled;
        self.refresh_open_tabs();
        self.persist_window()?;
        Ok(self.open_tabs.len())
    }

    pub fn prune_windows(&self, live_ids: &[String]) -> Result<usize, ServiceError> {
        Ok(self.windows.prune_to_live(live_ids)?)
    }

    pub fn refresh_closed_tabs(&mut self) -> Result<usize, ServiceError> {
        let closed = match &self.history {
            Some(history) => history_store::list_recent(history, usize::from(self.config.max_closed_tabs))?,
            None => Vec::new(),
        };
        let count = closed.len();
        self.session.replace_closed_tabs(closed);
        Ok(count)
    }

    pub fn on_hotkey(&mut self, has_focus: bool) -> Result<HotkeyAction, ServiceError> {
        if !self.session.overlay().is_visible() {
            self.refresh_closed_tabs()?;
        }
        Ok(self.session.on_hotkey(has_focus))
    }

    pub fn show_panel(&mut self) -> Result<(), ServiceError> {
        self.refresh_closed_tabs()?;
        self.session.show();
        Ok(())
    }

    pub fn hide_panel(&mut self) {
        self.session.hide();
    }

    pub fn set_query(&mut self, query: &str) -> &[Candidate] {
        self.session.set_query(query);
        self.session.candidates()
    }

    /// Feeds a navigation key to the session; Return activates the
    /// selection and hides the panel.
    pub fn handle_key(&mut self, key: NavigationKey) -> Result<SessionAction, ServiceError> {
        let action = self.session.on_key(key);
        if let SessionAction::Activate(candidate) = &action {
            self.activate_candidate(candidate)?;
            self.session.hide();
        }
        Ok(action)
    }

    /// Asks the extension to focus tab `id`. Unknown ids are a no-op.
    pub fn activate_tab(&self, id: i64) -> bool {
        if !self.open_tabs.contains(id) {
            tracing::info!(id, "ignoring activate for unknown tab");
            return false;
        }
        send_command(self.dispatcher.as_ref(), &TabCommand::SwitchTabTo { id })
    }

    /// Asks the extension to close tab `id` and drops it from the list once
    /// the command is delivered. Unknown ids are a no-op.
    pub fn close_tab(&mut self, id: i64) -> Result<bool, ServiceError> {
        if !self.open_tabs.contains(id) {
            tracing::info!(id, "ignoring close for unknown tab");
            return Ok(false);
        }
        if !send_command(self.dispatcher.as_ref(), &TabCommand::CloseTab { id }) {
            return Ok(false);
        }

        self.open_tabs.remove(id);
        self.refresh_open_tabs();
        self.persist_window()?;
        Ok(true)
    }

    pub fn activate_selected(&mut self) -> Result<bool, ServiceError> {
        let Some(candidate) = self.session.selected().cloned() else {
            tracing::info!("nothing selected to activate");
            return Ok(false);
        };
        self.activate_candidate(&candidate)
    }

    /// Closes the selected open tab, or forgets the selected history entry.
    pub fn close_selected(&mut self) -> Result<bool, ServiceError> {
        let Some(candidate) = self.session.selected().cloned() else {
            tracing::info!("nothing selected to close");
            return Ok(false);
        };
        match candidate.origin {
            CandidateOrigin::Open => self.close_tab(candidate.record.id),
            CandidateOrigin::Closed { url } => {
                let Some(history) = &self.history else {
                    return Ok(false);
                };
                let removed = history_store::remove(history, &url)?;
                self.refresh_closed_tabs()?;
                Ok(removed)
            }
        }
    }

    pub fn set_toolbar_transparent(&self, transparent: bool) -> bool {
        send_command(
            self.dispatcher.as_ref(),
            &TabCommand::ChangeToolbarIconTransparency {
                should_be_transparent: transparent,
            },
        )
    }

    fn activate_candidate(&mut self, candidate: &Candidate) -> Result<bool, ServiceError> {
        match &candidate.origin {
            CandidateOrigin::Open => Ok(self.activate_tab(candidate.record.id)),
            CandidateOrigin::Closed { url } => Ok(send_command(
                self.dispatcher.as_ref(),
                &TabCommand::OpenUrl { url: url.clone() },
            )),
        }
    }

    fn record_history(&self, event: &TabEvent, removed: Option<&TabRecord>) -> Result<(), HistoryError> {
        let Some(history) = &self.history else {
            return Ok(());
        };
        match event {
            TabEvent::Opened { url, .. } => {
                history_store::record_opened_as_new_tab(history, url)?;
            }
            TabEvent::Navigated { url, .. } => {
                history_store::record_revisit(history, url)?;
            }
            TabEvent::Closed { title, url, .. } => {
                if !url.is_empty() {
                    let title = removed.map_or(title.as_str(), |tab| tab.title.as_str());
                    history_store::record_closed(history, url, title, now_epoch_secs())?;
                    history_store::prune(history, usize::from(self.config.max_closed_tabs))?;
                }
            }
            TabEvent::Activated { .. } => {}
        }
        Ok(())
    }

    /// Overwrites this window's snapshot. A title change gives the window a
    /// new identity, so the old snapshot is dropped by its previous id.
    fn persist_window(&mut self) -> Result<(), ServiceError> {
        let id = self
            .windows
            .replace_window(self.window_id.as_deref(), self.open_tabs.clone())?;
        self.window_id = Some(id);
        Ok(())
    }

    fn refresh_open_tabs(&mut self) {
        let ordered = order_for_sort_mode(&self.open_tabs, self.config.sort_mode);
        self.session.replace_open_tabs(ordered);
    }
}

fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
