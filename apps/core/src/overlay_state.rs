use crate::model::{ClosedTab, TabRecord};
use crate::search::{build_candidate_list, Candidate, SortMode};
use crate::selection::{default_index, CursorAction, NavigationKey, SelectionCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    ShowAndFocus,
    Hide,
    FocusExisting,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayState {
    visible: bool,
}

impl OverlayState {
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn on_hotkey(&mut self, has_focus: bool) -> HotkeyAction {
        if !self.visible {
            self.visible = true;
            return HotkeyAction::ShowAndFocus;
        }

        if has_focus {
            self.visible = false;
            return HotkeyAction::Hide;
        }

        HotkeyAction::FocusExisting
    }

    pub fn on_escape(&mut self) -> bool {
        if self.visible {
            self.visible = false;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    None,
    Activate(Candidate),
    Dismiss,
}

/// Everything the switcher panel renders: the query, the source lists, the
/// ranked candidates and the cursor over them.
#[derive(Debug, Clone, Default)]
pub struct SwitcherSession {
    overlay: OverlayState,
    sort_mode: SortMode,
    query: String,
    open_tabs: Vec<TabRecord>,
    closed_tabs: Vec<ClosedTab>,
    candidates: Vec<Candidate>,
    cursor: SelectionCursor,
}

impl SwitcherSession {
    pub fn new(sort_mode: SortMode) -> Self {
        Self {
            sort_mode,
            ..Self::default()
        }
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn selected_index(&self) -> usize {
        self.cursor.index()
    }

    pub fn selected(&self) -> Option<&Candidate> {
        self.candidates.get(self.cursor.index())
    }

    pub fn open_tabs(&self) -> &[TabRecord] {
        &self.open_tabs
    }

    /// Shows the panel with a fresh query and the default selection.
    pub fn show(&mut self) {
        self.overlay.set_visible(true);
        self.query.clear();
        self.rebuild();
        self.reset_cursor();
    }

    pub fn hide(&mut self) {
        self.overlay.set_visible(false);
        self.query.clear();
    }

    pub fn on_hotkey(&mut self, has_focus: bool) -> HotkeyAction {
        let action = self.overlay.on_hotkey(has_focus);
        match action {
            HotkeyAction::ShowAndFocus => self.show(),
            HotkeyAction::Hide => self.hide(),
            HotkeyAction::FocusExisting => {}
        }
        action
    }

    pub fn set_query(&mut self, query: &str) {
        if self.query == query {
            return;
        }
        self.query = query.to_string();
        self.rebuild();
        if self.query.trim().is_empty() {
            self.reset_cursor();
        } else {
            self.cursor.reclamp(self.candidates.len());
        }
    }

    /// `tabs` must already be arranged for the session's sort mode.
    pub fn replace_open_tabs(&mut self, tabs: Vec<TabRecord>) {
        self.open_tabs = tabs;
        self.rebuild();
        self.cursor.reclamp(self.candidates.len());
    }

    pub fn replace_closed_tabs(&mut self, tabs: Vec<ClosedTab>) {
        self.closed_tabs = tabs;
        self.rebuild();
        self.cursor.reclamp(self.candidates.len());
    }

    pub fn on_key(&mut self, key: NavigationKey) -> SessionAction {
        match self.cursor.on_key(key, self.candidates.len()) {
            CursorAction::Moved(_) => SessionAction::None,
            CursorAction::Activate(index) => match self.candidates.get(index) {
                Some(candidate) => SessionAction::Activate(candidate.clone()),
                None => SessionAction::None,
            },
            CursorAction::Dismiss => {
                self.overlay.on_escape();
                self.query.clear();
                SessionAction::Dismiss
            }
        }
    }

    fn rebuild(&mut self) {
        self.candidates = build_candidate_list(&self.query, &self.open_tabs, &self.closed_tabs);
    }

    /// Only open tabs count toward preselecting the previous tab; history
    /// rows after them never take the default position.
    fn reset_cursor(&mut self) {
        let start = default_index(self.sort_mode, self.query.trim().is_empty(), self.open_tabs.len());
        self.cursor.set(start as i64, self.candidates.len());
    }
}
