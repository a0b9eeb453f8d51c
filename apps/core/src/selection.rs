use crate::search::SortMode;

/// Maps any raw index onto `[0, len)` with non-negative modulo.
/// An empty list always resolves to 0.
pub fn resolve_index(raw: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    // rem_euclid is never negative for a positive modulus.
    raw.rem_euclid(len) as usize
}

/// Where the cursor starts for a freshly rendered list.
///
/// With an empty query in last-seen order the previous tab (index 1) is
/// preselected, so a single Return goes "back one".
pub fn default_index(mode: SortMode, query_is_empty: bool, len: usize) -> usize {
    if query_is_empty && mode == SortMode::LastSeen && len > 1 {
        1
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKey {
    ArrowUp,
    ArrowDown,
    Tab,
    ShiftTab,
    Backtick,
    Return,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorAction {
    Moved(usize),
    Activate(usize),
    Dismiss,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionCursor {
    index: usize,
}

impl SelectionCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set(&mut self, raw: i64, len: usize) -> usize {
        self.index = resolve_index(raw, len);
        self.index
    }

    pub fn move_by(&mut self, delta: i64, len: usize) -> usize {
        let raw = i64::try_from(self.index).unwrap_or(0).saturating_add(delta);
        self.set(raw, len)
    }

    /// Re-resolves the current index against a rebuilt list of `len` items.
    /// The logical tab under the cursor may change.
    pub fn reclamp(&mut self, len: usize) -> usize {
        let raw = i64::try_from(self.index).unwrap_or(0);
        self.set(raw, len)
    }

    pub fn on_key(&mut self, key: NavigationKey, len: usize) -> CursorAction {
        match key {
            NavigationKey::ArrowUp | NavigationKey::Backtick | NavigationKey::ShiftTab => {
                CursorAction::Moved(self.move_by(-1, len))
            }
            NavigationKey::ArrowDown | NavigationKey::Tab => CursorAction::Moved(self.move_by(1, len)),
            NavigationKey::Return => CursorAction::Activate(self.index),
            NavigationKey::Escape => CursorAction::Dismiss,
        }
    }
}
