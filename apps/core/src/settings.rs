use crate::config::Config;
use crate::hotkey::parse_hotkey;
use crate::search::SortMode;

pub const SAFE_HOTKEY_PRESETS: [&str; 5] = [
    "Option+Tab",
    "Option+`",
    "Ctrl+Tab",
    "Ctrl+Option+Space",
    "Shift+Cmd+K",
];

/// Shortcuts macOS or Safari already own.
const RESERVED_HOTKEYS: [&str; 9] = [
    "Cmd+Tab",
    "Shift+Cmd+Tab",
    "Cmd+`",
    "Cmd+Space",
    "Option+Cmd+Space",
    "Ctrl+Space",
    "Cmd+Q",
    "Cmd+W",
    "Cmd+H",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDraft {
    pub hotkey: String,
    pub sort_mode: SortMode,
    pub include_closed_tabs: bool,
    pub max_closed_tabs: u16,
}

impl SettingsDraft {
    pub fn from_config(config: &Config) -> Self {
        Self {
            hotkey: config.hotkey.clone(),
            sort_mode: config.sort_mode,
            include_closed_tabs: config.include_closed_tabs,
            max_closed_tabs: config.max_closed_tabs,
        }
    }

    /// Validates the draft and writes it onto `config`. Nothing is written
    /// when any field is rejected.
    pub fn apply_to(&self, config: &mut Config) -> Result<(), String> {
        let hotkey = validate_hotkey(&self.hotkey)?;
        validate_max_closed_tabs(self.max_closed_tabs)?;

        config.hotkey = hotkey;
        config.sort_mode = self.sort_mode;
        config.include_closed_tabs = self.include_closed_tabs;
        config.max_closed_tabs = self.max_closed_tabs;
        Ok(())
    }
}

pub fn validate_hotkey(input: &str) -> Result<String, String> {
    let canonical = parse_hotkey(input)?.to_string();
    if RESERVED_HOTKEYS.contains(&canonical.as_str()) {
        return Err("This hotkey is reserved by macOS. Choose a different one.".to_string());
    }
    Ok(canonical)
}

pub fn validate_max_closed_tabs(value: u16) -> Result<(), String> {
    if (5..=500).contains(&value) {
        Ok(())
    } else {
        Err("Closed tab history must keep between 5 and 500 entries.".to_string())
    }
}
