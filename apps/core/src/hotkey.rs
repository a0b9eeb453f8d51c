use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Control,
    Option,
    Shift,
    Command,
}

impl Modifier {
    fn parse(input: &str) -> Result<Self, String> {
        match input.trim().to_ascii_lowercase().as_str() {
            "ctrl" | "control" | "⌃" => Ok(Self::Control),
            "option" | "opt" | "alt" | "⌥" => Ok(Self::Option),
            "shift" | "⇧" => Ok(Self::Shift),
            "cmd" | "command" | "⌘" => Ok(Self::Command),
            _ => Err(format!(
                "Unsupported modifier '{}'. Use Cmd, Option, Ctrl, or Shift.",
                input.trim()
            )),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Control => "Ctrl",
            Self::Option => "Option",
            Self::Shift => "Shift",
            Self::Command => "Cmd",
        }
    }
}

/// A global shortcut in canonical order (Ctrl, Option, Shift, Cmd, key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    pub modifiers: Vec<Modifier>,
    pub key: String,
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.label())?;
        }
        write!(f, "{}", self.key)
    }
}

pub fn parse_hotkey(input: &str) -> Result<Hotkey, String> {
    let parts: Vec<&str> = input
        .split('+')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    let Some((key_raw, modifier_parts)) = parts.split_last() else {
        return Err("Hotkey is required.".to_string());
    };
    if modifier_parts.is_empty() {
        return Err("Hotkey must include at least one modifier and one key.".to_string());
    }

    let mut modifiers = modifier_parts
        .iter()
        .map(|part| Modifier::parse(part))
        .collect::<Result<Vec<_>, _>>()?;
    modifiers.sort();
    modifiers.dedup();

    Ok(Hotkey {
        modifiers,
        key: normalize_key(key_raw)?,
    })
}

fn normalize_key(input: &str) -> Result<String, String> {
    let upper = input.to_ascii_uppercase();
    match upper.as_str() {
        "SPACE" => return Ok("Space".to_string()),
        "TAB" => return Ok("Tab".to_string()),
        "`" | "BACKTICK" | "GRAVE" => return Ok("`".to_string()),
        _ => {}
    }

    if let Some(number) = upper.strip_prefix('F') {
        if let Ok(parsed) = number.parse::<u8>() {
            if (1..=20).contains(&parsed) {
                return Ok(format!("F{parsed}"));
            }
            return Err("Function key must be between F1 and F20.".to_string());
        }
    }

    let mut chars = upper.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Ok(upper);
        }
    }

    Err("Key must be A-Z, 0-9, Space, Tab, ` or F1-F20.".to_string())
}
