use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const SWITCH_TAB_TO: &str = "switchtabto";
pub const CLOSE_TAB: &str = "closetab";
pub const CHANGE_TOOLBAR_ICON_TRANSPARENCY: &str = "changetoolbaricontransparency";
pub const OPEN_URL: &str = "openurl";

/// Commands the host sends to the browser extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabCommand {
    SwitchTabTo { id: i64 },
    CloseTab { id: i64 },
    ChangeToolbarIconTransparency { should_be_transparent: bool },
    OpenUrl { url: String },
}

/// Wire form of a command: a name plus a string-keyed, string-valued payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    pub command: String,
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("command '{command}' is missing payload field '{field}'")]
    MissingField { command: String, field: &'static str },
    #[error("command '{command}' has invalid '{field}' value '{value}'")]
    InvalidField {
        command: String,
        field: &'static str,
        value: String,
    },
}

impl TabCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SwitchTabTo { .. } => SWITCH_TAB_TO,
            Self::CloseTab { .. } => CLOSE_TAB,
            Self::ChangeToolbarIconTransparency { .. } => CHANGE_TOOLBAR_ICON_TRANSPARENCY,
            Self::OpenUrl { .. } => OPEN_URL,
        }
    }

    pub fn to_envelope(&self) -> Envelope {
        let mut payload = BTreeMap::new();
        match self {
            Self::SwitchTabTo { id } | Self::CloseTab { id } => {
                payload.insert("id".to_string(), id.to_string());
            }
            Self::ChangeToolbarIconTransparency {
                should_be_transparent,
            } => {
                let flag = if *should_be_transparent { "1" } else { "0" };
                payload.insert("shouldBeTransparent".to_string(), flag.to_string());
            }
            Self::OpenUrl { url } => {
                payload.insert("url".to_string(), url.clone());
            }
        }
        Envelope {
            command: self.name().to_string(),
            payload,
        }
    }
}

impl TryFrom<Envelope> for TabCommand {
    type Error = ContractError;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        match envelope.command.as_str() {
            SWITCH_TAB_TO => Ok(Self::SwitchTabTo {
                id: parse_id(&envelope)?,
            }),
            CLOSE_TAB => Ok(Self::CloseTab {
                id: parse_id(&envelope)?,
            }),
            CHANGE_TOOLBAR_ICON_TRANSPARENCY => {
                let raw = required(&envelope, "shouldBeTransparent")?;
                let should_be_transparent = match raw {
                    "1" => true,
                    "0" => false,
                    other => return Err(invalid(&envelope, "shouldBeTransparent", other)),
                };
                Ok(Self::ChangeToolbarIconTransparency {
                    should_be_transparent,
                })
            }
            OPEN_URL => {
                let url = required(&envelope, "url")?;
                if url.trim().is_empty() {
                    return Err(invalid(&envelope, "url", url));
                }
                Ok(Self::OpenUrl {
                    url: url.to_string(),
                })
            }
            other => Err(ContractError::UnknownCommand(other.to_string())),
        }
    }
}

fn required<'a>(envelope: &'a Envelope, field: &'static str) -> Result<&'a str, ContractError> {
    envelope
        .payload
        .get(field)
        .map(String::as_str)
        .ok_or_else(|| ContractError::MissingField {
            command: envelope.command.clone(),
            field,
        })
}

fn parse_id(envelope: &Envelope) -> Result<i64, ContractError> {
    let raw = required(envelope, "id")?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| invalid(envelope, "id", raw))
}

fn invalid(envelope: &Envelope, field: &'static str, value: &str) -> ContractError {
    ContractError::InvalidField {
        command: envelope.command.clone(),
        field,
        value: value.to_string(),
    }
}
