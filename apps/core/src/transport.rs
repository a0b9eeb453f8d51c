use std::io::Write;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use crate::contract::{ContractError, Envelope, TabCommand};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("receiver disconnected")]
    Disconnected,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("dispatcher lock poisoned")]
    Poisoned,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("command failed: {0}")]
    Apply(String),
}

/// One-way delivery to the extension process. Only delivery failure is
/// reported; there is no application-level acknowledgement.
pub trait MessageDispatcher: Send + Sync {
    fn dispatch(&self, envelope: &Envelope) -> Result<(), DispatchError>;
}

/// In-process dispatcher backed by a channel.
pub struct ChannelDispatcher {
    sender: Mutex<Sender<Envelope>>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, Receiver<Envelope>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender: Mutex::new(sender),
            },
            receiver,
        )
    }
}

impl MessageDispatcher for ChannelDispatcher {
    fn dispatch(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        let sender = self.sender.lock().map_err(|_| DispatchError::Poisoned)?;
        sender
            .send(envelope.clone())
            .map_err(|_| DispatchError::Disconnected)
    }
}

/// Writes one JSON envelope per line, e.g. to a pipe read by the extension.
pub struct JsonLinesDispatcher<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesDispatcher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, DispatchError> {
        self.writer.into_inner().map_err(|_| DispatchError::Poisoned)
    }
}

impl<W: Write + Send> MessageDispatcher for JsonLinesDispatcher<W> {
    fn dispatch(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        let line = serde_json::to_string(envelope)?;
        let mut writer = self.writer.lock().map_err(|_| DispatchError::Poisoned)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Fire-and-forget send. Failure is logged and never retried.
pub fn send_command(dispatcher: &dyn MessageDispatcher, command: &TabCommand) -> bool {
    match dispatcher.dispatch(&command.to_envelope()) {
        Ok(()) => {
            tracing::debug!(command = command.name(), "dispatched command");
            true
        }
        Err(error) => {
            tracing::warn!(command = command.name(), %error, "failed to dispatch command");
            false
        }
    }
}

/// Extension-side tab control.
pub trait TabController {
    fn switch_to(&self, id: i64) -> Result<(), String>;
    fn close(&self, id: i64) -> Result<(), String>;
    fn set_toolbar_icon_transparent(&self, transparent: bool) -> Result<(), String>;
    fn open_url(&self, url: &str) -> Result<(), String>;
}

pub fn decode_json(payload: &str) -> Result<TabCommand, TransportError> {
    let envelope: Envelope = serde_json::from_str(payload)?;
    Ok(TabCommand::try_from(envelope)?)
}

pub fn apply_command(controller: &dyn TabController, command: &TabCommand) -> Result<(), TransportError> {
    let result = match command {
        TabCommand::SwitchTabTo { id } => controller.switch_to(*id),
        TabCommand::CloseTab { id } => controller.close(*id),
        TabCommand::ChangeToolbarIconTransparency {
            should_be_transparent,
        } => controller.set_toolbar_icon_transparent(*should_be_transparent),
        TabCommand::OpenUrl { url } => controller.open_url(url),
    };
    result.map_err(TransportError::Apply)
}

/// Decodes one wire line and applies it. Failures are logged and absorbed.
pub fn handle_json(controller: &dyn TabController, payload: &str) -> bool {
    let outcome = decode_json(payload).and_then(|command| apply_command(controller, &command));
    match outcome {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(%error, "dropping tab command");
            false
        }
    }
}
