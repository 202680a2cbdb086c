// frontend/src/control.rs
//
// Control channel: at most one websocket to the local device-control process.
// Outbound frames are JSON + "\r\n" pushed through an mpsc writer task; the
// reader task decodes inbound frames and forwards them as `ChannelEvent`s.

use crate::error::{DashboardError, Result};
use crate::notify::Notifications;
use futures_util::{SinkExt, StreamExt};
use observatory_shared::ControlMessage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

pub const FRAME_TERMINATOR: &str = "\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Message(ControlMessage),
    Closed,
    Error(String),
}

/// Decode one inbound frame. Malformed frames are logged and dropped, the
/// heartbeat never leaves this function.
pub fn route_frame(text: &str) -> Option<ControlMessage> {
    match ControlMessage::from_text(text) {
        Ok(msg) if msg.is_heartbeat() => {
            tracing::trace!("[CTRL] heartbeat");
            None
        }
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::warn!("[CTRL] dropping frame: {e}");
            None
        }
    }
}

pub fn encode_frame(msg: &ControlMessage) -> Result<String> {
    let mut out = msg.to_json()?;
    out.push_str(FRAME_TERMINATOR);
    Ok(out)
}

// ---------- WS handle ----------
#[derive(Clone)]
struct WsSender {
    tx: UnboundedSender<String>,
}

impl WsSender {
    fn send_text(&self, text: String) -> bool {
        self.tx.send(text).is_ok()
    }
}

struct Inner {
    state: ChannelState,
    // bumped on every connect/disconnect so a stale reader can't reset a newer link
    epoch: u64,
    sender: Option<WsSender>,
    reader: Option<JoinHandle<()>>,
    events: Option<UnboundedSender<ChannelEvent>>,
}

/// Connection manager for the control channel. Cheap to clone; clones share
/// the one connection.
#[derive(Clone)]
pub struct ControlChannel {
    url: String,
    inner: Arc<Mutex<Inner>>,
}

impl ControlChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            inner: Arc::new(Mutex::new(Inner {
                state: ChannelState::Disconnected,
                epoch: 0,
                sender: None,
                reader: None,
                events: None,
            })),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ChannelState {
        self.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Connected
    }

    /// Opens the channel and sends the dashboard setup handshake. Inbound
    /// traffic is delivered on `events` until the channel closes.
    pub async fn connect(&self, events: UnboundedSender<ChannelEvent>) -> Result<()> {
        let epoch = {
            let mut inner = self.lock();
            if inner.state != ChannelState::Disconnected {
                tracing::debug!("[CTRL] connect ignored, channel is {:?}", inner.state);
                return Ok(());
            }
            inner.state = ChannelState::Connecting;
            inner.epoch += 1;
            inner.epoch
        };

        tracing::info!("[CTRL] connecting to {}", self.url);
        let ws_stream = match tokio_tungstenite::connect_async(self.url.as_str()).await {
            Ok((ws, _)) => ws,
            Err(e) => {
                {
                    let mut inner = self.lock();
                    if inner.epoch == epoch {
                        inner.state = ChannelState::Disconnected;
                    }
                }
                tracing::warn!("[CTRL] connect failed: {e}");
                let _ = events.send(ChannelEvent::Error(e.to_string()));
                return Err(e.into());
            }
        };

        let (mut write, mut read) = ws_stream.split();
        let (tx, mut rx) = unbounded_channel::<String>();

        // the writer ends (and closes the socket) once every sender is dropped
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = write.send(Message::Text(msg.into())).await {
                    tracing::warn!("[CTRL] write failed: {e}");
                    break;
                }
            }
            let _ = write.close().await;
        });

        let sender = WsSender { tx };
        let setup = encode_frame(&ControlMessage::RemoteDashboardSetup)?;
        sender.send_text(setup);

        {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                // disconnect() raced the handshake; dropping the sender closes the socket
                return Err(DashboardError::NotConnected);
            }
            inner.state = ChannelState::Connected;
            inner.sender = Some(sender);
            inner.events = Some(events.clone());
        }
        tracing::info!("[CTRL] connected");
        let _ = events.send(ChannelEvent::Opened);

        let this = self.clone();
        let reader_events = events.clone();
        let reader = tokio::spawn(async move {
            while let Some(item) = read.next().await {
                match item {
                    Ok(Message::Text(s)) => {
                        if let Some(msg) = route_frame(&s) {
                            if reader_events.send(ChannelEvent::Message(msg)).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("[CTRL] read error: {e}");
                        let _ = reader_events.send(ChannelEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
            this.closed_by_peer(epoch);
        });

        let mut inner = self.lock();
        if inner.epoch == epoch && inner.state == ChannelState::Connected {
            inner.reader = Some(reader);
        } else {
            reader.abort();
        }
        Ok(())
    }

    fn closed_by_peer(&self, epoch: u64) {
        let events = {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                return;
            }
            inner.state = ChannelState::Disconnected;
            inner.sender = None;
            inner.reader = None;
            inner.events.take()
        };
        tracing::info!("[CTRL] channel closed");
        if let Some(events) = events {
            let _ = events.send(ChannelEvent::Closed);
        }
    }

    /// Closes the channel. No reconnect is attempted.
    pub fn disconnect(&self) {
        let (reader, events) = {
            let mut inner = self.lock();
            if inner.state == ChannelState::Disconnected {
                return;
            }
            inner.epoch += 1;
            inner.state = ChannelState::Disconnected;
            inner.sender = None;
            (inner.reader.take(), inner.events.take())
        };
        if let Some(reader) = reader {
            reader.abort();
        }
        tracing::info!("[CTRL] disconnected");
        if let Some(events) = events {
            let _ = events.send(ChannelEvent::Closed);
        }
    }

    /// Queues one frame. Returns `false` (and drops the message) when the
    /// channel is not connected.
    pub fn send(&self, msg: &ControlMessage) -> bool {
        let sender = {
            let inner = self.lock();
            if inner.state != ChannelState::Connected {
                None
            } else {
                inner.sender.clone()
            }
        };
        let Some(sender) = sender else {
            tracing::debug!("[CTRL] not connected, dropping {}", msg.event());
            return false;
        };
        match encode_frame(msg) {
            Ok(frame) => sender.send_text(frame),
            Err(e) => {
                tracing::warn!("[CTRL] failed to encode {}: {e}", msg.event());
                false
            }
        }
    }
}

// ---------- panel ----------

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPanel {
    pub state: ChannelState,
    pub notify: String,
    /// Follows the status poller: only enabled while the server runs.
    pub enabled: bool,
}

impl Default for ChannelPanel {
    fn default() -> Self {
        Self {
            state: ChannelState::Disconnected,
            notify: "No connection".to_string(),
            enabled: false,
        }
    }
}

impl ChannelPanel {
    pub fn button_label(&self) -> &'static str {
        match self.state {
            ChannelState::Connected => "Disconnect",
            ChannelState::Connecting | ChannelState::Disconnected => "Connect",
        }
    }

    pub fn connecting(&mut self) {
        self.state = ChannelState::Connecting;
    }

    pub fn apply(&mut self, event: &ChannelEvent, notes: &mut Notifications) {
        match event {
            ChannelEvent::Opened => {
                self.state = ChannelState::Connected;
                self.notify = "Connected to server".to_string();
            }
            ChannelEvent::Closed => {
                self.state = ChannelState::Disconnected;
                self.notify = "No connection".to_string();
            }
            ChannelEvent::Error(e) => {
                self.state = ChannelState::Disconnected;
                self.notify = "No connection".to_string();
                notes.on_error(format!("Control channel error: {e}"));
            }
            ChannelEvent::Message(_) => {}
        }
    }
}
