// frontend/src/telemetry/subscriber.rs

use super::engineio::{self, Packet};
use crate::error::{DashboardError, Result};
use futures_util::{SinkExt, StreamExt};
use observatory_shared::{GPS_PANEL_EVENT, TelemetrySample};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message;

pub const RECONNECT_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    Connected,
    Sample(TelemetrySample),
    Disconnected(Option<String>),
}

/// Turns one `gpspanel` payload into a sample. Malformed payloads are dropped.
pub fn decode_sample(args: Vec<Value>) -> Option<TelemetrySample> {
    let payload = args.into_iter().next()?;
    match serde_json::from_value::<TelemetrySample>(payload) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!("[GPS] dropping malformed {GPS_PANEL_EVENT} payload: {e}");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetrySubscriber {
    url: String,
}

impl TelemetrySubscriber {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One session: connect, join the default namespace, forward samples until
    /// the server closes the transport.
    pub async fn connect_once(&self, events: &UnboundedSender<TelemetryEvent>) -> Result<()> {
        tracing::info!("[GPS] connecting to {}", self.url);
        let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        while let Some(item) = read.next().await {
            let text = match item? {
                Message::Text(s) => s,
                Message::Close(_) => break,
                _ => continue,
            };

            let packet = match engineio::decode(&text) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!("[GPS] dropping packet: {e}");
                    continue;
                }
            };

            match packet {
                Packet::Open(info) => {
                    tracing::debug!("[GPS] engine.io open sid={}", info.sid);
                    write.send(Message::Text(engineio::CONNECT.into())).await?;
                }
                Packet::Connect => {
                    tracing::info!("[GPS] subscribed");
                    if events.send(TelemetryEvent::Connected).is_err() {
                        break;
                    }
                }
                Packet::Ping(payload) => {
                    write
                        .send(Message::Text(engineio::pong(&payload).into()))
                        .await?;
                }
                Packet::Event { name, args } if name == GPS_PANEL_EVENT => {
                    if let Some(sample) = decode_sample(args) {
                        if events.send(TelemetryEvent::Sample(sample)).is_err() {
                            break;
                        }
                    }
                }
                Packet::Event { name, .. } => {
                    tracing::trace!("[GPS] ignoring event {name}");
                }
                Packet::ConnectError(v) => {
                    return Err(DashboardError::Protocol(format!(
                        "namespace connect refused: {v}"
                    )));
                }
                Packet::Close | Packet::Disconnect => break,
                Packet::Pong(_) | Packet::Noop | Packet::Other(_) => {}
            }
        }

        let _ = write.close().await;
        Ok(())
    }

    /// Reconnect loop; runs until `alive` is cleared or the receiver is gone.
    pub async fn supervise(&self, events: UnboundedSender<TelemetryEvent>, alive: Arc<AtomicBool>) {
        while alive.load(Ordering::Relaxed) {
            let res = self.connect_once(&events).await;
            let reason = res.err().map(|e| e.to_string());
            if let Some(e) = &reason {
                tracing::warn!("[GPS] connection error: {e}");
            }
            if events.send(TelemetryEvent::Disconnected(reason)).is_err() {
                break;
            }
            if !alive.load(Ordering::Relaxed) {
                break;
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
        tracing::debug!("[GPS] supervisor stopped");
    }
}
