// frontend/src/telemetry/engineio.rs
//
// Text framing for the telemetry push channel: Engine.IO v4 packets carrying
// Socket.IO packets, websocket transport only (no polling, no binary).
//
//   0{..}   open            2 / 3    ping / pong
//   1       close           40 / 41  namespace connect / disconnect
//   6       noop            42[..]   event, 44{..} connect error

use crate::error::{DashboardError, Result};
use observatory_shared::parse_lenient;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(OpenInfo),
    Close,
    Ping(String),
    Pong(String),
    Noop,
    Connect,
    Disconnect,
    Event { name: String, args: Vec<Value> },
    ConnectError(Value),
    /// Socket.IO packet types the dashboard does not use (acks, binary).
    Other(String),
}

pub const CONNECT: &str = "40";

pub fn pong(payload: &str) -> String {
    format!("3{payload}")
}

pub fn decode(text: &str) -> Result<Packet> {
    let mut chars = text.chars();
    let Some(kind) = chars.next() else {
        return Err(DashboardError::Protocol("empty engine.io packet".into()));
    };
    let rest = chars.as_str();

    match kind {
        '0' => Ok(Packet::Open(serde_json::from_str(rest)?)),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping(rest.to_string())),
        '3' => Ok(Packet::Pong(rest.to_string())),
        '4' => decode_socketio(rest),
        '6' => Ok(Packet::Noop),
        other => Err(DashboardError::Protocol(format!(
            "unknown engine.io packet type {other:?}"
        ))),
    }
}

fn decode_socketio(text: &str) -> Result<Packet> {
    let mut chars = text.chars();
    let Some(kind) = chars.next() else {
        return Err(DashboardError::Protocol("empty socket.io packet".into()));
    };
    let body = strip_namespace(chars.as_str());

    match kind {
        '0' => Ok(Packet::Connect),
        '1' => Ok(Packet::Disconnect),
        '2' => {
            // optional ack id before the array
            let body = body.trim_start_matches(|c: char| c.is_ascii_digit());
            let mut items: Vec<Value> = parse_lenient(body)?;
            if items.is_empty() {
                return Err(DashboardError::Protocol("event without a name".into()));
            }
            let name = match items.remove(0) {
                Value::String(s) => s,
                other => {
                    return Err(DashboardError::Protocol(format!(
                        "event name is not a string: {other}"
                    )));
                }
            };
            Ok(Packet::Event { name, args: items })
        }
        '4' => Ok(Packet::ConnectError(
            parse_lenient(body).unwrap_or(Value::Null),
        )),
        _ => Ok(Packet::Other(text.to_string())),
    }
}

/// `/ns,payload` -> `payload`; the default namespace has no prefix.
fn strip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        match body.split_once(',') {
            Some((_, rest)) => rest,
            None => "",
        }
    } else {
        body
    }
}
