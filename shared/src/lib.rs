use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// Device server (HTTP)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Idle,
    Running,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Idle => "idle",
            ServerStatus::Running => "running",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `GET /devices/api/status`.
/// The server answers `{"status": "True"}` / `{"status": "False"}`; a bare
/// boolean is accepted too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusReply {
    #[serde(default)]
    pub status: Value,
}

impl StatusReply {
    pub fn server_status(&self) -> ServerStatus {
        match &self.status {
            Value::String(s) if s == "True" => ServerStatus::Running,
            Value::Bool(true) => ServerStatus::Running,
            _ => ServerStatus::Idle,
        }
    }
}

/// Device/plugin selection posted to `/devices/api/start`.
/// Values are free-form; the server decides what is legal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telescope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focuser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filterwheel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<String>,
}

/// Generic `{message?, error?}` reply of the device and tools APIs.
/// A non-empty `error` is the failure signal, not the HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiReply {
    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    pub fn is_error(&self) -> bool {
        self.error_text().is_some()
    }
}

// ---------------------------------------------------------------------------
// Lenient JSON
// ---------------------------------------------------------------------------

/// Rewrites bare `NaN` tokens to `null`. Python's json module emits them and
/// serde_json rejects them.
pub fn sanitize_nan(text: &str) -> String {
    const TOKEN: &str = "NaN";
    let bytes = text.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find(TOKEN) {
        let start = search_from + rel;
        let end = start + TOKEN.len();
        let left_ok = start == 0 || !is_word(bytes[start - 1]);
        let right_ok = end == bytes.len() || !is_word(bytes[end]);
        if left_ok && right_ok {
            out.push_str(&text[last..start]);
            out.push_str("null");
            last = end;
        }
        search_from = end;
    }
    out.push_str(&text[last..]);
    out
}

pub fn parse_lenient<T: DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    serde_json::from_str(&sanitize_nan(text))
}

// ---------------------------------------------------------------------------
// Control channel
// ---------------------------------------------------------------------------

pub const SETUP_EVENT: &str = "RemoteDashboardSetup";
pub const HEARTBEAT_EVENT: &str = "RemotePolling";

/// Wire envelope for both directions: `{event, id?, status?, message?, params}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlFrame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub params: Value,
}

/// Reply body of the `Remote*` device events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlReply {
    pub id: Option<i64>,
    pub status: Option<i64>,
    pub message: Option<String>,
    pub params: Value,
}

impl ControlReply {
    /// The device process reports `status == 0` on success.
    pub fn succeeded(&self) -> bool {
        self.status == Some(0)
    }

    pub fn error_text(&self) -> Option<&str> {
        self.params.get("error").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct GuidingParams {
    ra: f64,
    dec: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct FocusParams {
    hfd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct CoolingParams {
    temperature: f64,
    power: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    RemoteDashboardSetup,
    RemoteConnect(ControlReply),
    RemoteDisconnect(ControlReply),
    RemoteReconnect(ControlReply),
    RemoteScanning(ControlReply),
    RemotePolling(ControlReply),
    GuidingError { ra: f64, dec: f64 },
    FocusHfd { hfd: f64 },
    CoolingStatus { temperature: f64, power: f64 },
    Unknown { event: String, params: Value },
}

#[derive(Debug, thiserror::Error)]
pub enum ControlDecodeError {
    #[error("malformed control frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad params for {event}: {source}")]
    Params {
        event: String,
        source: serde_json::Error,
    },
}

impl ControlMessage {
    pub fn event(&self) -> &str {
        match self {
            ControlMessage::RemoteDashboardSetup => SETUP_EVENT,
            ControlMessage::RemoteConnect(_) => "RemoteConnect",
            ControlMessage::RemoteDisconnect(_) => "RemoteDisconnect",
            ControlMessage::RemoteReconnect(_) => "RemoteReconnect",
            ControlMessage::RemoteScanning(_) => "RemoteScanning",
            ControlMessage::RemotePolling(_) => HEARTBEAT_EVENT,
            ControlMessage::GuidingError { .. } => "GuidingError",
            ControlMessage::FocusHfd { .. } => "FocusHfd",
            ControlMessage::CoolingStatus { .. } => "CoolingStatus",
            ControlMessage::Unknown { event, .. } => event,
        }
    }

    pub fn is_heartbeat(&self) -> bool {
        matches!(self, ControlMessage::RemotePolling(_))
    }

    /// Decode one inbound text frame, tolerating `NaN` literals.
    pub fn from_text(text: &str) -> Result<Self, ControlDecodeError> {
        let frame: ControlFrame = parse_lenient(text.trim())?;
        Self::try_from(frame)
    }

    pub fn to_frame(&self) -> ControlFrame {
        let empty = || Value::Object(Map::new());
        let reply_frame = |event: &str, r: &ControlReply| ControlFrame {
            event: event.to_string(),
            id: r.id,
            status: r.status,
            message: r.message.clone(),
            params: r.params.clone(),
        };
        let plain = |event: &str, params: Value| ControlFrame {
            event: event.to_string(),
            id: None,
            status: None,
            message: None,
            params,
        };

        match self {
            ControlMessage::RemoteDashboardSetup => plain(SETUP_EVENT, empty()),
            ControlMessage::RemoteConnect(r)
            | ControlMessage::RemoteDisconnect(r)
            | ControlMessage::RemoteReconnect(r)
            | ControlMessage::RemoteScanning(r)
            | ControlMessage::RemotePolling(r) => reply_frame(self.event(), r),
            ControlMessage::GuidingError { ra, dec } => plain(
                "GuidingError",
                serde_json::json!({ "ra": ra, "dec": dec }),
            ),
            ControlMessage::FocusHfd { hfd } => {
                plain("FocusHfd", serde_json::json!({ "hfd": hfd }))
            }
            ControlMessage::CoolingStatus { temperature, power } => plain(
                "CoolingStatus",
                serde_json::json!({ "temperature": temperature, "power": power }),
            ),
            ControlMessage::Unknown { event, params } => plain(event, params.clone()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_frame())
    }
}

impl TryFrom<ControlFrame> for ControlMessage {
    type Error = ControlDecodeError;

    fn try_from(frame: ControlFrame) -> Result<Self, Self::Error> {
        fn params<T: DeserializeOwned>(event: &str, v: Value) -> Result<T, ControlDecodeError> {
            serde_json::from_value(v).map_err(|source| ControlDecodeError::Params {
                event: event.to_string(),
                source,
            })
        }

        let ControlFrame {
            event,
            id,
            status,
            message,
            params: raw,
        } = frame;
        let reply = |raw: Value| ControlReply {
            id,
            status,
            message: message.clone(),
            params: raw,
        };

        let msg = match event.as_str() {
            SETUP_EVENT => ControlMessage::RemoteDashboardSetup,
            "RemoteConnect" => ControlMessage::RemoteConnect(reply(raw)),
            "RemoteDisconnect" => ControlMessage::RemoteDisconnect(reply(raw)),
            "RemoteReconnect" => ControlMessage::RemoteReconnect(reply(raw)),
            "RemoteScanning" => ControlMessage::RemoteScanning(reply(raw)),
            HEARTBEAT_EVENT => ControlMessage::RemotePolling(reply(raw)),
            "GuidingError" => {
                let p: GuidingParams = params(&event, raw)?;
                ControlMessage::GuidingError { ra: p.ra, dec: p.dec }
            }
            "FocusHfd" => {
                let p: FocusParams = params(&event, raw)?;
                ControlMessage::FocusHfd { hfd: p.hfd }
            }
            "CoolingStatus" => {
                let p: CoolingParams = params(&event, raw)?;
                ControlMessage::CoolingStatus {
                    temperature: p.temperature,
                    power: p.power,
                }
            }
            _ => ControlMessage::Unknown { event, params: raw },
        };
        Ok(msg)
    }
}

// ---------------------------------------------------------------------------
// GPS telemetry (push channel, `gpspanel` event)
// ---------------------------------------------------------------------------

pub const GPS_PANEL_EVENT: &str = "gpspanel";

/// gpsd reports missing readings as `"n/a"`; any non-numeric value reads as absent.
fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(d)?.as_f64())
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_i64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    }))
}

/// Absent unless the value is an array; entries that are not objects are skipped.
fn lenient_satellites<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<Satellite>>, D::Error> {
    let Value::Array(items) = Value::deserialize(d)? else {
        return Ok(None);
    };
    Ok(Some(
        items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
    ))
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) if s != "n/a" => Some(s),
        _ => None,
    })
}

/// One `gpspanel` update. The server emits position (TPV) and sky (SKY)
/// halves separately, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    #[serde(default, deserialize_with = "lenient_string")]
    pub gpstime: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub mode: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub hdop: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub vdop: Option<f64>,
    #[serde(default, deserialize_with = "lenient_satellites")]
    pub satellites: Option<Vec<Satellite>>,
    /// Base64 PNG, signal-strength bar chart.
    #[serde(default, deserialize_with = "lenient_string")]
    pub sschart: Option<String>,
    /// Base64 PNG, polar satellite map.
    #[serde(default, deserialize_with = "lenient_string")]
    pub skymap: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Satellite {
    #[serde(rename = "PRN", deserialize_with = "lenient_prn")]
    pub prn: i64,
    /// Elevation, degrees.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub el: Option<f64>,
    /// Azimuth, degrees.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub az: Option<f64>,
    /// Signal strength, dB.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ss: Option<f64>,
    #[serde(default)]
    pub used: bool,
}

fn lenient_prn<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    lenient_i64(d)?.ok_or_else(|| serde::de::Error::custom("PRN is not a number"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixQuality {
    Waiting,
    TwoD,
    ThreeD,
}

impl FixQuality {
    pub fn from_mode(mode: i64) -> Self {
        match mode {
            3 => FixQuality::ThreeD,
            2 => FixQuality::TwoD,
            _ => FixQuality::Waiting,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FixQuality::Waiting => "waiting...",
            FixQuality::TwoD => "2D",
            FixQuality::ThreeD => "3D",
        }
    }

    pub fn has_fix(&self) -> bool {
        !matches!(self, FixQuality::Waiting)
    }
}

impl fmt::Display for FixQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_tokens_become_null() {
        assert_eq!(sanitize_nan(r#"{"a":NaN,"b":[NaN, 1]}"#), r#"{"a":null,"b":[null, 1]}"#);
        assert_eq!(sanitize_nan(r#"{"name":"NaNo","x":xNaN}"#), r#"{"name":"NaNo","x":xNaN}"#);
        assert_eq!(sanitize_nan("NaN"), "null");
    }

    #[test]
    fn status_reply_maps_python_booleans() {
        let running: StatusReply = serde_json::from_str(r#"{"status":"True"}"#).unwrap();
        let idle: StatusReply = serde_json::from_str(r#"{"status":"False"}"#).unwrap();
        let empty: StatusReply = serde_json::from_str("{}").unwrap();
        assert_eq!(running.server_status(), ServerStatus::Running);
        assert_eq!(idle.server_status(), ServerStatus::Idle);
        assert_eq!(empty.server_status(), ServerStatus::Idle);
    }

    #[test]
    fn empty_error_is_not_a_failure() {
        let ok: ApiReply = serde_json::from_str(r#"{"message":"done","error":""}"#).unwrap();
        let bad: ApiReply = serde_json::from_str(r#"{"error":"no such driver"}"#).unwrap();
        assert!(!ok.is_error());
        assert_eq!(bad.error_text(), Some("no such driver"));
    }

    #[test]
    fn setup_message_serializes_with_empty_params() {
        let json = ControlMessage::RemoteDashboardSetup.to_json().unwrap();
        assert_eq!(json, r#"{"event":"RemoteDashboardSetup","params":{}}"#);
    }

    #[test]
    fn decodes_known_and_unknown_events() {
        let polling = ControlMessage::from_text(
            r#"{"event":"RemotePolling","id":7,"status":0,"message":"","params":{"info":{"temp":NaN}}}"#,
        )
        .unwrap();
        assert!(polling.is_heartbeat());

        let guiding =
            ControlMessage::from_text(r#"{"event":"GuidingError","params":{"ra":0.5,"dec":-0.25}}"#)
                .unwrap();
        assert_eq!(guiding, ControlMessage::GuidingError { ra: 0.5, dec: -0.25 });

        let other = ControlMessage::from_text(r#"{"event":"SomethingNew","params":{"x":1}}"#).unwrap();
        assert_eq!(other.event(), "SomethingNew");
        assert!(matches!(other, ControlMessage::Unknown { .. }));
    }

    #[test]
    fn known_event_with_bad_params_is_rejected() {
        let err = ControlMessage::from_text(r#"{"event":"FocusHfd","params":{"hfd":"wide"}}"#)
            .unwrap_err();
        assert!(matches!(err, ControlDecodeError::Params { .. }));
    }

    #[test]
    fn connect_reply_reports_success_and_error() {
        let ok = ControlMessage::from_text(
            r#"{"event":"RemoteConnect","id":1,"status":0,"message":"ok","params":{}}"#,
        )
        .unwrap();
        let ControlMessage::RemoteConnect(reply) = ok else {
            panic!("expected RemoteConnect");
        };
        assert!(reply.succeeded());

        let bad = ControlMessage::from_text(
            r#"{"event":"RemoteConnect","status":1,"params":{"error":"timeout"}}"#,
        )
        .unwrap();
        let ControlMessage::RemoteConnect(reply) = bad else {
            panic!("expected RemoteConnect");
        };
        assert!(!reply.succeeded());
        assert_eq!(reply.error_text(), Some("timeout"));
    }

    #[test]
    fn partial_gps_sample_parses() {
        let sky: TelemetrySample = serde_json::from_str(
            r#"{"hdop":0.9,"vdop":1.2,"satellites":[{"PRN":5,"el":40,"az":120,"ss":33,"used":true}]}"#,
        )
        .unwrap();
        assert!(sky.latitude.is_none());
        assert_eq!(sky.satellites.as_ref().map(Vec::len), Some(1));
        assert_eq!(sky.satellites.unwrap()[0].prn, 5);
    }

    #[test]
    fn fix_quality_tiers() {
        assert_eq!(FixQuality::from_mode(0), FixQuality::Waiting);
        assert_eq!(FixQuality::from_mode(1), FixQuality::Waiting);
        assert_eq!(FixQuality::from_mode(2).as_str(), "2D");
        assert_eq!(FixQuality::from_mode(3).as_str(), "3D");
        assert!(FixQuality::from_mode(3).has_fix());
    }

    #[test]
    fn placeholder_values_read_as_absent() {
        let s: TelemetrySample = parse_lenient(
            r#"{"gpstime":"2024-03-05T07:04:09.000Z","latitude":-33.865,"longitude":151.209,
                "altitude":"n/a","mode":2,"hdop":"n/a","vdop":NaN,"sschart":"n/a"}"#,
        )
        .unwrap();
        assert_eq!(s.mode, Some(2));
        assert_eq!(s.latitude, Some(-33.865));
        assert_eq!(s.altitude, None);
        assert_eq!(s.hdop, None);
        assert_eq!(s.vdop, None);
        assert_eq!(s.sschart, None);
        assert!(s.gpstime.is_some());
    }

    #[test]
    fn bad_satellite_entries_are_skipped() {
        let s: TelemetrySample = serde_json::from_str(
            r#"{"satellites":[{"PRN":5,"el":"n/a","az":120,"ss":33,"used":true},"junk",{"el":3}]}"#,
        )
        .unwrap();
        let sats = s.satellites.unwrap();
        assert_eq!(sats.len(), 1);
        assert_eq!(sats[0].prn, 5);
        assert_eq!(sats[0].el, None);
    }
}
