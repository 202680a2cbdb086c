// frontend/src/api.rs
//
// Request/response calls against the device server. Every reply may carry
// `{message?, error?}`; a non-empty `error` fails the call even on HTTP 200.

use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use observatory_shared::{ApiReply, DeviceSelection, ServerStatus, StatusReply, parse_lenient};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const START_PATH: &str = "/devices/api/start";
pub const STOP_PATH: &str = "/devices/api/stop";
pub const STATUS_PATH: &str = "/devices/api/status";
pub const DRIVERS_PATH: &str = "/devices/api/drivers";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Astrometry,
    Astap,
}

impl SolverKind {
    /// Anything that is not `astrometry` is checked as ASTAP.
    pub fn from_selection(s: &str) -> Self {
        if s == "astrometry" {
            SolverKind::Astrometry
        } else {
            SolverKind::Astap
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Astrometry => "astrometry",
            SolverKind::Astap => "astap",
        }
    }
}

/// Device server lifecycle calls used by the status poller.
#[async_trait]
pub trait DeviceService: Send + Sync {
    async fn start(&self, selection: &DeviceSelection) -> Result<()>;
    async fn stop(&self) -> Result<()>;
    async fn status(&self) -> Result<ServerStatus>;
    async fn drivers(&self) -> Result<Vec<String>>;
}

/// Tool endpoints: time/location sync and solver template checks.
#[async_trait]
pub trait ToolsService: Send + Sync {
    async fn sync_time(&self, timestamp: &str) -> Result<Option<String>>;
    async fn sync_location(&self, lon: &str, lat: &str) -> Result<Option<String>>;
    async fn solver_templates_present(&self, solver: SolverKind) -> Result<Option<String>>;
}

#[derive(Debug, Clone)]
pub struct HttpApi {
    base: String,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_http: &str) -> Result<Self> {
        let parsed = Url::parse(base_http)?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base: parsed.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base)
        } else {
            format!("{}/{path}", self.base)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await?
            .error_for_status()?;
        let text = resp.text().await?;
        Ok(parse_lenient(&text)?)
    }

    async fn read_reply(resp: reqwest::Response) -> Result<ApiReply> {
        let resp = resp.error_for_status()?;
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(ApiReply::default());
        }
        match parse_lenient::<ApiReply>(&text) {
            Ok(reply) => Ok(reply),
            Err(e) => {
                tracing::debug!("[HTTP] non-JSON reply treated as success: {e}");
                Ok(ApiReply::default())
            }
        }
    }

    async fn get_reply(&self, path: &str) -> Result<Option<String>> {
        let resp = self.client.get(self.url(path)).send().await?;
        check_reply(Self::read_reply(resp).await?)
    }
}

pub fn check_reply(reply: ApiReply) -> Result<Option<String>> {
    if let Some(err) = reply.error_text() {
        return Err(DashboardError::Server(err.to_string()));
    }
    Ok(reply.message)
}

/// Best-effort list of driver ids out of whatever `/devices/api/drivers` returns:
/// a bare list, `{"drivers": [...]}`, or a map keyed by slot.
pub fn driver_ids(v: &Value) -> Vec<String> {
    fn name_of(item: &Value) -> Option<String> {
        match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(o) => o
                .get("name")
                .or_else(|| o.get("label"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }

    match v {
        Value::Array(items) => items.iter().filter_map(name_of).collect(),
        Value::Object(o) => {
            if let Some(list) = o.get("drivers") {
                return driver_ids(list);
            }
            o.iter()
                .filter(|(k, _)| k.as_str() != "message" && k.as_str() != "error")
                .filter_map(|(_, item)| name_of(item))
                .collect()
        }
        _ => Vec::new(),
    }
}

#[async_trait]
impl DeviceService for HttpApi {
    async fn start(&self, selection: &DeviceSelection) -> Result<()> {
        let resp = self
            .client
            .post(self.url(START_PATH))
            .json(selection)
            .send()
            .await?;
        check_reply(Self::read_reply(resp).await?).map(|_| ())
    }

    async fn stop(&self) -> Result<()> {
        self.get_reply(STOP_PATH).await.map(|_| ())
    }

    async fn status(&self) -> Result<ServerStatus> {
        let reply: StatusReply = self.get_json(STATUS_PATH).await?;
        Ok(reply.server_status())
    }

    async fn drivers(&self) -> Result<Vec<String>> {
        let v: Value = self.get_json(DRIVERS_PATH).await?;
        if let Some(err) = v.get("error").and_then(Value::as_str).filter(|e| !e.is_empty()) {
            return Err(DashboardError::Server(err.to_string()));
        }
        Ok(driver_ids(&v))
    }
}

#[async_trait]
impl ToolsService for HttpApi {
    async fn sync_time(&self, timestamp: &str) -> Result<Option<String>> {
        self.get_reply(&format!("/tools/api/time/{timestamp}")).await
    }

    async fn sync_location(&self, lon: &str, lat: &str) -> Result<Option<String>> {
        self.get_reply(&format!("/tools/api/location/{lon}/{lat}")).await
    }

    async fn solver_templates_present(&self, solver: SolverKind) -> Result<Option<String>> {
        self.get_reply(&format!("/tools/api/download/{}/already", solver.as_str()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_selection_defaults_to_astap() {
        assert_eq!(SolverKind::from_selection("astrometry"), SolverKind::Astrometry);
        assert_eq!(SolverKind::from_selection("astap"), SolverKind::Astap);
        assert_eq!(SolverKind::from_selection(""), SolverKind::Astap);
    }

    #[test]
    fn driver_ids_accepts_common_shapes() {
        let list = serde_json::json!(["indi_simulator_ccd", "indi_simulator_telescope"]);
        assert_eq!(driver_ids(&list).len(), 2);

        let wrapped = serde_json::json!({"drivers": [{"name": "CCD Simulator"}]});
        assert_eq!(driver_ids(&wrapped), vec!["CCD Simulator".to_string()]);

        let by_slot = serde_json::json!({"camera": "CCD Simulator", "message": "ok"});
        assert_eq!(driver_ids(&by_slot), vec!["CCD Simulator".to_string()]);
    }

    #[test]
    fn error_field_fails_reply() {
        let err = check_reply(ApiReply {
            message: None,
            error: Some("busy".into()),
        })
        .unwrap_err();
        assert!(matches!(err, DashboardError::Server(ref m) if m == "busy"));

        let ok = check_reply(ApiReply {
            message: Some("synced".into()),
            error: Some(String::new()),
        })
        .unwrap();
        assert_eq!(ok.as_deref(), Some("synced"));
    }

    #[test]
    fn base_url_is_validated() {
        assert!(HttpApi::new("not a url").is_err());
        let api = HttpApi::new("http://localhost:8000/").unwrap();
        assert_eq!(api.url(STATUS_PATH), "http://localhost:8000/devices/api/status");
    }
}
