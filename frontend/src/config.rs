// frontend/src/config.rs

use crate::error::{DashboardError, Result};
use crate::skymap::SkyMapConfig;
use observatory_shared::DeviceSelection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.json";
pub const CONFIG_ENV: &str = "OBS_DASHBOARD_CONFIG";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_CONTROL_URL: &str = "ws://localhost:5000";
pub const DEFAULT_TELEMETRY_PATH: &str = "/socket.io/";

/// Points kept per chart series.
pub const DEFAULT_CHART_WINDOW: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub guiding_window: usize,
    pub focus_window: usize,
    pub cooling_window: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            guiding_window: DEFAULT_CHART_WINDOW,
            focus_window: DEFAULT_CHART_WINDOW,
            cooling_window: DEFAULT_CHART_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub base_url: String,
    pub control_url: String,
    pub telemetry_path: String,
    pub charts: ChartConfig,
    pub skymap: SkyMapConfig,
    pub devices: DeviceSelection,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            control_url: DEFAULT_CONTROL_URL.to_string(),
            telemetry_path: DEFAULT_TELEMETRY_PATH.to_string(),
            charts: ChartConfig::default(),
            skymap: SkyMapConfig::default(),
            devices: DeviceSelection::default(),
        }
    }
}

impl DashboardConfig {
    pub fn base_http(&self) -> String {
        let base = normalize_base_url(self.base_url.clone());
        if base.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            base
        }
    }

    /// Returns ws/wss scheme + host[:port] (no path).
    pub fn base_ws(&self) -> String {
        http_to_ws(&self.base_http())
    }

    /// Socket.IO websocket-transport URL of the telemetry push channel.
    pub fn telemetry_ws_url(&self) -> String {
        let path = self.telemetry_path.trim_end_matches('/');
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        format!("{}{path}/?EIO=4&transport=websocket", self.base_ws())
    }
}

/// Explicit path (CLI) wins, then the env var, then the default location.
pub fn config_path(explicit: Option<&Path>) -> (PathBuf, bool) {
    if let Some(path) = explicit {
        return (path.to_path_buf(), true);
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return (PathBuf::from(path), true);
    }
    (PathBuf::from(DEFAULT_CONFIG_PATH), false)
}

/// A missing file is only an error when the path was asked for explicitly.
pub fn load_config(explicit: Option<&Path>) -> Result<DashboardConfig> {
    let (path, required) = config_path(explicit);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            tracing::debug!("[CONFIG] {path:?} not found, using defaults");
            return Ok(DashboardConfig::default());
        }
        Err(e) => {
            return Err(DashboardError::Config(format!(
                "failed to read config file {path:?}: {e}"
            )));
        }
    };
    serde_json::from_str(&raw)
        .map_err(|e| DashboardError::Config(format!("invalid config JSON in {path:?}: {e}")))
}

pub fn normalize_base_url(mut url: String) -> String {
    if let Some(idx) = url.find('#') {
        url.truncate(idx);
    }
    if let Some(scheme_end) = url.find("://") {
        let rest = &url[scheme_end + 3..];
        if let Some(slash) = rest.find('/') {
            url.truncate(scheme_end + 3 + slash);
        }
    }
    url.trim().trim_end_matches('/').to_string()
}

pub fn http_to_ws(base_http: &str) -> String {
    let base_http = base_http.trim_end_matches('/');

    if let Some(rest) = base_http.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_http.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if base_http.starts_with("wss://") || base_http.starts_with("ws://") {
        base_http.to_string()
    } else {
        format!("ws://{base_http}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_path_fragment_and_slash() {
        assert_eq!(
            normalize_base_url("http://scope.local:8000/devices/#tab".into()),
            "http://scope.local:8000"
        );
        assert_eq!(normalize_base_url("http://host/".into()), "http://host");
        assert_eq!(normalize_base_url("host:8000".into()), "host:8000");
    }

    #[test]
    fn ws_scheme_follows_http_scheme() {
        assert_eq!(http_to_ws("https://obs.example"), "wss://obs.example");
        assert_eq!(http_to_ws("http://localhost:8000/"), "ws://localhost:8000");
        assert_eq!(http_to_ws("ws://already"), "ws://already");
        assert_eq!(http_to_ws("bare:9000"), "ws://bare:9000");
    }

    #[test]
    fn urls_are_built_from_base() {
        let cfg = DashboardConfig {
            base_url: "http://pi.local:8000/".into(),
            ..DashboardConfig::default()
        };
        assert_eq!(cfg.base_http(), "http://pi.local:8000");
        assert_eq!(
            cfg.telemetry_ws_url(),
            "ws://pi.local:8000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: DashboardConfig =
            serde_json::from_str(r#"{"control_url":"ws://10.0.0.2:5000","charts":{"focus_window":20}}"#)
                .unwrap();
        assert_eq!(cfg.control_url, "ws://10.0.0.2:5000");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.charts.focus_window, 20);
        assert_eq!(cfg.charts.guiding_window, DEFAULT_CHART_WINDOW);
    }

    #[test]
    fn file_selection_is_taken_as_is() {
        let path = std::env::temp_dir().join(format!("obs-dashboard-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"base_url":"http://scope.local:8000/","devices":{"camera":"CCD Simulator"}}"#,
        )
        .unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(cfg.base_http(), "http://scope.local:8000");
        assert_eq!(
            cfg.devices,
            DeviceSelection {
                camera: Some("CCD Simulator".into()),
                ..DeviceSelection::default()
            }
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let missing = std::env::temp_dir().join("obs-dashboard-does-not-exist.json");
        assert!(matches!(
            load_config(Some(&missing)),
            Err(DashboardError::Config(_))
        ));
    }
}
