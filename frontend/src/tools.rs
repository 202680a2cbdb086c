// frontend/src/tools.rs
//
// Time/location sync and solver template checks.

use crate::api::{SolverKind, ToolsService};
use crate::error::DashboardError;
use crate::notify::Notifications;
use chrono::{Datelike, Local, NaiveDateTime, Timelike};

/// Browser-style geolocation failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationError {
    pub code: u16,
}

impl GeolocationError {
    pub const PERMISSION_DENIED: u16 = 1;
    pub const POSITION_UNAVAILABLE: u16 = 2;
    pub const TIMEOUT: u16 = 3;

    pub fn new(code: u16) -> Self {
        Self { code }
    }

    pub fn message(&self) -> &'static str {
        match self.code {
            Self::PERMISSION_DENIED => "Positioning function rejected",
            Self::POSITION_UNAVAILABLE => "Unable to obtain location information temporarily",
            Self::TIMEOUT => "Get information timeout",
            _ => "Unknown error",
        }
    }
}

/// `Y:M:D-h:m:s`, no zero padding.
pub fn format_sync_time(t: &NaiveDateTime) -> String {
    format!(
        "{}:{}:{}-{}:{}:{}",
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    )
}

pub fn local_sync_time() -> String {
    format_sync_time(&Local::now().naive_local())
}

/// A server refusal is shown as sent, anything else never reached the server.
fn request_failure(e: &DashboardError) -> String {
    match e {
        DashboardError::Server(msg) => msg.clone(),
        other => format!("Failed to send request to server: {other}"),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolsPanel {
    pub time: String,
    pub longitude: String,
    pub latitude: String,
    pub time_info: String,
    pub time_error: String,
    pub location_info: String,
    pub location_error: String,
    pub solver_info: String,
}

impl ToolsPanel {
    pub fn reset_time(&mut self) {
        self.time.clear();
        self.time_info.clear();
        self.time_error.clear();
    }

    pub fn reset_location(&mut self) {
        self.longitude.clear();
        self.latitude.clear();
        self.location_info.clear();
        self.location_error.clear();
    }

    /// Fills the time field with the current local time.
    pub fn fill_time(&mut self, timestamp: String) {
        self.time = timestamp;
    }

    pub fn fill_position(&mut self, lon: f64, lat: f64) {
        self.longitude = lon.to_string();
        self.latitude = lat.to_string();
        self.location_error.clear();
    }

    pub fn on_geolocation_error(&mut self, err: GeolocationError, notes: &mut Notifications) {
        tracing::warn!("[TOOLS] geolocation failed with code {}", err.code);
        self.location_error = err.message().to_string();
        notes.on_error(DashboardError::Geolocation(err).to_string());
    }

    /// Sends the time field, or the current local time when it is empty.
    pub async fn sync_time(&mut self, api: &dyn ToolsService, notes: &mut Notifications) {
        if self.time.trim().is_empty() {
            self.fill_time(local_sync_time());
        }
        tracing::info!("[TOOLS] syncing time {}", self.time);

        match api.sync_time(self.time.trim()).await {
            Ok(msg) => {
                self.time_error.clear();
                self.time_info = msg.unwrap_or_default();
            }
            Err(e) => {
                self.time_info.clear();
                self.time_error = e.to_string();
                notes.on_error(request_failure(&e));
            }
        }
    }

    pub async fn sync_location(&mut self, api: &dyn ToolsService, notes: &mut Notifications) {
        let lon = self.longitude.trim().to_string();
        let lat = self.latitude.trim().to_string();
        if lon.is_empty() || lat.is_empty() {
            self.location_error = "Longitude and latitude are required".to_string();
            return;
        }
        tracing::info!("[TOOLS] syncing location lon={lon} lat={lat}");

        match api.sync_location(&lon, &lat).await {
            Ok(msg) => {
                self.location_error.clear();
                self.location_info = msg.unwrap_or_default();
            }
            Err(e) => {
                self.location_info.clear();
                self.location_error = e.to_string();
                notes.on_error(request_failure(&e));
            }
        }
    }

    /// Returns whether the selected solver's templates are installed.
    pub async fn check_solver(
        &mut self,
        api: &dyn ToolsService,
        selection: &str,
        notes: &mut Notifications,
    ) -> bool {
        let solver = SolverKind::from_selection(selection);
        match api.solver_templates_present(solver).await {
            Ok(msg) => {
                tracing::info!("[TOOLS] {} templates present", solver.as_str());
                self.solver_info = msg.unwrap_or_default();
                true
            }
            Err(e) => {
                tracing::warn!("[TOOLS] {} templates check failed: {e}", solver.as_str());
                self.solver_info.clear();
                notes.on_error(e.to_string());
                false
            }
        }
    }
}
