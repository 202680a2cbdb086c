// frontend/src/status.rs
//
// Device server status poller and the start/stop button state machine:
//   Idle -> Starting -> Running -> Stopping -> Idle
// Transitions are confirmed by the server's reply, never optimistically.

use crate::api::DeviceService;
use crate::notify::Notifications;
use observatory_shared::{DeviceSelection, ServerStatus};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    Idle,
    Starting,
    Running,
    Stopping,
}

/// What the poller observed or what a start/stop request returned.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    Polled {
        status: ServerStatus,
        drivers: Vec<String>,
    },
    PollFailed(String),
    DriversFailed(String),
    StartSucceeded,
    StartFailed(String),
    StopSucceeded,
    StopFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleAction {
    Start(DeviceSelection),
    Stop,
}

#[derive(Debug, Clone)]
pub struct ServerPanel {
    pub phase: ServerPhase,
    pub notify: String,
    pub drivers: Vec<String>,
    /// The control-channel button is only usable while the server runs.
    pub control_enabled: bool,
}

impl Default for ServerPanel {
    fn default() -> Self {
        Self {
            phase: ServerPhase::Idle,
            notify: String::new(),
            drivers: Vec::new(),
            control_enabled: false,
        }
    }
}

impl ServerPanel {
    pub fn button_label(&self) -> &'static str {
        match self.phase {
            ServerPhase::Idle => "Start",
            ServerPhase::Starting => "Starting...",
            ServerPhase::Running => "Stop",
            ServerPhase::Stopping => "Stopping...",
        }
    }

    pub fn button_class(&self) -> &'static str {
        match self.phase {
            ServerPhase::Idle | ServerPhase::Starting => "btn-outline-primary",
            ServerPhase::Running | ServerPhase::Stopping => "btn-outline-info",
        }
    }

    /// Click on the server button. Returns the request to issue, or `None`
    /// while a previous request is still in flight.
    pub fn begin_toggle(
        &mut self,
        selection: &DeviceSelection,
        notes: &mut Notifications,
    ) -> Option<ToggleAction> {
        match self.phase {
            ServerPhase::Idle => {
                self.phase = ServerPhase::Starting;
                notes.on_info("Connecting, please wait...");
                Some(ToggleAction::Start(selection.clone()))
            }
            ServerPhase::Running => {
                self.phase = ServerPhase::Stopping;
                Some(ToggleAction::Stop)
            }
            ServerPhase::Starting | ServerPhase::Stopping => {
                tracing::debug!("[STATUS] toggle ignored, request in flight ({:?})", self.phase);
                None
            }
        }
    }

    fn render_idle(&mut self, notify: &str) {
        self.phase = ServerPhase::Idle;
        self.notify = notify.to_string();
        self.drivers.clear();
        self.control_enabled = false;
    }

    fn render_running(&mut self, drivers: Vec<String>) {
        self.phase = ServerPhase::Running;
        self.notify = "Devices started successfully!".to_string();
        self.drivers = drivers;
        self.control_enabled = true;
    }

    /// Applies one event. Returns `true` when the status should be polled again.
    pub fn apply(&mut self, event: StatusEvent, notes: &mut Notifications) -> bool {
        match event {
            StatusEvent::Polled {
                status: ServerStatus::Running,
                drivers,
            } => {
                self.render_running(drivers);
                false
            }
            StatusEvent::Polled {
                status: ServerStatus::Idle,
                ..
            } => {
                self.render_idle("Server is idle");
                false
            }
            StatusEvent::PollFailed(e) => {
                tracing::warn!("[STATUS] status poll failed: {e}");
                self.render_idle("Server status unknown");
                false
            }
            StatusEvent::DriversFailed(e) => {
                // status already said running, only the list is missing
                tracing::warn!("[STATUS] driver list failed: {e}");
                let drivers = std::mem::take(&mut self.drivers);
                self.render_running(drivers);
                false
            }
            StatusEvent::StartSucceeded => {
                notes.on_info_hide();
                true
            }
            StatusEvent::StartFailed(e) => {
                notes.on_info_hide();
                notes.on_error(format!("Failed to start devices: {e}"));
                self.phase = ServerPhase::Idle;
                false
            }
            StatusEvent::StopSucceeded => true,
            StatusEvent::StopFailed(e) => {
                notes.on_error(format!("Failed to stop devices: {e}"));
                self.phase = ServerPhase::Running;
                false
            }
        }
    }
}

#[derive(Clone)]
pub struct StatusPoller {
    service: Arc<dyn DeviceService>,
}

impl StatusPoller {
    pub fn new(service: Arc<dyn DeviceService>) -> Self {
        Self { service }
    }

    /// Status, then the active driver list when the server runs.
    pub async fn poll(&self) -> StatusEvent {
        let status = match self.service.status().await {
            Ok(s) => s,
            Err(e) => return StatusEvent::PollFailed(e.to_string()),
        };
        tracing::debug!("[STATUS] server is {status}");

        match status {
            ServerStatus::Idle => StatusEvent::Polled {
                status,
                drivers: Vec::new(),
            },
            ServerStatus::Running => match self.service.drivers().await {
                Ok(drivers) => StatusEvent::Polled { status, drivers },
                Err(e) => StatusEvent::DriversFailed(e.to_string()),
            },
        }
    }

    pub async fn execute(&self, action: ToggleAction) -> StatusEvent {
        match action {
            ToggleAction::Start(selection) => match self.service.start(&selection).await {
                Ok(()) => StatusEvent::StartSucceeded,
                Err(e) => StatusEvent::StartFailed(e.to_string()),
            },
            ToggleAction::Stop => match self.service.stop().await {
                Ok(()) => StatusEvent::StopSucceeded,
                Err(e) => StatusEvent::StopFailed(e.to_string()),
            },
        }
    }
}
