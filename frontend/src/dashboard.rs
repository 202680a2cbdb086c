// frontend/src/dashboard.rs
//
// The dashboard view state and its event handlers. Every source (status
// poller, control channel, telemetry push) delivers typed events here; the
// handlers are plain methods so they can be driven without any transport.

use crate::charts::Charts;
use crate::config::DashboardConfig;
use crate::control::{ChannelEvent, ChannelPanel, ChannelState};
use crate::notify::Notifications;
use crate::skymap::SkyMap;
use crate::status::{ServerPanel, StatusEvent, ToggleAction};
use crate::telemetry::{GpsPanel, TelemetryEvent};
use crate::tools::ToolsPanel;
use observatory_shared::{ControlMessage, ControlReply};

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    Status(StatusEvent),
    Channel(ChannelEvent),
    Telemetry(TelemetryEvent),
}

impl From<StatusEvent> for DashboardEvent {
    fn from(ev: StatusEvent) -> Self {
        DashboardEvent::Status(ev)
    }
}

impl From<ChannelEvent> for DashboardEvent {
    fn from(ev: ChannelEvent) -> Self {
        DashboardEvent::Channel(ev)
    }
}

impl From<TelemetryEvent> for DashboardEvent {
    fn from(ev: TelemetryEvent) -> Self {
        DashboardEvent::Telemetry(ev)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    Connect,
    Disconnect,
}

/// Follow-up work a handler asks the runtime to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PollStatus,
}

pub struct Dashboard {
    pub config: DashboardConfig,
    pub server: ServerPanel,
    pub channel: ChannelPanel,
    pub gps: GpsPanel,
    pub tools: ToolsPanel,
    pub charts: Charts,
    pub skymap: SkyMap,
    pub notes: Notifications,
    pub telemetry_online: bool,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let charts = Charts::new(&config.charts);
        let skymap = SkyMap::configure(config.skymap.clone());
        Self {
            config,
            server: ServerPanel::default(),
            channel: ChannelPanel::default(),
            gps: GpsPanel::default(),
            tools: ToolsPanel::default(),
            charts,
            skymap,
            notes: Notifications::default(),
            telemetry_online: false,
        }
    }

    /// Server button click.
    pub fn toggle_server(&mut self) -> Option<ToggleAction> {
        self.server.begin_toggle(&self.config.devices, &mut self.notes)
    }

    /// Control button click. `None` while the button is disabled or a
    /// connect is already in progress.
    pub fn toggle_channel(&mut self) -> Option<ChannelAction> {
        match self.channel.state {
            ChannelState::Disconnected if self.channel.enabled => {
                self.channel.connecting();
                Some(ChannelAction::Connect)
            }
            ChannelState::Disconnected => {
                tracing::debug!("[CTRL] connect refused, device server not running");
                None
            }
            ChannelState::Connecting => None,
            ChannelState::Connected => Some(ChannelAction::Disconnect),
        }
    }

    pub fn handle(&mut self, event: DashboardEvent) -> Vec<Command> {
        match event {
            DashboardEvent::Status(ev) => self.on_status(ev),
            DashboardEvent::Channel(ev) => {
                self.on_channel(ev);
                Vec::new()
            }
            DashboardEvent::Telemetry(ev) => {
                self.on_telemetry(ev);
                Vec::new()
            }
        }
    }

    pub fn on_status(&mut self, ev: StatusEvent) -> Vec<Command> {
        let repoll = self.server.apply(ev, &mut self.notes);
        self.channel.enabled = self.server.control_enabled;
        if repoll {
            vec![Command::PollStatus]
        } else {
            Vec::new()
        }
    }

    pub fn on_channel(&mut self, ev: ChannelEvent) {
        self.channel.apply(&ev, &mut self.notes);
        if let ChannelEvent::Message(msg) = ev {
            self.on_control_message(msg);
        }
    }

    pub fn on_control_message(&mut self, msg: ControlMessage) {
        if self.charts.ingest(&msg) {
            return;
        }
        match &msg {
            ControlMessage::RemoteConnect(reply)
            | ControlMessage::RemoteDisconnect(reply)
            | ControlMessage::RemoteReconnect(reply)
            | ControlMessage::RemoteScanning(reply) => {
                self.on_reply(msg.event(), reply);
            }
            ControlMessage::RemotePolling(_) => {
                // filtered by the channel reader
                tracing::trace!("[CTRL] heartbeat reached dashboard");
            }
            ControlMessage::RemoteDashboardSetup => {}
            ControlMessage::Unknown { event, .. } => {
                tracing::debug!("[CTRL] unhandled event {event}");
            }
            ControlMessage::GuidingError { .. }
            | ControlMessage::FocusHfd { .. }
            | ControlMessage::CoolingStatus { .. } => {}
        }
    }

    fn on_reply(&mut self, event: &str, reply: &ControlReply) {
        if let Some(message) = reply.message.as_deref().filter(|m| !m.is_empty()) {
            self.notes.log_text(message);
        }
        if !reply.succeeded() {
            let detail = reply
                .error_text()
                .or(reply.message.as_deref())
                .unwrap_or("no details");
            tracing::warn!("[CTRL] {event} failed: {detail}");
            self.notes.on_error(format!("{event} failed: {detail}"));
        } else {
            tracing::info!("[CTRL] {event} ok");
        }
    }

    pub fn on_telemetry(&mut self, ev: TelemetryEvent) {
        match ev {
            TelemetryEvent::Connected => {
                self.telemetry_online = true;
            }
            TelemetryEvent::Disconnected(reason) => {
                self.telemetry_online = false;
                if let Some(reason) = reason {
                    tracing::debug!("[GPS] telemetry offline: {reason}");
                }
            }
            TelemetryEvent::Sample(sample) => self.gps.apply(&sample),
        }
    }
}
