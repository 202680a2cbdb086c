// frontend/src/telemetry/mod.rs
//
// GPS telemetry push channel: Engine.IO framing, the subscriber task and the
// GPS panel view model it feeds.

pub mod dms;
pub mod engineio;
pub mod gps;
pub mod subscriber;

pub use dms::to_dms;
pub use gps::{GpsPanel, MapMarker};
pub use subscriber::{TelemetryEvent, TelemetrySubscriber};
