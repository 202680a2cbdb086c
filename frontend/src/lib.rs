// frontend/src/lib.rs
//
// Headless observatory dashboard client: device server status and tools API,
// the control channel, the GPS telemetry push channel, chart buffers and the
// sky map overlay.

pub mod api;
pub mod charts;
pub mod config;
pub mod control;
pub mod dashboard;
pub mod error;
pub mod notify;
pub mod skymap;
pub mod status;
pub mod telemetry;
pub mod tools;

pub use dashboard::{Command, Dashboard, DashboardEvent};
pub use error::{DashboardError, Result};
