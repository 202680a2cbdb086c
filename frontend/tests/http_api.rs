// frontend/tests/http_api.rs
//
// Device server and tools endpoints against a fake axum server.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use observatory_frontend::api::{DeviceService, HttpApi, SolverKind, ToolsService};
use observatory_frontend::config::DashboardConfig;
use observatory_frontend::notify::Notifications;
use observatory_frontend::status::{ServerPhase, StatusEvent, StatusPoller};
use observatory_frontend::tools::ToolsPanel;
use observatory_frontend::{Command, Dashboard};
use observatory_shared::{DeviceSelection, ServerStatus};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeServer {
    running: bool,
    last_start: Option<Value>,
    last_time: Option<String>,
    last_location: Option<(String, String)>,
}

type Shared = Arc<Mutex<FakeServer>>;

async fn status(State(s): State<Shared>) -> Json<Value> {
    let running = s.lock().unwrap().running;
    Json(json!({ "status": if running { "True" } else { "False" } }))
}

async fn start(State(s): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut s = s.lock().unwrap();
    s.last_start = Some(body.clone());
    if body["camera"] == "missing" {
        return Json(json!({ "error": "driver not found" }));
    }
    s.running = true;
    Json(json!({ "message": "started", "error": "" }))
}

async fn stop(State(s): State<Shared>) -> Json<Value> {
    s.lock().unwrap().running = false;
    Json(json!({ "message": "stopped" }))
}

async fn drivers() -> Json<Value> {
    Json(json!({ "drivers": [{ "name": "CCD Simulator" }, { "name": "Telescope Simulator" }] }))
}

async fn time(State(s): State<Shared>, Path(ts): Path<String>) -> Json<Value> {
    s.lock().unwrap().last_time = Some(ts.clone());
    Json(json!({ "message": format!("time set to {ts}") }))
}

async fn location(
    State(s): State<Shared>,
    Path((lon, lat)): Path<(String, String)>,
) -> Json<Value> {
    s.lock().unwrap().last_location = Some((lon, lat));
    Json(json!({ "message": "location saved" }))
}

async fn templates(Path(solver): Path<String>) -> Json<Value> {
    if solver == "astrometry" {
        Json(json!({ "message": "index files present" }))
    } else {
        Json(json!({ "error": "ASTAP templates missing" }))
    }
}

async fn spawn_server(state: Shared) -> String {
    let app = Router::new()
        .route("/devices/api/status", get(status))
        .route("/devices/api/start", post(start))
        .route("/devices/api/stop", get(stop))
        .route("/devices/api/drivers", get(drivers))
        .route("/tools/api/time/{ts}", get(time))
        .route("/tools/api/location/{lon}/{lat}", get(location))
        .route("/tools/api/download/{solver}/already", get(templates))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn status_false_renders_idle() {
    let state = Shared::default();
    let base = spawn_server(state).await;
    let api = HttpApi::new(&base).unwrap();
    assert_eq!(api.status().await.unwrap(), ServerStatus::Idle);

    let mut dash = Dashboard::new(DashboardConfig::default());
    let poller = StatusPoller::new(Arc::new(api));
    dash.handle(poller.poll().await.into());
    assert_eq!(dash.server.phase, ServerPhase::Idle);
    assert!(!dash.channel.enabled);
}

#[tokio::test]
async fn status_true_with_drivers_renders_running() {
    let state = Shared::default();
    state.lock().unwrap().running = true;
    let base = spawn_server(state).await;
    let poller = StatusPoller::new(Arc::new(HttpApi::new(&base).unwrap()));

    let ev = poller.poll().await;
    assert_eq!(
        ev,
        StatusEvent::Polled {
            status: ServerStatus::Running,
            drivers: vec!["CCD Simulator".into(), "Telescope Simulator".into()],
        }
    );

    let mut dash = Dashboard::new(DashboardConfig::default());
    dash.handle(ev.into());
    assert_eq!(dash.server.button_label(), "Stop");
    assert!(dash.channel.enabled);
}

#[tokio::test]
async fn start_then_stop_round_trip() {
    let state = Shared::default();
    let base = spawn_server(state.clone()).await;
    let poller = StatusPoller::new(Arc::new(HttpApi::new(&base).unwrap()));

    let mut cfg = DashboardConfig::default();
    cfg.devices = DeviceSelection {
        camera: Some("CCD Simulator".into()),
        telescope: Some("Telescope Simulator".into()),
        ..DeviceSelection::default()
    };
    let mut dash = Dashboard::new(cfg);

    let action = dash.toggle_server().unwrap();
    assert!(dash.notes.info.shown);
    let cmds = dash.handle(poller.execute(action).await.into());
    assert_eq!(cmds, vec![Command::PollStatus]);
    dash.handle(poller.poll().await.into());
    assert_eq!(dash.server.phase, ServerPhase::Running);
    assert!(!dash.notes.info.shown);

    let sent = state.lock().unwrap().last_start.clone().unwrap();
    assert_eq!(sent["camera"], "CCD Simulator");
    assert_eq!(sent["telescope"], "Telescope Simulator");
    assert!(sent.get("focuser").is_none());

    let action = dash.toggle_server().unwrap();
    let cmds = dash.handle(poller.execute(action).await.into());
    assert_eq!(cmds, vec![Command::PollStatus]);
    dash.handle(poller.poll().await.into());
    assert_eq!(dash.server.phase, ServerPhase::Idle);
    assert!(!dash.notes.error.shown);
}

#[tokio::test]
async fn error_field_fails_start() {
    let state = Shared::default();
    let base = spawn_server(state.clone()).await;
    let api = HttpApi::new(&base).unwrap();

    let selection = DeviceSelection {
        camera: Some("missing".into()),
        ..DeviceSelection::default()
    };
    let err = api.start(&selection).await.unwrap_err();
    assert_eq!(err.to_string(), "driver not found");
    assert!(!state.lock().unwrap().running);

    let poller = StatusPoller::new(Arc::new(api));
    let mut cfg = DashboardConfig::default();
    cfg.devices = selection;
    let mut dash = Dashboard::new(cfg);
    let action = dash.toggle_server().unwrap();
    dash.handle(poller.execute(action).await.into());
    assert_eq!(dash.server.phase, ServerPhase::Idle);
    assert_eq!(
        dash.notes.last_error(),
        Some("Failed to start devices: driver not found")
    );
}

#[tokio::test]
async fn unreachable_server_polls_as_idle_without_modal() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let poller = StatusPoller::new(Arc::new(HttpApi::new(&format!("http://{addr}")).unwrap()));
    let ev = poller.poll().await;
    assert!(matches!(ev, StatusEvent::PollFailed(_)));

    let mut dash = Dashboard::new(DashboardConfig::default());
    dash.handle(ev.into());
    assert_eq!(dash.server.phase, ServerPhase::Idle);
    assert!(!dash.notes.error.shown);
}

#[tokio::test]
async fn tools_endpoints() {
    let state = Shared::default();
    let base = spawn_server(state.clone()).await;
    let api = HttpApi::new(&base).unwrap();

    let msg = api.sync_time("2024:3:5-7:4:9").await.unwrap();
    assert_eq!(msg.as_deref(), Some("time set to 2024:3:5-7:4:9"));
    assert_eq!(state.lock().unwrap().last_time.as_deref(), Some("2024:3:5-7:4:9"));

    let mut panel = ToolsPanel::default();
    let mut notes = Notifications::default();
    panel.fill_position(151.209, -33.865);
    panel.sync_location(&api, &mut notes).await;
    assert_eq!(panel.location_info, "location saved");
    assert_eq!(
        state.lock().unwrap().last_location,
        Some(("151.209".to_string(), "-33.865".to_string()))
    );

    assert!(api.solver_templates_present(SolverKind::Astrometry).await.is_ok());
    assert!(panel.check_solver(&api, "astrometry", &mut notes).await);
    assert!(!panel.check_solver(&api, "astap", &mut notes).await);
    assert_eq!(notes.last_error(), Some("ASTAP templates missing"));
}
