//! Control-plane doubles shared by the unit tests.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use chrono::{Local, TimeZone, Utc};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::GatherError;
use crate::ocp::{
    ControlPlane, Credentials, ReportEntry, ReportRequest, SnapshotEntry, SubmittedReport, Target,
    TaskStatus,
};
use crate::timeutil::parse_datetime;

pub const FAKE_TASK_ID: i64 = 42;

/// Encode a local wall-clock time the way the control plane reports it.
pub fn utc_stamp(local: &str) -> String {
    let naive = parse_datetime(local).unwrap();
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap()
        .with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

pub struct FakeControlPlane {
    snapshots: Vec<SnapshotEntry>,
    snapshot_error: Option<String>,
    submission_error: Option<String>,
    download_error: Option<String>,
    register_reports: bool,
    task_stuck: bool,
    report_body: Vec<u8>,
    reports: Mutex<Vec<ReportEntry>>,
    task_statuses: Mutex<VecDeque<TaskStatus>>,
    submissions: Mutex<Vec<ReportRequest>>,
    task_polls: AtomicUsize,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self {
            snapshots: Vec::new(),
            snapshot_error: None,
            submission_error: None,
            download_error: None,
            register_reports: true,
            task_stuck: false,
            report_body: b"<html>awr</html>".to_vec(),
            reports: Mutex::new(Vec::new()),
            task_statuses: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
            task_polls: AtomicUsize::new(0),
        }
    }

    pub fn with_snapshots(mut self, snapshots: Vec<SnapshotEntry>) -> Self {
        self.snapshots = snapshots;
        self
    }

    /// Snapshots at the given local times, ids counting up from 1.
    pub fn with_local_snapshots(self, local_times: &[&str]) -> Self {
        let entries = local_times
            .iter()
            .enumerate()
            .map(|(idx, time)| SnapshotEntry {
                snapshot_id: idx as i64 + 1,
                snapshot_time: utc_stamp(time),
            })
            .collect();
        self.with_snapshots(entries)
    }

    pub fn with_snapshot_error(mut self, message: &str) -> Self {
        self.snapshot_error = Some(message.to_string());
        self
    }

    pub fn with_submission_error(mut self, message: &str) -> Self {
        self.submission_error = Some(message.to_string());
        self
    }

    pub fn with_download_error(mut self, message: &str) -> Self {
        self.download_error = Some(message.to_string());
        self
    }

    pub fn with_reports(self, reports: Vec<ReportEntry>) -> Self {
        *self.reports.lock().unwrap() = reports;
        self
    }

    pub fn without_report_registration(mut self) -> Self {
        self.register_reports = false;
        self
    }

    pub fn with_task_statuses(self, statuses: Vec<TaskStatus>) -> Self {
        *self.task_statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_task_stuck(mut self) -> Self {
        self.task_stuck = true;
        self
    }

    pub fn with_report_body(mut self, body: &[u8]) -> Self {
        self.report_body = body.to_vec();
        self
    }

    pub fn submissions(&self) -> Vec<ReportRequest> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn task_polls(&self) -> usize {
        self.task_polls.load(Ordering::SeqCst)
    }
}

impl ControlPlane for FakeControlPlane {
    fn list_snapshots(&self) -> Result<Vec<SnapshotEntry>, GatherError> {
        match &self.snapshot_error {
            Some(message) => Err(GatherError::ControlPlane(message.clone())),
            None => Ok(self.snapshots.clone()),
        }
    }

    fn submit_report(&self, request: &ReportRequest) -> Result<SubmittedReport, GatherError> {
        if let Some(message) = &self.submission_error {
            return Err(GatherError::SubmissionError(message.clone()));
        }
        self.submissions.lock().unwrap().push(request.clone());
        if self.register_reports {
            let mut reports = self.reports.lock().unwrap();
            let id = 1000 + reports.len() as i64;
            reports.push(ReportEntry {
                id,
                name: request.name.clone(),
            });
        }
        Ok(SubmittedReport {
            task_instance_id: FAKE_TASK_ID,
            name: request.name.clone(),
        })
    }

    fn task_status(&self, _task_instance_id: i64) -> Result<TaskStatus, GatherError> {
        self.task_polls.fetch_add(1, Ordering::SeqCst);
        if self.task_stuck {
            return Ok(TaskStatus::Running);
        }
        Ok(self
            .task_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TaskStatus::Successful))
    }

    fn list_reports(&self) -> Result<Vec<ReportEntry>, GatherError> {
        Ok(self.reports.lock().unwrap().clone())
    }

    fn fetch_report(&self, _report_id: i64, dest: &mut dyn Write) -> Result<u64, GatherError> {
        if let Some(message) = &self.download_error {
            dest.write_all(&self.report_body[..self.report_body.len() / 2])?;
            return Err(GatherError::DownloadError(message.clone()));
        }
        dest.write_all(&self.report_body)?;
        Ok(self.report_body.len() as u64)
    }
}

pub const MOCK_USER: &str = "admin";
pub const MOCK_PASSWORD: &str = "secret";
const MOCK_AUTHORIZATION: &str = "Basic YWRtaW46c2VjcmV0";

#[derive(Default)]
struct MockState {
    snapshots: Mutex<serde_json::Value>,
    forms: Mutex<Vec<HashMap<String, String>>>,
    reports: Mutex<Vec<(i64, String)>>,
}

/// A control plane served over HTTP on a loopback port, backed by its own
/// tokio runtime thread.
pub struct MockOcp {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockOcp {
    pub fn start() -> Self {
        let state = Arc::new(MockState::default());
        *state.snapshots.lock().unwrap() = json!([]);
        let app = mock_router(state.clone());
        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("mock runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind mock control plane");
                addr_tx
                    .send(listener.local_addr().expect("mock local addr"))
                    .expect("publish mock addr");
                axum::serve(listener, app).await.expect("serve mock control plane");
            });
        });
        let addr = addr_rx.recv().expect("mock control plane address");
        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn set_snapshots(&self, snapshots: serde_json::Value) {
        *self.state.snapshots.lock().unwrap() = snapshots;
    }

    pub fn submitted_forms(&self) -> Vec<HashMap<String, String>> {
        self.state.forms.lock().unwrap().clone()
    }

    pub fn report_body(&self, name: &str) -> String {
        mock_report_body(name)
    }
}

pub fn mock_target(mock: &MockOcp, cluster_name: &str, cluster_id: i64) -> Target {
    Target {
        cluster_name: cluster_name.to_string(),
        cluster_id,
        base_url: mock.base_url.clone(),
        credentials: Credentials {
            user: MOCK_USER.to_string(),
            password: MOCK_PASSWORD.to_string(),
        },
    }
}

fn mock_report_body(name: &str) -> String {
    format!("<html><head><title>{name}</title></head><body>workload</body></html>")
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == MOCK_AUTHORIZATION)
        .unwrap_or(false)
}

fn mock_router(state: Arc<MockState>) -> Router {
    Router::new()
        .route(
            "/api/v2/ob/clusters/{cluster_id}/performance/workload/snapshots",
            get(mock_snapshots),
        )
        .route(
            "/api/v2/ob/clusters/{cluster_id}/performance/workload/reports",
            get(mock_reports).post(mock_submit),
        )
        .route(
            "/api/v2/ob/clusters/{cluster_id}/performance/workload/reports/{report_id}",
            get(mock_download),
        )
        .route("/api/v2/tasks/instances/{task_id}", get(mock_task))
        .with_state(state)
}

async fn mock_snapshots(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(_cluster_id): Path<i64>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let contents = state.snapshots.lock().unwrap().clone();
    Json(json!({ "data": { "contents": contents } })).into_response()
}

async fn mock_submit(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(_cluster_id): Path<i64>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let name = form.get("name").cloned().unwrap_or_default();
    state.forms.lock().unwrap().push(form);
    let id = {
        let mut reports = state.reports.lock().unwrap();
        let id = reports.len() as i64 + 1;
        reports.push((id, name.clone()));
        id
    };
    Json(json!({ "data": { "taskInstanceId": 500 + id, "name": name } })).into_response()
}

async fn mock_reports(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(_cluster_id): Path<i64>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let contents: Vec<serde_json::Value> = state
        .reports
        .lock()
        .unwrap()
        .iter()
        .map(|(id, name)| json!({ "id": id, "name": name }))
        .collect();
    Json(json!({ "data": { "contents": contents } })).into_response()
}

async fn mock_download(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path((_cluster_id, report_id)): Path<(i64, i64)>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let name = state
        .reports
        .lock()
        .unwrap()
        .iter()
        .find(|(id, _)| *id == report_id)
        .map(|(_, name)| name.clone());
    match name {
        Some(name) => mock_report_body(&name).into_response(),
        None => (StatusCode::NOT_FOUND, "report not found").into_response(),
    }
}

async fn mock_task(headers: HeaderMap, Path(task_id): Path<i64>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "data": { "id": task_id, "status": "SUCCESSFUL" } })).into_response()
}
