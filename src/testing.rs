//! Stand-ins for the roster service: [`MemoryRoster`] in-process, [`FakeBackend`] over HTTP.

use crate::{
    data::student::StudentRecord,
    error::{RosterError, RosterResult},
    import::parse_candidates,
    remote::{CsvUpload, ImportAck, RemoteAction, RosterClient, progress::UploadProgress},
};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, put},
};
use serde::Deserialize;
use std::{
    collections::{HashSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::{
    net::TcpListener,
    sync::{Notify, OwnedRwLockWriteGuard, RwLock},
};

type Rejection = (StatusCode, String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedUpload {
    pub field: String,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// What the fake service holds, and how it is told to misbehave.
#[derive(Debug, Default)]
pub struct FakeState {
    pub records: Vec<StudentRecord>,
    pub allow_duplicates: bool,
    pub echo_accepted: bool,
    pub failing: HashSet<RemoteAction>,
    pub uploads: Vec<ReceivedUpload>,
    pub update_requests: Vec<(Option<String>, StudentRecord)>,
    ///consumed one per update, to make responses land out of order
    pub update_delays: VecDeque<Duration>,
}

impl FakeState {
    fn check(&self, action: RemoteAction) -> Result<(), Rejection> {
        if self.failing.contains(&action) {
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{action} is unavailable"),
            ))
        } else {
            Ok(())
        }
    }

    fn list(&self) -> Result<Vec<StudentRecord>, Rejection> {
        self.check(RemoteAction::List)?;
        Ok(self.records.clone())
    }

    fn create(&mut self, record: StudentRecord) -> Result<(), Rejection> {
        self.check(RemoteAction::Create)?;
        if !self.allow_duplicates
            && self
                .records
                .iter()
                .any(|r| r.student_id == record.student_id)
        {
            return Err((
                StatusCode::CONFLICT,
                format!("duplicate student_id {}", record.student_id),
            ));
        }
        self.records.push(record);
        Ok(())
    }

    fn update(&mut self, original_id: Option<String>, record: StudentRecord) -> Result<(), Rejection> {
        self.check(RemoteAction::Update)?;
        self.update_requests
            .push((original_id.clone(), record.clone()));

        let key = original_id.unwrap_or_else(|| record.student_id.clone());
        let slot = self
            .records
            .iter_mut()
            .find(|r| r.student_id == key)
            .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no student {key}")))?;
        *slot = record;
        Ok(())
    }

    fn delete(&mut self, student_id: &str) -> Result<(), Rejection> {
        self.check(RemoteAction::Delete)?;
        let before = self.records.len();
        self.records.retain(|r| r.student_id != student_id);
        if self.records.len() == before {
            return Err((StatusCode::NOT_FOUND, format!("no student {student_id}")));
        }
        Ok(())
    }

    fn import(&mut self, upload: ReceivedUpload) -> Result<Option<Vec<StudentRecord>>, Rejection> {
        self.check(RemoteAction::Import)?;
        let parsed = parse_candidates(&upload.bytes)
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        self.uploads.push(upload);

        let mut accepted = vec![];
        for candidate in parsed.candidates {
            if !self.allow_duplicates
                && self
                    .records
                    .iter()
                    .any(|r| r.student_id == candidate.student_id)
            {
                continue;
            }
            self.records.push(candidate.clone());
            accepted.push(candidate);
        }

        Ok(self.echo_accepted.then_some(accepted))
    }
}

fn lock(state: &Mutex<FakeState>) -> MutexGuard<'_, FakeState> {
    state.lock().expect("fake state poisoned")
}

fn rejected(action: RemoteAction, (status, body): Rejection) -> RosterError {
    RosterError::RejectedRequest {
        action,
        status,
        body,
    }
}

/// An in-process [`RosterClient`], for exercising the session without sockets.
#[derive(Debug, Default)]
pub struct MemoryRoster {
    state: Mutex<FakeState>,
    import_gate: Arc<RwLock<()>>,
    held: Mutex<Option<OwnedRwLockWriteGuard<()>>>,
    import_started: Notify,
}

impl MemoryRoster {
    pub fn with_records(records: Vec<StudentRecord>) -> Self {
        let roster = Self::default();
        roster.state().records = records;
        roster
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        lock(&self.state)
    }

    pub fn fail(&self, action: RemoteAction) {
        self.state().failing.insert(action);
    }

    pub fn recover(&self, action: RemoteAction) {
        self.state().failing.remove(&action);
    }

    ///imports block after they start until [`Self::release_imports`]
    pub fn hold_imports(&self) {
        let guard = Arc::clone(&self.import_gate)
            .try_write_owned()
            .expect("imports already held");
        *self.held.lock().expect("held poisoned") = Some(guard);
    }

    pub async fn wait_for_held_import(&self) {
        self.import_started.notified().await;
    }

    pub fn release_imports(&self) {
        self.held.lock().expect("held poisoned").take();
    }
}

#[async_trait]
impl RosterClient for MemoryRoster {
    async fn list_all(&self) -> RosterResult<Vec<StudentRecord>> {
        self.state()
            .list()
            .map_err(|r| rejected(RemoteAction::List, r))
    }

    async fn create_one(&self, record: &StudentRecord) -> RosterResult<()> {
        self.state()
            .create(record.clone())
            .map_err(|r| rejected(RemoteAction::Create, r))
    }

    async fn update_one(&self, original_id: &str, record: &StudentRecord) -> RosterResult<()> {
        let delay = self.state().update_delays.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.state()
            .update(Some(original_id.to_string()), record.clone())
            .map_err(|r| rejected(RemoteAction::Update, r))
    }

    async fn delete_one(&self, student_id: &str) -> RosterResult<()> {
        self.state()
            .delete(student_id)
            .map_err(|r| rejected(RemoteAction::Delete, r))
    }

    async fn import_many(
        &self,
        upload: CsvUpload,
        progress: &UploadProgress,
    ) -> RosterResult<ImportAck> {
        let mut tracker = progress.begin(upload.bytes.len() as u64);
        self.import_started.notify_one();
        let _pass = self.import_gate.read().await;

        for chunk in upload.bytes.chunks(8) {
            tracker.advance(chunk.len());
        }

        let accepted = self
            .state()
            .import(ReceivedUpload {
                field: "file".into(),
                file_name: Some(upload.file_name),
                bytes: upload.bytes.to_vec(),
            })
            .map_err(|r| rejected(RemoteAction::Import, r))?;

        progress.finish();
        Ok(ImportAck { accepted })
    }
}

/// The roster API served by axum on an ephemeral local port.
#[derive(Debug, Default, Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Deserialize)]
struct IdQuery {
    student_id: Option<String>,
}

fn respond<T: IntoResponse>(result: Result<T, Rejection>) -> Response {
    match result {
        Ok(x) => x.into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

async fn query_students(State(backend): State<FakeBackend>) -> Response {
    respond(backend.state().list().map(Json))
}

async fn create_student(
    State(backend): State<FakeBackend>,
    Json(record): Json<StudentRecord>,
) -> Response {
    respond(backend.state().create(record).map(|()| "ok"))
}

async fn update_student(
    State(backend): State<FakeBackend>,
    Query(IdQuery { student_id }): Query<IdQuery>,
    Json(record): Json<StudentRecord>,
) -> Response {
    respond(backend.state().update(student_id, record).map(|()| "ok"))
}

async fn delete_student(
    State(backend): State<FakeBackend>,
    Query(IdQuery { student_id }): Query<IdQuery>,
) -> Response {
    let Some(student_id) = student_id else {
        return (StatusCode::BAD_REQUEST, "missing student_id").into_response();
    };
    respond(backend.state().delete(&student_id).map(|()| "ok"))
}

async fn multi_create_student(
    State(backend): State<FakeBackend>,
    mut multipart: Multipart,
) -> Response {
    let mut received = vec![];
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(ToString::to_string);
        match field.bytes().await {
            Ok(bytes) => received.push(ReceivedUpload {
                field: name,
                file_name,
                bytes: bytes.to_vec(),
            }),
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        }
    }

    let Some(upload) = received.into_iter().find(|u| u.field == "file") else {
        return (StatusCode::BAD_REQUEST, "missing file field").into_response();
    };

    match backend.state().import(upload) {
        Ok(Some(accepted)) => Json(accepted).into_response(),
        Ok(None) => "ok".into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

impl FakeBackend {
    pub fn with_records(records: Vec<StudentRecord>) -> Self {
        let backend = Self::default();
        backend.state().records = records;
        backend
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        lock(&self.state)
    }

    pub fn fail(&self, action: RemoteAction) {
        self.state().failing.insert(action);
    }

    /// Serves the fake in the background, returning its base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/api/QueryStudents", get(query_students))
            .route("/api/CreateStudent", put(create_student))
            .route("/api/UpdateStudent", put(update_student))
            .route("/api/MultiCreateStudent", put(multi_create_student))
            .route("/api/DeleteStudent", delete(delete_student))
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("unable to bind fake backend");
        let addr = listener.local_addr().expect("bound listener has an address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("fake backend stopped");
        });

        format!("http://{addr}")
    }
}
