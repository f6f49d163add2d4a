//! Test support utilities shared across unit and integration tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::backend::{ApiError, Backend, BackendFuture};
use crate::resource::{
    Placement, ReferenceEntry, ReferenceKind, Resource, ResourceFlags, ResourceId, ResourceStatus,
    TransitionKind, WaitGoal,
};

/// Identifier handed out to the first resource created by [`ScriptedBackend`].
pub const FIRST_CREATED_ID: u64 = 100;

/// Builds a droplet-shaped snapshot with the given status.
#[must_use]
pub fn resource(id: u64, status: &str) -> Resource {
    Resource {
        id: ResourceId(id),
        name: format!("resource-{id}"),
        status: ResourceStatus::from(status),
        flags: ResourceFlags::default(),
        public_ip: Some(String::from("192.0.2.10")),
        created_at: None,
        placement: Placement::Droplet {
            region_id: 2,
            size_id: 66,
            image_id: 350_076,
        },
    }
}

/// Errors produced by [`ScriptedBackend`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptedError {
    /// The scripted backend has no resource with this id.
    #[error("resource {0} not found")]
    NotFound(ResourceId),
    /// A scripted remote failure.
    #[error("scripted failure: {0}")]
    Remote(String),
    /// The transition was disabled on the scripted backend.
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

impl ApiError for ScriptedError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported(operation)
    }
}

#[derive(Clone, Debug)]
enum Observation {
    Snapshot(Resource),
    Gone,
    Failure,
}

#[derive(Debug, Default)]
struct State {
    observations: HashMap<ResourceId, VecDeque<Observation>>,
    fetches: HashMap<ResourceId, u32>,
    calls: HashMap<TransitionKind, u32>,
    failing: HashSet<TransitionKind>,
    disabled: HashSet<TransitionKind>,
    references: HashMap<ReferenceKind, Vec<ReferenceEntry>>,
    reference_calls: HashMap<ReferenceKind, u32>,
    failing_references: HashSet<ReferenceKind>,
    next_id: u64,
}

/// Backend double that replays scripted status sequences.
///
/// Each `get_resource` call consumes the next scripted observation for that
/// id; the final observation repeats forever. Terminal statuses follow the
/// DigitalOcean vocabulary: `active` is ready, `archive` and `off` are
/// archived.
#[derive(Clone, Debug, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<State>>,
}

impl ScriptedBackend {
    /// Creates a backend with no scripted resources.
    #[must_use]
    pub fn new() -> Self {
        let backend = Self::default();
        backend.lock().next_id = FIRST_CREATED_ID;
        backend
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn push(&self, id: u64, observation: Observation) {
        self.lock()
            .observations
            .entry(ResourceId(id))
            .or_default()
            .push_back(observation);
    }

    /// Queues a snapshot with the given status.
    pub fn push_status(&self, id: u64, status: &str) {
        self.push(id, Observation::Snapshot(resource(id, status)));
    }

    /// Queues each status in order.
    pub fn push_statuses(&self, id: u64, statuses: &[&str]) {
        for status in statuses {
            self.push_status(id, status);
        }
    }

    /// Queues a fully specified snapshot.
    pub fn push_resource(&self, snapshot: Resource) {
        let id = snapshot.id.get();
        self.push(id, Observation::Snapshot(snapshot));
    }

    /// Queues a not-found observation, as seen once a resource is removed.
    pub fn push_gone(&self, id: u64) {
        self.push(id, Observation::Gone);
    }

    /// Queues a transient remote failure.
    pub fn push_failure(&self, id: u64) {
        self.push(id, Observation::Failure);
    }

    /// Makes every call of the given transition fail.
    pub fn fail_on(&self, kind: TransitionKind) {
        self.lock().failing.insert(kind);
    }

    /// Reports the transition as unsupported.
    pub fn disable(&self, kind: TransitionKind) {
        self.lock().disabled.insert(kind);
    }

    /// Installs a reference catalogue.
    pub fn set_references(&self, kind: ReferenceKind, entries: Vec<ReferenceEntry>) {
        self.lock().references.insert(kind, entries);
    }

    /// Makes listing the catalogue fail.
    pub fn fail_reference_list(&self, kind: ReferenceKind) {
        self.lock().failing_references.insert(kind);
    }

    /// Removes all scripted failures.
    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failing.clear();
        state.failing_references.clear();
    }

    /// Number of mutating calls issued for a transition.
    #[must_use]
    pub fn calls(&self, kind: TransitionKind) -> u32 {
        self.lock().calls.get(&kind).copied().unwrap_or_default()
    }

    /// Number of `get_resource` calls issued for an id.
    #[must_use]
    pub fn fetches(&self, id: u64) -> u32 {
        self.lock()
            .fetches
            .get(&ResourceId(id))
            .copied()
            .unwrap_or_default()
    }

    /// Number of remote list calls issued for a catalogue.
    #[must_use]
    pub fn reference_calls(&self, kind: ReferenceKind) -> u32 {
        self.lock()
            .reference_calls
            .get(&kind)
            .copied()
            .unwrap_or_default()
    }

    fn record(&self, kind: TransitionKind) -> Result<(), ScriptedError> {
        let mut state = self.lock();
        *state.calls.entry(kind).or_default() += 1;
        if state.failing.contains(&kind) {
            return Err(ScriptedError::Remote(kind.as_str().to_owned()));
        }
        Ok(())
    }

    fn observe(&self, id: ResourceId) -> Result<Resource, ScriptedError> {
        let mut state = self.lock();
        *state.fetches.entry(id).or_default() += 1;
        let queue = state.observations.get_mut(&id);
        let observation = match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match observation {
            Some(Observation::Snapshot(snapshot)) => Ok(snapshot),
            Some(Observation::Failure) => Err(ScriptedError::Remote(format!("fetch {id}"))),
            Some(Observation::Gone) | None => Err(ScriptedError::NotFound(id)),
        }
    }

    fn transition(
        &self,
        kind: TransitionKind,
        id: ResourceId,
        status: &str,
        flags: ResourceFlags,
    ) -> Result<Resource, ScriptedError> {
        self.record(kind)?;
        let mut snapshot = resource(id.get(), status);
        snapshot.flags = flags;
        Ok(snapshot)
    }
}

impl Backend for ScriptedBackend {
    type Error = ScriptedError;
    type CreateSpec = String;
    type CloneSpec = String;

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn supports(&self, kind: TransitionKind) -> bool {
        !self.lock().disabled.contains(&kind)
    }

    fn is_terminal(&self, status: &ResourceStatus, goal: WaitGoal) -> bool {
        match goal {
            WaitGoal::Ready => status.as_str() == "active",
            WaitGoal::Archived => matches!(status.as_str(), "archive" | "off"),
        }
    }

    fn list_resources(&self) -> BackendFuture<'_, Vec<Resource>, Self::Error> {
        Box::pin(async move {
            let state = self.lock();
            let mut resources: Vec<Resource> = state
                .observations
                .values()
                .filter_map(|queue| match queue.front() {
                    Some(Observation::Snapshot(snapshot)) => Some(snapshot.clone()),
                    _ => None,
                })
                .collect();
            resources.sort_by_key(|snapshot| snapshot.id);
            Ok(resources)
        })
    }

    fn get_resource(&self, id: ResourceId) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move { self.observe(id) })
    }

    fn list_reference_data(
        &self,
        kind: ReferenceKind,
    ) -> BackendFuture<'_, Vec<ReferenceEntry>, Self::Error> {
        Box::pin(async move {
            let mut state = self.lock();
            *state.reference_calls.entry(kind).or_default() += 1;
            if state.failing_references.contains(&kind) {
                return Err(ScriptedError::Remote(kind.as_str().to_owned()));
            }
            Ok(state.references.get(&kind).cloned().unwrap_or_default())
        })
    }

    fn create_resource<'a>(
        &'a self,
        spec: &'a Self::CreateSpec,
    ) -> BackendFuture<'a, Resource, Self::Error> {
        Box::pin(async move {
            self.record(TransitionKind::Create)?;
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            let mut snapshot = resource(id, "new");
            snapshot.name.clone_from(spec);
            snapshot.public_ip = None;
            Ok(snapshot)
        })
    }

    fn destroy_resource(&self, id: ResourceId) -> BackendFuture<'_, (), Self::Error> {
        Box::pin(async move {
            let _ = id;
            self.record(TransitionKind::Destroy)
        })
    }

    fn rebuild_resource(
        &self,
        id: ResourceId,
        image_id: u64,
    ) -> BackendFuture<'_, (), Self::Error> {
        Box::pin(async move {
            let _ = (id, image_id);
            self.record(TransitionKind::Rebuild)
        })
    }

    fn shutdown_resource(&self, id: ResourceId) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move {
            self.transition(TransitionKind::Shutdown, id, "off", ResourceFlags::default())
        })
    }

    fn start_resource(
        &self,
        id: ResourceId,
        plan_id: u64,
    ) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move {
            let _ = plan_id;
            let flags = ResourceFlags {
                running: true,
                ..ResourceFlags::default()
            };
            self.transition(TransitionKind::Start, id, "active", flags)
        })
    }

    fn freeze_resource(&self, id: ResourceId) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move {
            let flags = ResourceFlags {
                frozen: true,
                ..ResourceFlags::default()
            };
            self.transition(TransitionKind::Freeze, id, "FROZEN", flags)
        })
    }

    fn thaw_resource(
        &self,
        id: ResourceId,
        plan_id: u64,
    ) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move {
            let _ = plan_id;
            self.transition(TransitionKind::Thaw, id, "active", ResourceFlags::default())
        })
    }

    fn clone_resource<'a>(
        &'a self,
        id: ResourceId,
        options: &'a Self::CloneSpec,
    ) -> BackendFuture<'a, Resource, Self::Error> {
        Box::pin(async move {
            let mut snapshot =
                self.transition(TransitionKind::Clone, id, "new", ResourceFlags::default())?;
            snapshot.name.clone_from(options);
            Ok(snapshot)
        })
    }
}

/// A request captured by [`CannedHttpServer`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Request target (path and query string).
    pub target: String,
    /// Request body decoded as UTF-8.
    pub body: String,
}

/// Canned HTTP response served by [`CannedHttpServer`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CannedResponse {
    /// Status code.
    pub status: u16,
    /// JSON body.
    pub body: String,
}

impl CannedResponse {
    /// A `200 OK` response with the given JSON body.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// A response with an explicit status code.
    #[must_use]
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Minimal HTTP/1.1 server that answers each connection with the next canned
/// response and records what it received. Exhausted scripts answer `404`.
#[derive(Debug)]
pub struct CannedHttpServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl CannedHttpServer {
    /// Binds to an ephemeral loopback port and starts serving.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the listener cannot be bound.
    pub async fn start(responses: Vec<CannedResponse>) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let mut script = VecDeque::from(responses);

        let task = tokio::spawn(async move {
            while let Ok((mut stream, _addr)) = listener.accept().await {
                let Ok(request) = read_request(&mut stream).await else {
                    continue;
                };
                recorded
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .push(request);
                let response = script
                    .pop_front()
                    .unwrap_or_else(|| CannedResponse::with_status(404, "{}"));
                write_response(&mut stream, &response).await.ok();
            }
        });

        Ok(Self {
            base_url,
            requests,
            task,
        })
    }

    /// Base URL such as `http://127.0.0.1:41234`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Drop for CannedHttpServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Reads one request head and a body delimited by `content-length`.
///
/// Chunked transfer encoding is not understood; reqwest sends sized bodies
/// for the JSON, query, and form requests the clients issue.
async fn read_request(stream: &mut TcpStream) -> io::Result<RecordedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];
    let header_end = loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        buffer.extend_from_slice(chunk.get(..read).unwrap_or_default());
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(buffer.get(..header_end).unwrap_or_default()).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or_default();

    while buffer.len() < header_end + content_length {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(chunk.get(..read).unwrap_or_default());
    }

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    Ok(RecordedRequest {
        method: request_line.next().unwrap_or_default().to_owned(),
        target: request_line.next().unwrap_or_default().to_owned(),
        body: String::from_utf8_lossy(buffer.get(header_end..).unwrap_or_default()).into_owned(),
    })
}

async fn write_response(stream: &mut TcpStream, response: &CannedResponse) -> io::Result<()> {
    let reason = if response.status < 400 { "OK" } else { "Error" };
    let payload = format!(
        "HTTP/1.1 {} {reason}\r\ncontent-type: application/json\r\n\
         content-length: {}\r\nconnection: close\r\n\r\n{}",
        response.status,
        response.body.len(),
        response.body
    );
    stream.write_all(payload.as_bytes()).await?;
    stream.shutdown().await
}
