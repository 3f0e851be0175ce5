//! Shared test doubles for the edit-flow integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use prestador_client::{
    CommitCoordinator, EditScreen, EntitySyncPipeline, FormValidationGate, IdentitySource,
    MemoryStore, Navigator, Notifier, RecordStore, RouteSource, StoreError,
};
use prestador_types::{Document, DocumentPath, Identity};
use serde_json::Value;
use tokio::sync::{oneshot, watch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(String),
    Merge(String),
    Delete(String),
}

/// Memory store whose reads and writes can be held until the test releases
/// them, and which records every call it receives.
pub struct GatedStore {
    inner: MemoryStore,
    read_holds: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    write_hold: Mutex<Option<oneshot::Receiver<()>>>,
    calls: Mutex<Vec<Call>>,
    count: watch::Sender<usize>,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl GatedStore {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            inner: MemoryStore::new(),
            read_holds: Mutex::new(HashMap::new()),
            write_hold: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            count,
            fail_writes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn seed(&self, path: &DocumentPath, doc: Document) {
        self.inner.insert_raw(path, doc);
    }

    pub fn snapshot(&self, path: &DocumentPath) -> Option<Document> {
        self.inner.snapshot(path)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Hold the next `get` of `path` until the returned sender fires.
    pub fn hold(&self, path: &DocumentPath) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.read_holds.lock().insert(path.to_string(), rx);
        tx
    }

    /// Hold the next merge until the returned sender fires.
    pub fn hold_next_write(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.write_hold.lock() = Some(rx);
        tx
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Merge(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `n` calls have reached the store.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.count.subscribe();
        rx.wait_for(|c| *c >= n).await.expect("store dropped");
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
        self.count.send_modify(|c| *c += 1);
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.record(Call::Get(path.to_string()));
        let hold = self.read_holds.lock().remove(&path.to_string());
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        self.inner.get(path).await
    }

    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError> {
        self.record(Call::Merge(path.to_string()));
        let hold = self.write_hold.lock().take();
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write refused".into()));
        }
        self.inner.merge(path, fields).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.record(Call::Delete(path.to_string()));
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("delete refused".into()));
        }
        self.inner.delete(path).await
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.shown.lock().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.shown.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.shown.lock().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, title: &str, message: &str) {
        self.shown.lock().push((title.to_string(), message.to_string()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nav {
    GoTo(String),
    Back,
}

pub struct RecordingNavigator {
    events: Mutex<Vec<Nav>>,
    backs: watch::Sender<usize>,
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        let (backs, _) = watch::channel(0);
        Self {
            events: Mutex::new(Vec::new()),
            backs,
        }
    }
}

impl RecordingNavigator {
    pub fn events(&self) -> Vec<Nav> {
        self.events.lock().clone()
    }

    pub fn back_count(&self) -> usize {
        *self.backs.borrow()
    }

    pub async fn wait_for_go_to(&self, path: &str) {
        for _ in 0..100 {
            if self.events().contains(&Nav::GoTo(path.to_string())) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("never navigated to {path}; saw {:?}", self.events());
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, path: &str) {
        self.events.lock().push(Nav::GoTo(path.to_string()));
    }

    fn back(&self) {
        self.events.lock().push(Nav::Back);
        self.backs.send_modify(|c| *c += 1);
    }
}

/// Everything an edit screen needs, wired to test doubles.
pub struct Harness {
    pub identity: Arc<IdentitySource>,
    pub routes: Arc<RouteSource>,
    pub store: Arc<GatedStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub pipeline: EntitySyncPipeline,
    pub coordinator: Arc<CommitCoordinator>,
}

impl Harness {
    pub fn new() -> Self {
        let identity = Arc::new(IdentitySource::default());
        let routes = Arc::new(RouteSource::default());
        let store = Arc::new(GatedStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let pipeline = EntitySyncPipeline::new(identity.clone(), routes.clone(), store.clone());
        let coordinator = Arc::new(CommitCoordinator::new(
            store.clone(),
            notifier.clone(),
            navigator.clone(),
            FormValidationGate::new(),
        ));
        Self {
            identity,
            routes,
            store,
            notifier,
            navigator,
            pipeline,
            coordinator,
        }
    }

    pub fn sign_in(&self, id: &str) {
        self.identity
            .set(Some(Identity::new(id, format!("{id}@example.com"))));
    }

    pub fn screen(&self) -> EditScreen {
        EditScreen::new(
            self.pipeline.clone(),
            self.coordinator.clone(),
            self.notifier.clone(),
            self.navigator.clone(),
        )
    }
}

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

pub fn path(owner: &str, id: &str) -> DocumentPath {
    DocumentPath::new(owner.into(), id.into())
}
