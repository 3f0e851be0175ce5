//! Entity synchronization pipeline for the edit screen.
//!
//! Chains three dependent asynchronous sources into one stream of
//! [`FormLoad`] emissions: the signed-in identity, the route's record id, and
//! the stored record itself.
//!
//! # State Machine
//!
//! ```text
//! Idle ──subscribe──▶ WaitingForIdentity ──identity──▶ WaitingForRouteParam
//!                            ▲                                │
//!                            └──────── identity = None ───────┤
//!                                                             │ route param
//!                    ┌──────── id absent ─────────────────────┤
//!                    ▼                                        ▼ id present
//!               CreateMode                                Fetching
//!                                                  ┌──────────┴──────────┐
//!                                                  ▼                     ▼
//!                                               Loaded              LoadError
//!                                                                  (terminal)
//! ```
//!
//! # Cancel-and-replace
//!
//! Every upstream value opens a scope guarded by a [`CancellationToken`]:
//!
//! ```text
//! root (per subscription)
//!  └── identity scope (child, replaced on each identity)
//!       └── fetch scope (grandchild, replaced on each route param)
//! ```
//!
//! A new identity cancels the previous identity scope (and with it any
//! pending fetch); a new route param cancels the previous fetch scope. Inner
//! operations capture their token and check it under the delivery lock before
//! sending, so a slow fetch for a superseded record can never overwrite a
//! newer emission. Releasing the [`SubscriptionHandle`] cancels the root.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use parking_lot::Mutex;
use prestador_types::{
    Document, DocumentPath, Identity, OwnerId, Record, RecordError, RecordId, RouteParam,
};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::store::{SharedRecordStore, StoreError};
use crate::subscriptions::{IdentityStream, RouteParamStream, SubscriptionHandle};

/// Observable pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    WaitingForIdentity,
    WaitingForRouteParam,
    Fetching,
    Loaded,
    CreateMode,
    LoadError,
}

/// Why a record could not be loaded into the form.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The fetch succeeded but the payload is absent or has no id.
    #[error("record {0} is missing or has no id")]
    MissingId(RecordId),
    /// The store round trip failed.
    #[error("failed to fetch record {record_id}: {source}")]
    Store {
        record_id: RecordId,
        #[source]
        source: StoreError,
    },
}

/// One emission: the initial state for the edit form.
#[derive(Debug)]
pub enum FormLoad {
    /// No record id in the route: start from an empty form.
    CreateMode { owner_id: OwnerId },
    /// The record was fetched and decoded.
    Loaded { owner_id: OwnerId, record: Record },
    /// Terminal: nothing else will be delivered on this subscription.
    LoadError { owner_id: OwnerId, error: LoadError },
}

impl FormLoad {
    pub fn state(&self) -> PipelineState {
        match self {
            FormLoad::CreateMode { .. } => PipelineState::CreateMode,
            FormLoad::Loaded { .. } => PipelineState::Loaded,
            FormLoad::LoadError { .. } => PipelineState::LoadError,
        }
    }

    pub fn owner_id(&self) -> &OwnerId {
        match self {
            FormLoad::CreateMode { owner_id }
            | FormLoad::Loaded { owner_id, .. }
            | FormLoad::LoadError { owner_id, .. } => owner_id,
        }
    }
}

// ============================================================================
// Delivery
// ============================================================================

/// Single exit point for everything the pipeline tasks produce.
///
/// The lock makes "check token, then send" atomic with respect to
/// [`Delivery::supersede`], so a result can't slip out after its scope was
/// replaced.
struct Delivery {
    loads: mpsc::UnboundedSender<FormLoad>,
    state: watch::Sender<PipelineState>,
    root: CancellationToken,
    lock: Mutex<()>,
}

impl Delivery {
    fn set_state(&self, token: &CancellationToken, state: PipelineState) {
        let _guard = self.lock.lock();
        if !token.is_cancelled() {
            trace!("pipeline state → {state:?}");
            self.state.send_replace(state);
        }
    }

    /// Deliver `load` unless `token` was superseded. Returns whether it was sent.
    fn emit(&self, token: &CancellationToken, load: FormLoad) -> bool {
        let _guard = self.lock.lock();
        if token.is_cancelled() {
            debug!("dropping superseded {:?} emission", load.state());
            return false;
        }
        self.state.send_replace(load.state());
        self.loads.send(load).is_ok()
    }

    /// Deliver a terminal `load` and close the subscription in one step, so
    /// no sibling scope can emit in between.
    fn emit_terminal(&self, token: &CancellationToken, load: FormLoad) -> bool {
        let _guard = self.lock.lock();
        if token.is_cancelled() {
            debug!("dropping superseded {:?} emission", load.state());
            return false;
        }
        self.state.send_replace(load.state());
        let sent = self.loads.send(load).is_ok();
        self.root.cancel();
        sent
    }

    /// Cancel a scope so its pending results are discarded.
    fn supersede(&self, token: &CancellationToken) {
        let _guard = self.lock.lock();
        token.cancel();
    }
}

// ============================================================================
// EntitySyncPipeline
// ============================================================================

/// Identity → route param → record, with cancel-and-replace at every link.
///
/// Each [`subscribe`](Self::subscribe) call spawns a fresh, independently
/// cancellable task. Must be called inside a tokio runtime.
#[derive(Clone)]
pub struct EntitySyncPipeline {
    identity: Arc<dyn IdentityStream>,
    routes: Arc<dyn RouteParamStream>,
    store: SharedRecordStore,
}

impl EntitySyncPipeline {
    pub fn new(
        identity: Arc<dyn IdentityStream>,
        routes: Arc<dyn RouteParamStream>,
        store: SharedRecordStore,
    ) -> Self {
        Self {
            identity,
            routes,
            store,
        }
    }

    /// Start a new pipeline run.
    pub fn subscribe(&self) -> PipelineSubscription {
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PipelineState::Idle);
        let root = CancellationToken::new();

        let delivery = Arc::new(Delivery {
            loads: loads_tx,
            state: state_tx,
            root: root.clone(),
            lock: Mutex::new(()),
        });

        delivery.set_state(&root, PipelineState::WaitingForIdentity);
        let task = tokio::spawn(drive_identity(
            self.identity.subscribe(),
            self.routes.clone(),
            self.store.clone(),
            delivery,
        ));

        PipelineSubscription {
            handle: SubscriptionHandle::new(root, task),
            loads: loads_rx,
            state: state_rx,
        }
    }
}

/// Outer loop: one identity scope at a time.
async fn drive_identity(
    mut identities: BoxStream<'static, Option<Identity>>,
    routes: Arc<dyn RouteParamStream>,
    store: SharedRecordStore,
    delivery: Arc<Delivery>,
) {
    let root = delivery.root.clone();
    let mut scope: Option<CancellationToken> = None;

    loop {
        let next = tokio::select! {
            _ = root.cancelled() => break,
            next = identities.next() => next,
        };
        let Some(identity) = next else {
            // The current scope keeps running until released.
            debug!("identity stream ended");
            break;
        };

        if let Some(previous) = scope.take() {
            delivery.supersede(&previous);
        }

        match identity {
            None => {
                info!("signed out; waiting for identity");
                delivery.set_state(&root, PipelineState::WaitingForIdentity);
            }
            Some(identity) => {
                info!("identity {} observed", identity.id);
                let token = root.child_token();
                delivery.set_state(&token, PipelineState::WaitingForRouteParam);
                tokio::spawn(drive_routes(
                    identity.id,
                    routes.subscribe(),
                    store.clone(),
                    delivery.clone(),
                    token.clone(),
                ));
                scope = Some(token);
            }
        }
    }
}

/// Middle loop: route params under one identity.
async fn drive_routes(
    owner_id: OwnerId,
    mut params: BoxStream<'static, RouteParam>,
    store: SharedRecordStore,
    delivery: Arc<Delivery>,
    token: CancellationToken,
) {
    let mut fetch: Option<CancellationToken> = None;

    loop {
        let next = tokio::select! {
            _ = token.cancelled() => break,
            next = params.next() => next,
        };
        let Some(param) = next else {
            debug!("route stream ended for {owner_id}");
            break;
        };

        if let Some(previous) = fetch.take() {
            delivery.supersede(&previous);
        }

        match param.id {
            None => {
                debug!("create mode for {owner_id}");
                delivery.emit(&token, FormLoad::CreateMode { owner_id: owner_id.clone() });
            }
            Some(record_id) => {
                let child = token.child_token();
                delivery.set_state(&child, PipelineState::Fetching);
                tokio::spawn(fetch_record(
                    owner_id.clone(),
                    record_id,
                    store.clone(),
                    delivery.clone(),
                    child.clone(),
                ));
                fetch = Some(child);
            }
        }
    }
}

/// Inner operation: one store round trip.
async fn fetch_record(
    owner_id: OwnerId,
    record_id: RecordId,
    store: SharedRecordStore,
    delivery: Arc<Delivery>,
    token: CancellationToken,
) {
    let path = DocumentPath::new(owner_id.clone(), record_id.clone());
    debug!("fetching {path}");

    let result = tokio::select! {
        _ = token.cancelled() => {
            trace!("fetch for {path} superseded before completion");
            return;
        }
        result = store.get(&path) => result,
    };

    match decode(&owner_id, &record_id, result) {
        Ok(record) => {
            info!("loaded {path}");
            delivery.emit(&token, FormLoad::Loaded { owner_id, record });
        }
        Err(error) => {
            warn!("load failed for {path}: {error}");
            delivery.emit_terminal(&token, FormLoad::LoadError { owner_id, error });
        }
    }
}

fn decode(
    owner_id: &OwnerId,
    record_id: &RecordId,
    result: Result<Option<Document>, StoreError>,
) -> Result<Record, LoadError> {
    let doc = result
        .map_err(|source| LoadError::Store {
            record_id: record_id.clone(),
            source,
        })?
        .ok_or_else(|| LoadError::MissingId(record_id.clone()))?;

    Record::from_document(owner_id, &doc).map_err(|RecordError::MissingId| {
        LoadError::MissingId(record_id.clone())
    })
}

// ============================================================================
// PipelineSubscription
// ============================================================================

/// Receiving end of one pipeline run.
///
/// Dropping it releases the run.
pub struct PipelineSubscription {
    handle: SubscriptionHandle,
    loads: mpsc::UnboundedReceiver<FormLoad>,
    state: watch::Receiver<PipelineState>,
}

impl PipelineSubscription {
    /// Next emission. `None` once the run is closed and drained.
    pub async fn recv(&mut self) -> Option<FormLoad> {
        if self.handle.is_closed() {
            return self.loads.try_recv().ok();
        }
        tokio::select! {
            biased;
            load = self.loads.recv() => load,
            _ = self.handle.closed() => self.loads.try_recv().ok(),
        }
    }

    /// Emission already delivered, if any.
    pub fn try_recv(&mut self) -> Option<FormLoad> {
        self.loads.try_recv().ok()
    }

    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn state_changes(&self) -> watch::Receiver<PipelineState> {
        self.state.clone()
    }

    pub fn release(&self) {
        self.handle.release();
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }
}
