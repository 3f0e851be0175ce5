//! Upstream event sources and subscription lifetimes.
//!
//! The identity provider and the router are consumed as streams:
//! [`IdentityStream`] yields `Option<Identity>` whenever authentication
//! changes, [`RouteParamStream`] yields a [`RouteParam`] per navigation. Each
//! `subscribe()` call returns an independent stream that starts with the
//! current value.
//!
//! [`IdentitySource`] and [`RouteSource`] are `watch`-backed implementations
//! for composition roots and tests. [`SubscriptionHandle`] is the cancellable
//! lifetime of one spawned consumer.

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use prestador_types::{Identity, RouteParam};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Produces the signed-in identity, or `None`, on every auth change.
pub trait IdentityStream: Send + Sync {
    fn subscribe(&self) -> BoxStream<'static, Option<Identity>>;
}

/// Produces the record id carried by navigation state.
pub trait RouteParamStream: Send + Sync {
    fn subscribe(&self) -> BoxStream<'static, RouteParam>;
}

/// Current value first, then every change. Intermediate values set faster
/// than the consumer polls are coalesced.
fn watch_stream<T>(mut rx: watch::Receiver<T>) -> BoxStream<'static, T>
where
    T: Clone + Send + Sync + 'static,
{
    let first = rx.borrow_and_update().clone();
    stream::once(async move { first })
        .chain(stream::unfold(rx, |mut rx| async move {
            rx.changed().await.ok()?;
            let value = rx.borrow_and_update().clone();
            Some((value, rx))
        }))
        .boxed()
}

// ============================================================================
// Watch-backed sources
// ============================================================================

/// Settable identity state.
pub struct IdentitySource {
    tx: watch::Sender<Option<Identity>>,
}

impl IdentitySource {
    pub fn new(initial: Option<Identity>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Sign in (`Some`) or out (`None`).
    pub fn set(&self, identity: Option<Identity>) {
        self.tx.send_replace(identity);
    }

    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }
}

impl Default for IdentitySource {
    fn default() -> Self {
        Self::new(None)
    }
}

impl IdentityStream for IdentitySource {
    fn subscribe(&self) -> BoxStream<'static, Option<Identity>> {
        watch_stream(self.tx.subscribe())
    }
}

/// Settable route state.
pub struct RouteSource {
    tx: watch::Sender<RouteParam>,
}

impl RouteSource {
    pub fn new(initial: RouteParam) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn set(&self, param: RouteParam) {
        self.tx.send_replace(param);
    }

    pub fn current(&self) -> RouteParam {
        self.tx.borrow().clone()
    }
}

impl Default for RouteSource {
    fn default() -> Self {
        Self::new(RouteParam::create())
    }
}

impl RouteParamStream for RouteSource {
    fn subscribe(&self) -> BoxStream<'static, RouteParam> {
        watch_stream(self.tx.subscribe())
    }
}

// ============================================================================
// SubscriptionHandle
// ============================================================================

/// Cancellable lifetime of one spawned consumer.
///
/// Releasing (or dropping) the handle stops all further deliveries at once.
/// Work already in flight is not aborted; its results are discarded.
#[derive(Debug)]
pub struct SubscriptionHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub(crate) fn new(token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            token,
            task: Some(task),
        }
    }

    /// Stop all further deliveries.
    pub fn release(&self) {
        self.token.cancel();
    }

    /// Whether the subscription was released or terminated itself.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the subscription is closed.
    pub async fn closed(&self) {
        self.token.cancelled().await
    }

    /// Release and wait for the driver task to wind down.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
