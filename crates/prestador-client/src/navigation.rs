//! Navigation and the auth-driven router.
//!
//! [`AuthRouter`] watches the identity stream for the lifetime of the root
//! screen: signed out goes to the sign-in path, signed in goes home. Navigation
//! is a local operation and assumed infallible.

use std::sync::Arc;

use futures::StreamExt;
use prestador_types::Identity;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::constants::{DEFAULT_HOME_PATH, DEFAULT_SIGN_IN_PATH};
use crate::subscriptions::{IdentityStream, SubscriptionHandle};

/// Moves the UI between screens.
pub trait Navigator: Send + Sync {
    fn go_to(&self, path: &str);

    /// Return to the previous screen.
    fn back(&self);
}

/// Destinations used by [`AuthRouter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePaths {
    pub sign_in: String,
    pub home: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            sign_in: DEFAULT_SIGN_IN_PATH.to_string(),
            home: DEFAULT_HOME_PATH.to_string(),
        }
    }
}

pub struct AuthRouter {
    navigator: Arc<dyn Navigator>,
    paths: RoutePaths,
}

impl AuthRouter {
    pub fn new(navigator: Arc<dyn Navigator>, paths: RoutePaths) -> Self {
        Self { navigator, paths }
    }

    /// Navigate for one identity emission.
    pub fn route(&self, identity: Option<&Identity>) {
        match identity {
            Some(identity) => {
                info!("{identity} signed in → {}", self.paths.home);
                self.navigator.go_to(&self.paths.home);
            }
            None => {
                info!("signed out → {}", self.paths.sign_in);
                self.navigator.go_to(&self.paths.sign_in);
            }
        }
    }

    /// Follow `identity` until the returned handle is released or dropped.
    pub fn spawn(self, identity: &dyn IdentityStream) -> SubscriptionHandle {
        let token = CancellationToken::new();
        let mut events = identity.subscribe();
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = cancelled.cancelled() => break,
                    next = events.next() => next,
                };
                match next {
                    Some(identity) => self.route(identity.as_ref()),
                    None => break,
                }
            }
            debug!("auth router stopped");
        });

        SubscriptionHandle::new(token, task)
    }
}
