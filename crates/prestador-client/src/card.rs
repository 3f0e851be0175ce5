//! Per-record actions shown on a service card.
//!
//! The card deletes its record and resolves which contact to hand to the
//! clipboard. Writing to the clipboard and tooltip timing live outside this
//! crate.

use std::sync::Arc;

use prestador_types::{Identity, Record};
use tokio::task::JoinHandle;

use crate::commit::CommitCoordinator;

/// Which contact the user asked to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Email,
    Phone,
}

pub struct ServiceCard {
    identity: Identity,
    record: Record,
    coordinator: Arc<CommitCoordinator>,
}

impl ServiceCard {
    pub fn new(identity: Identity, record: Record, coordinator: Arc<CommitCoordinator>) -> Self {
        Self {
            identity,
            record,
            coordinator,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Contact text to copy. E-mail is empty unless the record opts in.
    pub fn contact(&self, kind: ContactKind) -> String {
        match kind {
            ContactKind::Email if self.record.use_email => self.identity.email.clone(),
            ContactKind::Email => String::new(),
            ContactKind::Phone => self.record.phone.clone(),
        }
    }

    /// Delete this card's record under the signed-in identity.
    pub fn delete(&self) -> JoinHandle<()> {
        self.coordinator.delete(&self.identity.id, &self.record.id)
    }
}
