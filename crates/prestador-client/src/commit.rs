//! Submission and deletion of records.
//!
//! `submit` validates, resolves the record id, navigates back, and only then
//! lets the merge-write run. The user has already left the screen when a
//! write fails, so the save-failure dialog shows up after the fact. That
//! ordering is kept on purpose; see DESIGN.md.
//!
//! Nothing here retries. Each failure ends its attempt and is reported once
//! through the [`Notifier`].

use std::sync::Arc;

use prestador_types::{DocumentPath, OwnerId, RecordId};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::alerts::{self, Notifier};
use crate::form::FormState;
use crate::navigation::Navigator;
use crate::store::SharedRecordStore;
use crate::validation::FormValidationGate;

/// Who and what the edit screen is writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    /// Captured from the identity the form was loaded under.
    pub owner_id: OwnerId,
    /// Set when the form was loaded from an existing record.
    pub record_id: Option<RecordId>,
}

impl EditTarget {
    pub fn create(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            record_id: None,
        }
    }

    pub fn edit(owner_id: OwnerId, record_id: RecordId) -> Self {
        Self {
            owner_id,
            record_id: Some(record_id),
        }
    }
}

/// What `submit` did.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The form is invalid; nothing was written.
    Rejected,
    /// Navigation happened and the write is running in the background.
    Dispatched {
        path: DocumentPath,
        write: JoinHandle<()>,
    },
}

impl SubmitOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, SubmitOutcome::Dispatched { .. })
    }
}

pub struct CommitCoordinator {
    store: SharedRecordStore,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    gate: FormValidationGate,
}

impl CommitCoordinator {
    pub fn new(
        store: SharedRecordStore,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        gate: FormValidationGate,
    ) -> Self {
        Self {
            store,
            notifier,
            navigator,
            gate,
        }
    }

    pub fn gate(&self) -> &FormValidationGate {
        &self.gate
    }

    /// Validate and persist `form` for `target`.
    ///
    /// Must be called inside a tokio runtime; the write is spawned.
    pub fn submit(&self, target: &EditTarget, form: &FormState) -> SubmitOutcome {
        if !self.gate.is_valid(form) {
            warn!("submit rejected: form has invalid fields");
            alerts::INVALID_FIELDS.show_on(self.notifier.as_ref());
            return SubmitOutcome::Rejected;
        }

        let record_id = match &target.record_id {
            Some(id) => id.clone(),
            None => {
                let id = RecordId::generate();
                debug!("minted record id {id}");
                id
            }
        };

        let record = form.to_record(record_id, target.owner_id.clone());
        let path = record.path();
        let payload = record.to_document();

        self.navigator.back();

        let store = self.store.clone();
        let notifier = self.notifier.clone();
        let write_path = path.clone();
        let write = tokio::spawn(async move {
            match store.merge(&write_path, payload).await {
                Ok(()) => info!("saved {write_path}"),
                Err(e) => {
                    error!("save failed for {write_path}: {e}");
                    alerts::SAVE_FAILURE.show_on(notifier.as_ref());
                }
            }
        });

        SubmitOutcome::Dispatched { path, write }
    }

    /// Delete a record. Failures show the delete-failure dialog; success is
    /// silent.
    pub fn delete(&self, owner_id: &OwnerId, record_id: &RecordId) -> JoinHandle<()> {
        let path = DocumentPath::new(owner_id.clone(), record_id.clone());
        let store = self.store.clone();
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            match store.delete(&path).await {
                Ok(()) => info!("deleted {path}"),
                Err(e) => {
                    error!("delete failed for {path}: {e}");
                    alerts::DELETE_FAILURE.show_on(notifier.as_ref());
                }
            }
        })
    }
}
