//! The edit screen: owner of one pipeline run at a time.
//!
//! Each [`activate`](EditScreen::activate) starts a fresh
//! [`PipelineSubscription`]; [`deactivate`](EditScreen::deactivate) disposes
//! of it. Emissions are applied to the local [`FormState`] as they arrive:
//!
//! - `CreateMode` → empty form, no record id
//! - `Loaded`     → form from the record, record id captured for submit
//! - `LoadError`  → edit-failure dialog, detach from the pipeline

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::alerts::{self, Notifier};
use crate::commit::{CommitCoordinator, EditTarget, SubmitOutcome};
use crate::constants::{CREATE_SUBTITLE, CREATE_TITLE, EDIT_SUBTITLE, EDIT_TITLE};
use crate::form::{Field, FieldValue, FormError, FormState};
use crate::navigation::Navigator;
use crate::sync::{EntitySyncPipeline, FormLoad, PipelineState, PipelineSubscription};

/// What the screen is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenMode {
    /// Not activated.
    Inactive,
    /// Waiting for the pipeline's first emission.
    Loading,
    Create,
    Edit,
    /// The record failed to load; the screen is detached.
    Failed,
}

/// Header text for the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenHeader {
    pub title: &'static str,
    pub subtitle: &'static str,
}

pub struct EditScreen {
    pipeline: EntitySyncPipeline,
    coordinator: Arc<CommitCoordinator>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    form: FormState,
    target: Option<EditTarget>,
    mode: ScreenMode,
    subscription: Option<PipelineSubscription>,
}

impl EditScreen {
    pub fn new(
        pipeline: EntitySyncPipeline,
        coordinator: Arc<CommitCoordinator>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            pipeline,
            coordinator,
            notifier,
            navigator,
            form: FormState::default(),
            target: None,
            mode: ScreenMode::Inactive,
            subscription: None,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start a fresh pipeline run, replacing any previous one.
    pub fn activate(&mut self) {
        self.deactivate();
        debug!("edit screen activated");
        self.subscription = Some(self.pipeline.subscribe());
        self.mode = ScreenMode::Loading;
    }

    /// Release the current run and clear local state.
    pub fn deactivate(&mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.release();
            debug!("edit screen deactivated");
        }
        self.form = FormState::default();
        self.target = None;
        self.mode = ScreenMode::Inactive;
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Await the next emission and apply it. `None` once detached.
    pub async fn next_load(&mut self) -> Option<PipelineState> {
        let load = match self.subscription.as_mut() {
            Some(sub) => sub.recv().await,
            None => return None,
        };
        match load {
            Some(load) => {
                let state = load.state();
                self.apply(load);
                Some(state)
            }
            None => {
                self.subscription = None;
                None
            }
        }
    }

    /// Await an emission, or pend forever while detached. For `select!` loops.
    pub async fn recv_load(&mut self) -> Option<FormLoad> {
        match self.subscription.as_mut() {
            Some(sub) => sub.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Apply every emission already delivered. Returns how many were applied.
    pub fn drain_loads(&mut self) -> usize {
        let mut applied = 0;
        while let Some(load) = self.subscription.as_mut().and_then(|s| s.try_recv()) {
            self.apply(load);
            applied += 1;
        }
        applied
    }

    /// Apply one pipeline emission to the form.
    pub fn apply(&mut self, load: FormLoad) {
        match load {
            FormLoad::CreateMode { owner_id } => {
                debug!("create mode for {owner_id}");
                self.form = FormState::default();
                self.target = Some(EditTarget::create(owner_id));
                self.mode = ScreenMode::Create;
            }
            FormLoad::Loaded { owner_id, record } => {
                debug!("editing {}", record.path());
                self.form = FormState::from_record(&record);
                self.target = Some(EditTarget::edit(owner_id, record.id));
                self.mode = ScreenMode::Edit;
            }
            FormLoad::LoadError { owner_id, error } => {
                warn!("edit screen for {owner_id} failed to load: {error}");
                alerts::EDIT_LOAD_FAILURE.show_on(self.notifier.as_ref());
                if let Some(sub) = self.subscription.take() {
                    sub.release();
                }
                self.mode = ScreenMode::Failed;
            }
        }
    }

    // =========================================================================
    // Form access
    // =========================================================================

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn mode(&self) -> ScreenMode {
        self.mode
    }

    pub fn target(&self) -> Option<&EditTarget> {
        self.target.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.mode == ScreenMode::Loading
    }

    /// Header for the current mode. While loading, a fetch in flight means
    /// an existing record is being opened; before that the mode is unknown
    /// and there is no header.
    pub fn header(&self) -> Option<ScreenHeader> {
        const CREATE: ScreenHeader = ScreenHeader {
            title: CREATE_TITLE,
            subtitle: CREATE_SUBTITLE,
        };
        const EDIT: ScreenHeader = ScreenHeader {
            title: EDIT_TITLE,
            subtitle: EDIT_SUBTITLE,
        };

        match self.mode {
            ScreenMode::Create => Some(CREATE),
            ScreenMode::Edit => Some(EDIT),
            ScreenMode::Loading => self
                .subscription
                .as_ref()
                .filter(|sub| sub.state() == PipelineState::Fetching)
                .map(|_| EDIT),
            ScreenMode::Inactive | ScreenMode::Failed => None,
        }
    }

    /// User edit of one field.
    pub fn set(&mut self, field: Field, value: FieldValue) -> Result<(), FormError> {
        self.form.set(field, value)
    }

    /// Does `field` currently violate `rule`? Read-only.
    pub fn has_error(&self, field: &str, rule: &str) -> bool {
        self.coordinator.gate().has_error(&self.form, field, rule)
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Submit the form. `None` when no identity has been observed yet, in
    /// which case nothing is validated, written, or navigated.
    pub fn submit(&mut self) -> Option<SubmitOutcome> {
        let Some(target) = self.target.clone() else {
            warn!("submit ignored: no identity captured yet");
            return None;
        };
        let outcome = self.coordinator.submit(&target, &self.form);
        if outcome.is_dispatched() {
            info!("submitted form for {}", target.owner_id);
        }
        Some(outcome)
    }

    /// Abandon the form without writing.
    pub fn cancel(&mut self) {
        debug!("edit cancelled");
        self.navigator.back();
    }
}
