//! Record synchronization library for prestador.
//!
//! Keeps a single service edit form consistent with the signed-in identity,
//! the route's record id, and the stored record, and commits the form back.
//!
//! ```text
//!   IdentityStream ──┬──────────────▶ AuthRouter ──▶ Navigator
//!                    │
//!                    └─▶ EntitySyncPipeline ◀── RouteParamStream
//!                              │      ▲
//!                        FormLoad     └── RecordStore.get
//!                              ▼
//!                         EditScreen ── FormValidationGate
//!                              │
//!                              ▼
//!                      CommitCoordinator ──▶ RecordStore.merge / delete
//!                              │
//!                              └──▶ Notifier (failures only)
//! ```
//!
//! Collaborators are passed in explicitly as trait objects so a composition
//! root (or a test) decides what backs them.

pub mod alerts;
pub mod card;
pub mod commit;
pub mod constants;
pub mod form;
pub mod navigation;
pub mod screen;
pub mod sqlite_store;
pub mod store;
pub mod subscriptions;
pub mod sync;
pub mod validation;

pub use alerts::{Alert, Notifier};
pub use card::{ContactKind, ServiceCard};
pub use commit::{CommitCoordinator, EditTarget, SubmitOutcome};
pub use form::{Field, FieldValue, FormError, FormState};
pub use navigation::{AuthRouter, Navigator, RoutePaths};
pub use screen::{EditScreen, ScreenHeader, ScreenMode};
pub use sqlite_store::SqliteStore;
pub use store::{MemoryStore, RecordStore, SharedRecordStore, StoreError, shared_memory_store};
pub use subscriptions::{
    IdentitySource, IdentityStream, RouteParamStream, RouteSource, SubscriptionHandle,
};
pub use sync::{EntitySyncPipeline, FormLoad, LoadError, PipelineState, PipelineSubscription};
pub use validation::{FormValidationGate, Rule};
