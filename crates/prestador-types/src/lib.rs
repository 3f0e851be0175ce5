//! Shared types for prestador.
//!
//! Leaf crate with no internal dependencies: typed ids, the signed-in
//! identity, route parameters, the service record with its wire form, and the
//! phone mask.
//!
//! # Key Types
//!
//! |-------------------|----------------------------------------------|
//! | Type              | Purpose                                      |
//! |-------------------|----------------------------------------------|
//! | [`Identity`]      | Signed-in user (id + email)                  |
//! | [`RouteParam`]    | Record id from navigation, or create mode    |
//! | [`Record`]        | One service entry, keyed by owner + id       |
//! | [`DocumentPath`]  | `users/{owner}/services/{record}`            |
//! | [`OwnerId`]       | Who owns a record (`providerID` on the wire) |
//! | [`RecordId`]      | Record document key                          |
//! |-------------------|----------------------------------------------|

pub mod ids;
pub mod identity;
pub mod phone;
pub mod record;

pub use identity::{Identity, RouteParam};
pub use ids::{OwnerId, RECORD_ID_LEN, RecordId};
pub use record::{Document, DocumentPath, Record, RecordError};
