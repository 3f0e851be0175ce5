//! The service record and its wire form.
//!
//! Records live at `users/{ownerId}/services/{recordId}` as loosely typed JSON
//! documents. Wire field names are fixed by data already in the store:
//!
//! ```text
//! id, name, description, phone, useEmail, providerID
//! ```
//!
//! `providerID` carries the owner id. Reads are lenient about every field
//! except `id`; a document without an id is unusable.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{OwnerId, RecordId};

/// A loosely typed stored document.
pub type Document = serde_json::Map<String, Value>;

/// Wire field names.
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const PHONE: &str = "phone";
    pub const USE_EMAIL: &str = "useEmail";
    pub const PROVIDER_ID: &str = "providerID";
}

/// Errors decoding a stored document into a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("document has no usable id")]
    MissingId,
}

/// A user-owned service entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    /// Digits only, never the masked form.
    pub phone: String,
    #[serde(rename = "useEmail")]
    pub use_email: bool,
    #[serde(rename = "providerID")]
    pub owner_id: OwnerId,
}

impl Record {
    /// Where this record lives in the store.
    pub fn path(&self) -> DocumentPath {
        DocumentPath::new(self.owner_id.clone(), self.id.clone())
    }

    /// Full wire payload for a merge-write.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(fields::ID.into(), Value::String(self.id.to_string()));
        doc.insert(fields::NAME.into(), Value::String(self.name.clone()));
        doc.insert(fields::DESCRIPTION.into(), Value::String(self.description.clone()));
        doc.insert(fields::PHONE.into(), Value::String(self.phone.clone()));
        doc.insert(fields::USE_EMAIL.into(), Value::Bool(self.use_email));
        doc.insert(fields::PROVIDER_ID.into(), Value::String(self.owner_id.to_string()));
        doc
    }

    /// Decode a stored document.
    ///
    /// `id` must be a non-empty string (numeric ids from older data are
    /// accepted and stringified). Missing or mistyped text fields read as
    /// empty, `useEmail` as `false`, and a missing `providerID` falls back to
    /// `owner`, the identity the document was read under.
    pub fn from_document(owner: &OwnerId, doc: &Document) -> Result<Self, RecordError> {
        let id = match doc.get(fields::ID) {
            Some(Value::String(s)) if !s.is_empty() => RecordId::new(s.as_str()),
            Some(Value::Number(n)) => RecordId::new(n.to_string()),
            _ => return Err(RecordError::MissingId),
        };

        let text = |key: &str| {
            doc.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default()
        };

        let owner_id = match doc.get(fields::PROVIDER_ID).and_then(Value::as_str) {
            Some(s) if !s.is_empty() => OwnerId::new(s),
            _ => owner.clone(),
        };

        Ok(Self {
            id,
            name: text(fields::NAME),
            description: text(fields::DESCRIPTION),
            phone: text(fields::PHONE),
            use_email: doc.get(fields::USE_EMAIL).and_then(Value::as_bool).unwrap_or(false),
            owner_id,
        })
    }
}

/// Store address of one record: `users/{owner}/services/{record}`.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct DocumentPath {
    pub owner_id: OwnerId,
    pub record_id: RecordId,
}

impl DocumentPath {
    pub const USERS: &'static str = "users";
    pub const SERVICES: &'static str = "services";

    pub fn new(owner_id: OwnerId, record_id: RecordId) -> Self {
        Self { owner_id, record_id }
    }
}

impl std::fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            Self::USERS,
            self.owner_id,
            Self::SERVICES,
            self.record_id
        )
    }
}
