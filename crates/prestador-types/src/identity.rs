//! Signed-in identity and route parameters.
//!
//! Both are produced by collaborators outside this workspace (the identity
//! provider and the router) and are immutable once observed.

use serde::{Deserialize, Serialize};

use crate::ids::{OwnerId, RecordId};

/// The currently signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: OwnerId,
    pub email: String,
}

impl Identity {
    pub fn new(id: impl Into<OwnerId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.id, self.email)
    }
}

/// Record id extracted from navigation state.
///
/// `id = None` means the screen is creating a new record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParam {
    pub id: Option<RecordId>,
}

impl RouteParam {
    /// Route for the "new record" screen.
    pub fn create() -> Self {
        Self { id: None }
    }

    /// Route for editing an existing record.
    pub fn edit(id: impl Into<RecordId>) -> Self {
        Self { id: Some(id.into()) }
    }

    pub fn is_create(&self) -> bool {
        self.id.is_none()
    }
}
