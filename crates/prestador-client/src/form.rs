//! Edit form state.
//!
//! Lives only as long as the edit screen. Derived from a [`Record`] on load
//! and converted back on submission; the phone field always holds the masked
//! rendering of the stored digits.

use prestador_types::{OwnerId, Record, RecordId, phone};
use strum::{Display, EnumString};
use thiserror::Error;

/// Form field names, as used by [`FormValidationGate::has_error`](crate::FormValidationGate::has_error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum Field {
    Name,
    Description,
    Phone,
    UseEmail,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Description, Field::Phone, Field::UseEmail];
}

/// A single field's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("field {field} does not accept {got}")]
    TypeMismatch { field: Field, got: &'static str },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub description: String,
    /// Masked display form, `(DD) DDDDD-DDDD`.
    pub phone: String,
    pub use_email: bool,
}

impl FormState {
    /// Form values for an existing record.
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone(),
            phone: phone::format(&record.phone),
            use_email: record.use_email,
        }
    }

    /// Record to persist for this form.
    pub fn to_record(&self, id: RecordId, owner_id: OwnerId) -> Record {
        Record {
            id,
            name: self.name.clone(),
            description: self.description.clone(),
            phone: phone::unformat(&self.phone),
            use_email: self.use_email,
            owner_id,
        }
    }

    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::Name => FieldValue::Text(self.name.clone()),
            Field::Description => FieldValue::Text(self.description.clone()),
            Field::Phone => FieldValue::Text(self.phone.clone()),
            Field::UseEmail => FieldValue::Flag(self.use_email),
        }
    }

    /// Apply a user edit. Phone input is re-masked as it is typed.
    pub fn set(&mut self, field: Field, value: FieldValue) -> Result<(), FormError> {
        match (field, value) {
            (Field::Name, FieldValue::Text(v)) => self.name = v,
            (Field::Description, FieldValue::Text(v)) => self.description = v,
            (Field::Phone, FieldValue::Text(v)) => self.phone = phone::format(&v),
            (Field::UseEmail, FieldValue::Flag(v)) => self.use_email = v,
            (field, FieldValue::Text(_)) => {
                return Err(FormError::TypeMismatch { field, got: "text" });
            }
            (field, FieldValue::Flag(_)) => {
                return Err(FormError::TypeMismatch { field, got: "a flag" });
            }
        }
        Ok(())
    }
}
