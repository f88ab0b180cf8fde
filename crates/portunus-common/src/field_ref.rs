//! Field-error wrapping.
//!
//! `FieldRef` identifies the object and field a validation error belongs
//! to; `ValidationError` is the rendered form the UI displays next to the
//! offending input.

use std::fmt;

/// The kind of object a `FieldRef` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    User,
    Group,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::User => write!(f, "user"),
            ObjectType::Group => write!(f, "group"),
        }
    }
}

/// A pointer to a single field on a single object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub object_type: ObjectType,
    pub object_key: String,
    pub field_name: String,
}

impl FieldRef {
    pub fn new(object_type: ObjectType, object_key: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            object_type,
            object_key: object_key.into(),
            field_name: field_name.into(),
        }
    }

    /// Wraps a plain message into a `ValidationError` attributed to this
    /// field. Mirrors `FieldRef.Wrap(err)`, which in the source language
    /// returns nil on nil input — here that's expressed as `Option<String>`.
    pub fn wrap(&self, message: impl Into<String>) -> ValidationError {
        ValidationError {
            field: Some(self.clone()),
            message: message.into(),
        }
    }

    pub fn wrap_opt(&self, message: Option<impl Into<String>>) -> Option<ValidationError> {
        message.map(|m| self.wrap(m))
    }
}

/// A single rendered validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: Option<FieldRef>,
    pub message: String,
}

impl ValidationError {
    pub fn unscoped(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(
                f,
                "field \"{}\" in {} \"{}\" {}",
                field.field_name, field.object_type, field.object_key, self.message
            ),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Returns the first `Some` error among a list of optional errors, or
/// `None` if every slot was `None`. Mirrors `WrapFirst(errs…)`.
pub fn wrap_first(errs: impl IntoIterator<Item = Option<ValidationError>>) -> Option<ValidationError> {
    errs.into_iter().flatten().next()
}
