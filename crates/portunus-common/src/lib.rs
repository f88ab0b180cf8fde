//! Portunus Common - validators, field-error wrapping, and shared error types
//!
//! This crate provides the foundation used by every other Portunus crate:
//! - Pure string/grammar validators (§4.1)
//! - `FieldRef` / `ValidationError` for attributing an error to a specific
//!   object and field
//! - `PortunusError`, the top-level error enum adapters return from their
//!   run loops

pub mod error;
pub mod field_ref;
pub mod validate;

pub use error::PortunusError;
pub use field_ref::{FieldRef, ObjectType, ValidationError};
