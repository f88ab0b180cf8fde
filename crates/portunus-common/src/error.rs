//! Top-level error type shared by every adapter.
//!
//! Adapters (disk-store, LDAP) return this from their `Run` loops so the
//! orchestrator and the nexus can tell transient I/O apart from protocol
//! and configuration failures.

use crate::field_ref::ValidationError;

/// Application-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum PortunusError {
    /// Per-field validation failure. Never fatal; surfaced to the UI.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A seed conflict, produced only under `conflict_with_seed_is_error`.
    #[error("{0}")]
    SeedConflict(ValidationError),

    /// Transient disk or network I/O. Logged at warn, retried by the caller.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed environment or seed file. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected LDAP server response or corrupt database file. The `Run`
    /// loop that produced this returns it; the orchestrator restarts.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl PortunusError {
    pub fn config(message: impl Into<String>) -> Self {
        PortunusError::Config(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        PortunusError::Protocol(message.into())
    }
}

/// A collection of errors gathered without short-circuiting, as produced by
/// `Database::validate` and `Nexus::update`.
#[derive(Debug, Default, Clone)]
pub struct ErrorSet(pub Vec<ValidationError>);

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = ValidationError>) {
        self.0.extend(other);
    }
}

impl std::fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl FromIterator<ValidationError> for ErrorSet {
    fn from_iter<T: IntoIterator<Item = ValidationError>>(iter: T) -> Self {
        ErrorSet(iter.into_iter().collect())
    }
}
