//! Shared application state, handed to every handler through `web::Data`.

use std::sync::Arc;

use portunus_hash::PasswordHasher;
use portunus_nexus::Nexus;

/// State shared across all handlers. Cheap to clone: `Nexus`
/// already wraps its own `Arc`, and the hasher is shared behind one too.
#[derive(Clone)]
pub struct AppState {
    pub nexus: Nexus,
    pub hasher: Arc<dyn PasswordHasher>,
    /// Mirrors `PORTUNUS_SERVER_HTTP_SECURE`: whether the session cookie
    /// carries the `Secure` flag. Only ever false in local/dev setups that
    /// terminate TLS elsewhere or not at all.
    pub secure_cookies: bool,
}
