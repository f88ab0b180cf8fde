//! Session-backed login state and the admin-permission gate.

use actix_session::Session;
use actix_web::{HttpResponse, http::header};
use portunus_model::User;

use crate::state::AppState;

const SESSION_KEY: &str = "login_name";

pub fn remember_login(session: &Session, login_name: &str) {
    let _ = session.insert(SESSION_KEY, login_name);
}

pub fn forget_login(session: &Session) {
    session.purge();
}

/// Resolves the session's login name against the current snapshot. A login
/// name with no matching user (deleted out from under an active session)
/// is treated the same as not being logged in.
pub fn current_user(session: &Session, state: &AppState) -> Option<User> {
    let login_name: String = session.get(SESSION_KEY).ok().flatten()?;
    state.nexus.snapshot().find_user(&login_name).cloned()
}

/// True if `user` belongs to a group with `portunus.is_admin` set (spec
/// §3: admin status is a group property, not a per-user flag).
pub fn is_admin(user: &User, state: &AppState) -> bool {
    let db = state.nexus.snapshot();
    db.groups
        .iter()
        .any(|group| group.permissions.portunus.is_admin && group.contains_user(user))
}

/// Redirects to `/login` when no session user resolves; otherwise hands
/// back the resolved user.
pub fn require_login(session: &Session, state: &AppState) -> Result<User, HttpResponse> {
    current_user(session, state).ok_or_else(|| {
        HttpResponse::Found()
            .insert_header((header::LOCATION, "/login"))
            .finish()
    })
}

/// As `require_login`, but additionally rejects non-admins with `403`.
pub fn require_admin(session: &Session, state: &AppState) -> Result<User, HttpResponse> {
    let user = require_login(session, state)?;
    if is_admin(&user, state) {
        Ok(user)
    } else {
        Err(HttpResponse::Forbidden().body("admin permission required"))
    }
}
