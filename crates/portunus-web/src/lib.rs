//! Admin HTTP UI: session-backed login, CSRF-protected forms,
//! and CRUD over users and groups, all routed through the nexus.

pub mod auth;
pub mod csrf;
pub mod routes;
pub mod state;
pub mod templates;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, dev::Server, middleware::Logger, web};

pub use state::AppState;

/// Builds and binds the admin HTTP server. `session_key` must stay stable
/// across restarts only within a single process's lifetime — sessions do
/// not need to survive a restart.
pub fn server(state: AppState, session_key: Key, listen_address: &str) -> Result<Server, std::io::Error> {
    let secure_cookies = state.secure_cookies;

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(secure_cookies)
                    .build(),
            )
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind(listen_address)?
    .run())
}
