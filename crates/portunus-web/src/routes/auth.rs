//! Login and logout handlers.

use actix_session::Session;
use actix_web::{HttpResponse, Responder, http::header, web};
use askama::Template;
use serde::Deserialize;

use crate::auth;
use crate::csrf;
use crate::state::AppState;
use crate::templates::LoginTemplate;

#[derive(Deserialize)]
pub struct LoginForm {
    login_name: String,
    password: String,
}

pub async fn login_form() -> impl Responder {
    let body = LoginTemplate { error: None }.render().unwrap();
    HttpResponse::Ok().content_type("text/html").body(body)
}

pub async fn login_submit(
    session: Session,
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> impl Responder {
    let db = state.nexus.snapshot();
    let ok = db
        .find_user(&form.login_name)
        .map(|user| state.hasher.check_password_hash(&form.password, &user.password_hash))
        .unwrap_or(false);

    if !ok {
        tracing::warn!(login_name = %form.login_name, "rejected login attempt");
        let body = LoginTemplate {
            error: Some("wrong login name or password".to_string()),
        }
        .render()
        .unwrap();
        return HttpResponse::Unauthorized().content_type("text/html").body(body);
    }

    tracing::info!(login_name = %form.login_name, "login succeeded");
    auth::remember_login(&session, &form.login_name);
    HttpResponse::Found().insert_header((header::LOCATION, "/self")).finish()
}

#[derive(Deserialize)]
pub struct LogoutForm {
    csrf_token: String,
}

pub async fn logout(session: Session, form: web::Form<LogoutForm>) -> impl Responder {
    if csrf::verify(&session, &form.csrf_token) {
        auth::forget_login(&session);
    }
    HttpResponse::Found().insert_header((header::LOCATION, "/login")).finish()
}
