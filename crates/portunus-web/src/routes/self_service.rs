//! Self-service password change — any logged-in user may
//! change their own password, no admin permission required.

use actix_session::Session;
use actix_web::{HttpResponse, Responder, web};
use askama::Template;
use portunus_nexus::UpdateOptions;
use serde::Deserialize;

use crate::auth;
use crate::csrf;
use crate::state::AppState;
use crate::templates::SelfServiceTemplate;

pub async fn page(session: Session, state: web::Data<AppState>) -> impl Responder {
    let user = match auth::require_login(&session, &state) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    render(&session, &user.login_name, None, None)
}

fn render(session: &Session, login_name: &str, error: Option<String>, message: Option<String>) -> HttpResponse {
    let body = SelfServiceTemplate {
        login_name: login_name.to_string(),
        csrf_token: csrf::token_for(session),
        error,
        message,
    }
    .render()
    .unwrap();
    HttpResponse::Ok().content_type("text/html").body(body)
}

#[derive(Deserialize)]
pub struct ChangePasswordForm {
    csrf_token: String,
    current_password: String,
    new_password: String,
}

pub async fn change_password(
    session: Session,
    state: web::Data<AppState>,
    form: web::Form<ChangePasswordForm>,
) -> impl Responder {
    let user = match auth::require_login(&session, &state) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if !csrf::verify(&session, &form.csrf_token) {
        return HttpResponse::BadRequest().body("invalid or expired form, please retry");
    }

    if !state.hasher.check_password_hash(&form.current_password, &user.password_hash) {
        return render(&session, &user.login_name, Some("current password is wrong".to_string()), None);
    }

    let new_hash = match state.hasher.hash_password(&form.new_password) {
        Ok(hash) => hash,
        Err(_) => return render(&session, &user.login_name, Some("could not hash the new password".to_string()), None),
    };

    let login_name = user.login_name.clone();
    let errors = state.nexus.update(
        move |db| {
            if let Some(target) = db.find_user_mut(&login_name) {
                target.password_hash = new_hash.clone();
            }
            Ok(())
        },
        UpdateOptions {
            conflict_with_seed_is_error: true,
            dry_run: false,
        },
    );

    if errors.is_empty() {
        render(&session, &user.login_name, None, Some("password changed".to_string()))
    } else {
        render(&session, &user.login_name, Some(errors.to_string()), None)
    }
}
