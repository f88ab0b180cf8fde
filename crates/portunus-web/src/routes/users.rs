//! Admin CRUD over users. Every mutation goes through
//! `Nexus::update` with `conflict_with_seed_is_error: true` — the UI must
//! never silently undo what the seed demands.

use actix_session::Session;
use actix_web::{HttpResponse, Responder, http::header, web};
use askama::Template;
use portunus_model::User;
use portunus_nexus::UpdateOptions;
use serde::Deserialize;

use crate::auth;
use crate::csrf;
use crate::state::AppState;
use crate::templates::{EditUserTemplate, UserRow, UsersTemplate};

fn admin_opts() -> UpdateOptions {
    UpdateOptions {
        conflict_with_seed_is_error: true,
        dry_run: false,
    }
}

pub async fn list(session: Session, state: web::Data<AppState>) -> impl Responder {
    if let Err(resp) = auth::require_admin(&session, &state) {
        return resp;
    }

    let db = state.nexus.snapshot();
    let users = db
        .users
        .iter()
        .map(|u| UserRow {
            login_name: u.login_name.clone(),
            full_name: u.full_name(),
            email: u.email.clone().unwrap_or_default(),
            is_admin: db
                .groups
                .iter()
                .any(|g| g.permissions.portunus.is_admin && g.contains_user(u)),
        })
        .collect();

    let body = UsersTemplate {
        users,
        csrf_token: csrf::token_for(&session),
    }
    .render()
    .unwrap();
    HttpResponse::Ok().content_type("text/html").body(body)
}

pub async fn new_form(session: Session, state: web::Data<AppState>) -> impl Responder {
    if let Err(resp) = auth::require_admin(&session, &state) {
        return resp;
    }
    render_edit_form(
        &session,
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        true,
        None,
    )
}

pub async fn edit_form(
    session: Session,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = auth::require_admin(&session, &state) {
        return resp;
    }
    let login_name = path.into_inner();
    let db = state.nexus.snapshot();
    match db.find_user(&login_name) {
        Some(user) => render_edit_form(
            &session,
            user.login_name.clone(),
            user.given_name.clone(),
            user.family_name.clone(),
            user.email.clone().unwrap_or_default(),
            user.ssh_public_keys.join("\n"),
            false,
            None,
        ),
        None => HttpResponse::NotFound().body("no such user"),
    }
}

fn render_edit_form(
    session: &Session,
    login_name: String,
    given_name: String,
    family_name: String,
    email: String,
    ssh_public_keys: String,
    is_new: bool,
    error: Option<String>,
) -> HttpResponse {
    let body = EditUserTemplate {
        login_name,
        given_name,
        family_name,
        email,
        ssh_public_keys,
        is_new,
        csrf_token: csrf::token_for(session),
        error,
    }
    .render()
    .unwrap();
    HttpResponse::Ok().content_type("text/html").body(body)
}

#[derive(Deserialize)]
pub struct UserForm {
    csrf_token: String,
    login_name: String,
    given_name: String,
    family_name: String,
    email: String,
    ssh_public_keys: String,
    password: String,
}

pub async fn create(session: Session, state: web::Data<AppState>, form: web::Form<UserForm>) -> impl Responder {
    save(session, state, String::new(), form).await
}

pub async fn update(
    session: Session,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<UserForm>,
) -> impl Responder {
    save(session, state, path.into_inner(), form).await
}

async fn save(
    session: Session,
    state: web::Data<AppState>,
    path_login: String,
    form: web::Form<UserForm>,
) -> HttpResponse {
    if let Err(resp) = auth::require_admin(&session, &state) {
        return resp;
    }
    if !csrf::verify(&session, &form.csrf_token) {
        return HttpResponse::BadRequest().body("invalid or expired form, please retry");
    }

    let is_new = path_login.is_empty();
    let ssh_public_keys: Vec<String> = form
        .ssh_public_keys
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let password = form.password.clone();
    let hasher = state.hasher.clone();
    let login_name = form.login_name.clone();
    let given_name = form.given_name.clone();
    let family_name = form.family_name.clone();
    let email = form.email.clone();

    let errors = state.nexus.update(
        move |db| {
            let target = if is_new { None } else { db.find_user_mut(&path_login) };
            match target {
                Some(user) => {
                    user.given_name = given_name.clone();
                    user.family_name = family_name.clone();
                    user.email = if email.is_empty() { None } else { Some(email.clone()) };
                    user.ssh_public_keys = ssh_public_keys.clone();
                    if !password.is_empty() {
                        if let Ok(hash) = hasher.hash_password(&password) {
                            user.password_hash = hash;
                        }
                    }
                }
                None => {
                    let password_hash = hasher
                        .hash_password(&password)
                        .unwrap_or_else(|_| String::new());
                    db.users.push(User {
                        login_name: login_name.clone(),
                        given_name: given_name.clone(),
                        family_name: family_name.clone(),
                        email: if email.is_empty() { None } else { Some(email.clone()) },
                        ssh_public_keys: ssh_public_keys.clone(),
                        password_hash,
                        posix: None,
                    });
                }
            }
            Ok(())
        },
        admin_opts(),
    );

    if errors.is_empty() {
        HttpResponse::Found().insert_header((header::LOCATION, "/users")).finish()
    } else {
        render_edit_form(
            &session,
            form.login_name.clone(),
            form.given_name.clone(),
            form.family_name.clone(),
            form.email.clone(),
            form.ssh_public_keys.clone(),
            is_new,
            Some(errors.to_string()),
        )
    }
}

#[derive(Deserialize)]
pub struct DeleteForm {
    csrf_token: String,
}

pub async fn delete(
    session: Session,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<DeleteForm>,
) -> impl Responder {
    if let Err(resp) = auth::require_admin(&session, &state) {
        return resp;
    }
    if !csrf::verify(&session, &form.csrf_token) {
        return HttpResponse::BadRequest().body("invalid or expired form, please retry");
    }

    let login_name = path.into_inner();
    state.nexus.update(
        move |db| {
            db.users.retain(|u| u.login_name != login_name);
            for group in &mut db.groups {
                group.set_membership(&login_name, false);
            }
            Ok(())
        },
        admin_opts(),
    );
    HttpResponse::Found().insert_header((header::LOCATION, "/users")).finish()
}
