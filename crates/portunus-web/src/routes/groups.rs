//! Admin CRUD over groups.

use std::collections::BTreeSet;

use actix_session::Session;
use actix_web::{HttpResponse, Responder, http::header, web};
use askama::Template;
use portunus_model::{Group, LdapPermissions, Permissions, PortunusPermissions};
use portunus_nexus::UpdateOptions;
use serde::Deserialize;

use crate::auth;
use crate::csrf;
use crate::state::AppState;
use crate::templates::{EditGroupTemplate, GroupRow, GroupsTemplate};

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
    let groups = db
        .groups
        .iter()
        .map(|g| GroupRow {
            name: g.name.clone(),
            long_name: g.long_name.clone(),
            member_count: g.member_login_names.len(),
            is_admin: g.permissions.portunus.is_admin,
            can_read_ldap: g.permissions.ldap.can_read,
        })
        .collect();

    let body = GroupsTemplate {
        groups,
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
    render_edit_form(&session, String::new(), String::new(), String::new(), false, false, true, None)
}

pub async fn edit_form(
    session: Session,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = auth::require_admin(&session, &state) {
        return resp;
    }
    let name = path.into_inner();
    let db = state.nexus.snapshot();
    match db.find_group(&name) {
        Some(group) => render_edit_form(
            &session,
            group.name.clone(),
            group.long_name.clone(),
            group.member_login_names.iter().cloned().collect::<Vec<_>>().join("\n"),
            group.permissions.portunus.is_admin,
            group.permissions.ldap.can_read,
            false,
            None,
        ),
        None => HttpResponse::NotFound().body("no such group"),
    }
}

#[allow(clippy::too_many_arguments)]
fn render_edit_form(
    session: &Session,
    name: String,
    long_name: String,
    members: String,
    is_admin: bool,
    can_read_ldap: bool,
    is_new: bool,
    error: Option<String>,
) -> HttpResponse {
    let body = EditGroupTemplate {
        name,
        long_name,
        members,
        is_admin,
        can_read_ldap,
        is_new,
        csrf_token: csrf::token_for(session),
        error,
    }
    .render()
    .unwrap();
    HttpResponse::Ok().content_type("text/html").body(body)
}

#[derive(Deserialize)]
pub struct GroupForm {
    csrf_token: String,
    name: String,
    long_name: String,
    #[serde(default)]
    members: String,
    #[serde(default)]
    is_admin: Option<String>,
    #[serde(default)]
    can_read_ldap: Option<String>,
}

pub async fn create(session: Session, state: web::Data<AppState>, form: web::Form<GroupForm>) -> impl Responder {
    save(session, state, String::new(), form).await
}

pub async fn update(
    session: Session,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<GroupForm>,
) -> impl Responder {
    save(session, state, path.into_inner(), form).await
}

async fn save(
    session: Session,
    state: web::Data<AppState>,
    path_name: String,
    form: web::Form<GroupForm>,
) -> HttpResponse {
    if let Err(resp) = auth::require_admin(&session, &state) {
        return resp;
    }
    if !csrf::verify(&session, &form.csrf_token) {
        return HttpResponse::BadRequest().body("invalid or expired form, please retry");
    }

    let is_new = path_name.is_empty();
    let members: BTreeSet<String> = form
        .members
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    let permissions = Permissions {
        portunus: PortunusPermissions {
            is_admin: form.is_admin.is_some(),
        },
        ldap: LdapPermissions {
            can_read: form.can_read_ldap.is_some(),
        },
    };
    let long_name = form.long_name.clone();
    let name = form.name.clone();

    let errors = state.nexus.update(
        move |db| {
            let target = if is_new { None } else { db.find_group_mut(&path_name) };
            match target {
                Some(group) => {
                    group.long_name = long_name.clone();
                    group.member_login_names = members.clone();
                    group.permissions = permissions;
                }
                None => db.groups.push(Group {
                    name: name.clone(),
                    long_name: long_name.clone(),
                    member_login_names: members.clone(),
                    permissions,
                    posix_gid: None,
                }),
            }
            Ok(())
        },
        admin_opts(),
    );

    if errors.is_empty() {
        HttpResponse::Found().insert_header((header::LOCATION, "/groups")).finish()
    } else {
        render_edit_form(
            &session,
            form.name.clone(),
            form.long_name.clone(),
            form.members.clone(),
            form.is_admin.is_some(),
            form.can_read_ldap.is_some(),
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

    let name = path.into_inner();
    state.nexus.update(
        move |db| {
            db.groups.retain(|g| g.name != name);
            Ok(())
        },
        admin_opts(),
    );
    HttpResponse::Found().insert_header((header::LOCATION, "/groups")).finish()
}
