pub mod auth;
pub mod groups;
pub mod self_service;
pub mod users;

use actix_web::web;

/// Registers every handler on the given scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::get().to(auth::login_form))
        .route("/login", web::post().to(auth::login_submit))
        .route("/logout", web::post().to(auth::logout))
        .route("/self", web::get().to(self_service::page))
        .route("/self/password", web::post().to(self_service::change_password))
        .route("/users", web::get().to(users::list))
        .route("/users/new", web::get().to(users::new_form))
        .route("/users/new", web::post().to(users::create))
        .route("/users/{login_name}/edit", web::get().to(users::edit_form))
        .route("/users/{login_name}/edit", web::post().to(users::update))
        .route("/users/{login_name}/delete", web::post().to(users::delete))
        .route("/groups", web::get().to(groups::list))
        .route("/groups/new", web::get().to(groups::new_form))
        .route("/groups/new", web::post().to(groups::create))
        .route("/groups/{name}/edit", web::get().to(groups::edit_form))
        .route("/groups/{name}/edit", web::post().to(groups::update))
        .route("/groups/{name}/delete", web::post().to(groups::delete));
}
