//! Askama template structs. Each mirrors one `.html` file under `templates/`.

use askama::Template;

pub struct UserRow {
    pub login_name: String,
    pub full_name: String,
    pub email: String,
    pub is_admin: bool,
}

pub struct GroupRow {
    pub name: String,
    pub long_name: String,
    pub member_count: usize,
    pub is_admin: bool,
    pub can_read_ldap: bool,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub users: Vec<UserRow>,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "edit_user.html")]
pub struct EditUserTemplate {
    pub login_name: String,
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub ssh_public_keys: String,
    pub is_new: bool,
    pub csrf_token: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "groups.html")]
pub struct GroupsTemplate {
    pub groups: Vec<GroupRow>,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "edit_group.html")]
pub struct EditGroupTemplate {
    pub name: String,
    pub long_name: String,
    pub members: String,
    pub is_admin: bool,
    pub can_read_ldap: bool,
    pub is_new: bool,
    pub csrf_token: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "self_service.html")]
pub struct SelfServiceTemplate {
    pub login_name: String,
    pub csrf_token: String,
    pub error: Option<String>,
    pub message: Option<String>,
}
