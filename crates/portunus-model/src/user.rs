//! `User` value type.

use serde::{Deserialize, Serialize};

use portunus_common::field_ref::{FieldRef, ObjectType, ValidationError};
use portunus_common::validate;

/// POSIX account attributes attached to a user that may also log into the
/// underlying operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Posix {
    pub uid: u32,
    pub gid: u32,
    pub home_directory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_shell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gecos: Option<String>,
}

/// A single user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub login_name: String,
    pub given_name: String,
    pub family_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_public_keys: Vec<String>,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posix: Option<Posix>,
}

impl User {
    /// The unique key identifying this user: its login name.
    pub fn key(&self) -> &str {
        &self.login_name
    }

    /// The full display name, used as the LDAP `cn`/GECOS fallback.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }

    /// Validates every field-level rule for this user in isolation. Does
    /// not check cross-object invariants (uniqueness, membership
    /// resolution) — those belong to `Database::validate`.
    pub fn validate_fields(&self, name_regex: &regex::Regex) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let field = |name: &str| FieldRef::new(ObjectType::User, self.login_name.clone(), name);

        if let Err(msg) = validate::must_not_be_empty(&self.login_name) {
            errors.push(field("login_name").wrap(msg));
        } else if let Err(msg) = validate::must_not_have_surrounding_spaces(&self.login_name) {
            errors.push(field("login_name").wrap(msg));
        } else if let Err(msg) = validate::must_match_name_regex(&self.login_name, name_regex) {
            errors.push(field("login_name").wrap(msg));
        }

        if let Err(msg) = validate::must_not_be_empty(&self.given_name) {
            errors.push(field("given_name").wrap(msg));
        }
        if let Err(msg) = validate::must_not_be_empty(&self.family_name) {
            errors.push(field("family_name").wrap(msg));
        }
        if let Err(msg) = validate::must_not_be_empty(&self.password_hash) {
            errors.push(field("password_hash").wrap(msg));
        }

        for key in &self.ssh_public_keys {
            if let Err(msg) = validate::must_be_ssh_public_key(key) {
                errors.push(field("ssh_public_keys").wrap(msg));
            }
        }

        if let Some(posix) = &self.posix {
            if let Err(msg) = validate::must_be_posix_uid_or_gid(posix.uid) {
                errors.push(field("posix.uid").wrap(msg));
            }
            if let Err(msg) = validate::must_be_posix_uid_or_gid(posix.gid) {
                errors.push(field("posix.gid").wrap(msg));
            }
            if let Err(msg) = validate::must_be_absolute_path(&posix.home_directory) {
                errors.push(field("posix.home_directory").wrap(msg));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portunus_common::validate::DEFAULT_NAME_REGEX;

    fn valid_user() -> User {
        User {
            login_name: "maxuser".into(),
            given_name: "Max".into(),
            family_name: "Mustermann".into(),
            email: None,
            ssh_public_keys: vec![],
            password_hash: "{BCRYPT}xyz".into(),
            posix: Some(Posix {
                uid: 42,
                gid: 23,
                home_directory: "/home/maxuser".into(),
                login_shell: None,
                gecos: None,
            }),
        }
    }

    #[test]
    fn valid_user_has_no_errors() {
        assert!(valid_user().validate_fields(&DEFAULT_NAME_REGEX).is_empty());
    }

    #[test]
    fn empty_login_name_is_rejected() {
        let mut user = valid_user();
        user.login_name = "".into();
        assert!(!user.validate_fields(&DEFAULT_NAME_REGEX).is_empty());
    }

    #[test]
    fn relative_home_directory_is_rejected() {
        let mut user = valid_user();
        user.posix.as_mut().unwrap().home_directory = "home/maxuser".into();
        let errors = user.validate_fields(&DEFAULT_NAME_REGEX);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("posix.home_directory"));
    }

    #[test]
    fn out_of_range_uid_is_rejected() {
        let mut user = valid_user();
        user.posix.as_mut().unwrap().uid = 70000;
        assert!(!user.validate_fields(&DEFAULT_NAME_REGEX).is_empty());
    }

    #[test]
    fn key_is_login_name() {
        assert_eq!(valid_user().key(), "maxuser");
    }

    #[test]
    fn full_name_concatenates_given_and_family() {
        assert_eq!(valid_user().full_name(), "Max Mustermann");
    }
}
