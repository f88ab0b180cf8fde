//! `Database` value type and its invariants.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use portunus_common::field_ref::{FieldRef, ObjectType, ValidationError};
use portunus_common::validate::DEFAULT_NAME_REGEX;

use crate::group::Group;
use crate::user::User;

/// Current on-disk schema version. Bumping this is a
/// breaking change to the store format.
pub const SCHEMA_VERSION: u32 = 1;

/// The name-grammar pair used while validating a database: falls back to
/// `DEFAULT_NAME_REGEX` when the operator hasn't overridden either one
/// (`PORTUNUS_USER_NAME_REGEX` / `PORTUNUS_GROUP_NAME_REGEX`).
pub struct NameGrammars<'a> {
    pub user_name: &'a Regex,
    pub group_name: &'a Regex,
}

impl<'a> NameGrammars<'a> {
    pub fn default_posix() -> NameGrammars<'static> {
        NameGrammars {
            user_name: &DEFAULT_NAME_REGEX,
            group_name: &DEFAULT_NAME_REGEX,
        }
    }
}

/// The authoritative set of users and groups. Ordering is significant after
/// `normalize`: both sequences are sorted ascending by key so that
/// structural equality (used by the nexus's no-op suppression) is stable
/// regardless of how entries were appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// On-disk envelope: `{"users": …, "groups": …,
/// "schema_version": 1}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDatabase {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Vec<Group>,
    pub schema_version: u32,
}

impl Database {
    pub fn find_user(&self, login_name: &str) -> Option<&User> {
        self.users.iter().find(|u| u.key() == login_name)
    }

    pub fn find_group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.key() == name)
    }

    pub fn find_user_mut(&mut self, login_name: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.key() == login_name)
    }

    pub fn find_group_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.key() == name)
    }

    /// Sorts users and groups ascending by key. Membership sets already
    /// carry only present entries by construction (see
    /// `Group::set_membership`), so there is nothing else to strip here —
    /// unlike the source's `map[string]bool` representation, which also had
    /// to drop `false`-valued entries.
    pub fn normalize(&mut self) {
        self.users.sort_by(|a, b| a.key().cmp(b.key()));
        self.groups.sort_by(|a, b| a.key().cmp(b.key()));
    }

    /// Runs every structural invariant and returns every violation found
    /// (never short-circuits on the first error).
    pub fn validate(&self, grammars: &NameGrammars) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let mut seen_logins: HashSet<&str> = HashSet::new();
        for user in &self.users {
            errors.extend(user.validate_fields(grammars.user_name));
            if !seen_logins.insert(user.key()) {
                errors.push(ValidationError::unscoped(format!(
                    "user \"{}\" is defined more than once",
                    user.key()
                )));
            }
        }

        let mut seen_groups: HashSet<&str> = HashSet::new();
        for group in &self.groups {
            errors.extend(group.validate_fields(grammars.group_name));
            if !seen_groups.insert(group.key()) {
                errors.push(ValidationError::unscoped(format!(
                    "group \"{}\" is defined more than once",
                    group.key()
                )));
            }

            for member in &group.member_login_names {
                if self.find_user(member).is_none() {
                    errors.push(
                        FieldRef::new(ObjectType::Group, group.key(), "members").wrap(format!(
                            "contains nonexistent user \"{}\"",
                            member
                        )),
                    );
                }
            }
        }

        errors
    }

    /// All users that are a member of some group granting LDAP read access
    /// — the membership of the virtual `cn=portunus-viewers` group.
    pub fn ldap_viewers(&self) -> Vec<&User> {
        let reading_groups: Vec<&Group> = self
            .groups
            .iter()
            .filter(|g| g.permissions.ldap.can_read)
            .collect();
        self.users
            .iter()
            .filter(|u| reading_groups.iter().any(|g| g.contains_user(u)))
            .collect()
    }
}

impl From<StoredDatabase> for Database {
    fn from(stored: StoredDatabase) -> Self {
        Database {
            users: stored.users,
            groups: stored.groups,
        }
    }
}

impl Database {
    pub fn into_stored(self) -> StoredDatabase {
        StoredDatabase {
            users: self.users,
            groups: self.groups,
            schema_version: SCHEMA_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{LdapPermissions, Permissions, PortunusPermissions};
    use crate::user::Posix;

    fn sample_user(login: &str) -> User {
        User {
            login_name: login.into(),
            given_name: "Max".into(),
            family_name: "Mustermann".into(),
            email: None,
            ssh_public_keys: vec![],
            password_hash: "{BCRYPT}xyz".into(),
            posix: None,
        }
    }

    fn sample_group(name: &str, members: &[&str]) -> Group {
        Group {
            name: name.into(),
            long_name: "A Group".into(),
            member_login_names: members.iter().map(|m| m.to_string()).collect(),
            permissions: Permissions::default(),
            posix_gid: None,
        }
    }

    #[test]
    fn validate_is_empty_for_consistent_database() {
        let db = Database {
            users: vec![sample_user("maxuser")],
            groups: vec![sample_group("maxgroup", &["maxuser"])],
        };
        assert!(db.validate(&NameGrammars::default_posix()).is_empty());
    }

    #[test]
    fn validate_reports_dangling_membership() {
        let db = Database {
            users: vec![],
            groups: vec![sample_group("maxgroup", &["ghost"])],
        };
        let errors = db.validate(&NameGrammars::default_posix());
        assert!(errors.iter().any(|e| e.to_string().contains("nonexistent user")));
    }

    #[test]
    fn validate_reports_duplicate_login_names() {
        let db = Database {
            users: vec![sample_user("maxuser"), sample_user("maxuser")],
            groups: vec![],
        };
        let errors = db.validate(&NameGrammars::default_posix());
        assert!(errors.iter().any(|e| e.to_string().contains("defined more than once")));
    }

    #[test]
    fn normalize_sorts_both_sequences() {
        let mut db = Database {
            users: vec![sample_user("bravo"), sample_user("alpha")],
            groups: vec![sample_group("zulu", &[]), sample_group("yankee", &[])],
        };
        db.normalize();
        assert_eq!(db.users[0].key(), "alpha");
        assert_eq!(db.users[1].key(), "bravo");
        assert_eq!(db.groups[0].key(), "yankee");
        assert_eq!(db.groups[1].key(), "zulu");
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut db = Database {
            users: vec![sample_user("bravo"), sample_user("alpha")],
            groups: vec![],
        };
        db.normalize();
        let once = db.clone();
        db.normalize();
        assert_eq!(db, once);
    }

    #[test]
    fn ldap_viewers_is_union_of_readable_group_members() {
        let mut group = sample_group("readers", &["maxuser"]);
        group.permissions.ldap.can_read = true;
        let db = Database {
            users: vec![sample_user("maxuser"), sample_user("other")],
            groups: vec![group],
        };
        let viewers: Vec<&str> = db.ldap_viewers().into_iter().map(|u| u.key()).collect();
        assert_eq!(viewers, vec!["maxuser"]);
    }

    #[test]
    fn stored_round_trip_preserves_normalized_database() {
        let mut db = Database {
            users: vec![sample_user("maxuser")],
            groups: vec![sample_group("maxgroup", &["maxuser"])],
        };
        db.normalize();

        let json = serde_json::to_string(&db.clone().into_stored()).unwrap();
        let stored: StoredDatabase = serde_json::from_str(&json).unwrap();
        let mut round_tripped: Database = stored.into();
        round_tripped.normalize();

        assert_eq!(round_tripped, db);
    }

    #[test]
    fn posix_fields_are_omitted_when_absent() {
        let db = Database {
            users: vec![sample_user("maxuser")],
            groups: vec![sample_group("maxgroup", &["maxuser"])],
        };
        let json = serde_json::to_string(&db.into_stored()).unwrap();
        assert!(!json.contains("posix"));
        assert!(!json.contains("posix_gid"));
    }

    #[test]
    fn posix_round_trips_when_present() {
        let mut user = sample_user("maxuser");
        user.posix = Some(Posix {
            uid: 42,
            gid: 23,
            home_directory: "/home/maxuser".into(),
            login_shell: None,
            gecos: None,
        });
        let db = Database {
            users: vec![user],
            groups: vec![],
        };
        let json = serde_json::to_string(&db.into_stored()).unwrap();
        let stored: StoredDatabase = serde_json::from_str(&json).unwrap();
        let round_tripped: Database = stored.into();
        assert_eq!(round_tripped.users[0].posix.as_ref().unwrap().uid, 42);
    }

    #[test]
    fn permissions_default_constructs() {
        let perms = Permissions {
            portunus: PortunusPermissions { is_admin: true },
            ldap: LdapPermissions { can_read: false },
        };
        assert!(perms.portunus.is_admin);
    }

    #[test]
    fn find_helpers_locate_by_key() {
        let db = Database {
            users: vec![sample_user("maxuser")],
            groups: vec![sample_group("maxgroup", &["maxuser"])],
        };
        assert!(db.find_user("maxuser").is_some());
        assert!(db.find_group("maxgroup").is_some());
        assert!(db.find_user("ghost").is_none());
    }

    #[test]
    fn members_serialize_as_sorted_array() {
        let group = sample_group("maxgroup", &["zulu", "alpha", "mike"]);
        let json = serde_json::to_value(&group).unwrap();
        let members: Vec<&str> = json["members"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(members, vec!["alpha", "mike", "zulu"]);
    }
}
