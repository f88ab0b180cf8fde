//! `Group` value type.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use portunus_common::field_ref::{FieldRef, ObjectType, ValidationError};
use portunus_common::validate;

use crate::user::User;

/// Portunus-internal permissions: whether the group's members may
/// administer this service through the web UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PortunusPermissions {
    #[serde(default)]
    pub is_admin: bool,
}

/// LDAP-facing permissions: whether the group's members may read the
/// projected directory tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LdapPermissions {
    #[serde(default)]
    pub can_read: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub portunus: PortunusPermissions,
    #[serde(default)]
    pub ldap: LdapPermissions,
}

impl Permissions {
    /// Elementwise OR.
    pub fn union(&self, other: &Permissions) -> Permissions {
        Permissions {
            portunus: PortunusPermissions {
                is_admin: self.portunus.is_admin || other.portunus.is_admin,
            },
            ldap: LdapPermissions {
                can_read: self.ldap.can_read || other.ldap.can_read,
            },
        }
    }

    /// True if every permission set in `other` is also set in `self`.
    pub fn includes(&self, other: &Permissions) -> bool {
        (!other.portunus.is_admin || self.portunus.is_admin)
            && (!other.ldap.can_read || self.ldap.can_read)
    }
}

/// A single group. Membership is stored by login-name string, not by
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Group {
    pub name: String,
    pub long_name: String,
    #[serde(default, rename = "members")]
    pub member_login_names: BTreeSet<String>,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posix_gid: Option<u32>,
}

impl Group {
    pub fn key(&self) -> &str {
        &self.name
    }

    pub fn contains_user(&self, user: &User) -> bool {
        self.member_login_names.contains(user.key())
    }

    /// Adds or removes a single member. A Rust-native stand-in for the
    /// source's `map[string]bool` membership representation: present/absent
    /// is modeled directly by set membership, so there is no intermediate
    /// "false but still present" state for `Database::normalize` to clean
    /// up (see DESIGN.md).
    pub fn set_membership(&mut self, login_name: &str, present: bool) {
        if present {
            self.member_login_names.insert(login_name.to_string());
        } else {
            self.member_login_names.remove(login_name);
        }
    }

    pub fn validate_fields(&self, name_regex: &regex::Regex) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let field = |name: &str| FieldRef::new(ObjectType::Group, self.name.clone(), name);

        if let Err(msg) = validate::must_not_be_empty(&self.name) {
            errors.push(field("name").wrap(msg));
        } else if let Err(msg) = validate::must_not_have_surrounding_spaces(&self.name) {
            errors.push(field("name").wrap(msg));
        } else if let Err(msg) = validate::must_match_name_regex(&self.name, name_regex) {
            errors.push(field("name").wrap(msg));
        }

        if let Err(msg) = validate::must_not_be_empty(&self.long_name) {
            errors.push(field("long_name").wrap(msg));
        }

        if let Some(gid) = self.posix_gid {
            if let Err(msg) = validate::must_be_posix_uid_or_gid(gid) {
                errors.push(field("posix_gid").wrap(msg));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portunus_common::validate::DEFAULT_NAME_REGEX;

    fn valid_group() -> Group {
        Group {
            name: "maxgroup".into(),
            long_name: "Maximal Group".into(),
            member_login_names: BTreeSet::from(["maxuser".to_string()]),
            permissions: Permissions {
                portunus: PortunusPermissions { is_admin: false },
                ldap: LdapPermissions { can_read: true },
            },
            posix_gid: Some(23),
        }
    }

    #[test]
    fn valid_group_has_no_errors() {
        assert!(valid_group().validate_fields(&DEFAULT_NAME_REGEX).is_empty());
    }

    #[test]
    fn set_membership_toggles_presence() {
        let mut group = valid_group();
        group.set_membership("otheruser", true);
        assert!(group.member_login_names.contains("otheruser"));
        group.set_membership("otheruser", false);
        assert!(!group.member_login_names.contains("otheruser"));
    }

    #[test]
    fn permissions_union_is_elementwise_or() {
        let a = Permissions {
            portunus: PortunusPermissions { is_admin: true },
            ldap: LdapPermissions { can_read: false },
        };
        let b = Permissions {
            portunus: PortunusPermissions { is_admin: false },
            ldap: LdapPermissions { can_read: true },
        };
        let union = a.union(&b);
        assert!(union.portunus.is_admin);
        assert!(union.ldap.can_read);
    }

    #[test]
    fn permissions_includes_is_subset_check() {
        let admin = Permissions {
            portunus: PortunusPermissions { is_admin: true },
            ldap: LdapPermissions { can_read: true },
        };
        let reader = Permissions {
            portunus: PortunusPermissions { is_admin: false },
            ldap: LdapPermissions { can_read: true },
        };
        assert!(admin.includes(&reader));
        assert!(!reader.includes(&admin));
    }
}
