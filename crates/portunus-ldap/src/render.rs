//! Projects a `Database` snapshot into the LDAP object tree.

use portunus_model::{Database, Group, User};

use crate::object::LdapObject;

pub fn users_ou(suffix: &str) -> String {
    format!("ou=users,{}", suffix)
}

pub fn groups_ou(suffix: &str) -> String {
    format!("ou=groups,{}", suffix)
}

pub fn posix_groups_ou(suffix: &str) -> String {
    format!("ou=posix-groups,{}", suffix)
}

pub fn bind_user_dn(suffix: &str) -> String {
    format!("cn=portunus,{}", suffix)
}

pub fn nobody_dn(suffix: &str) -> String {
    format!("cn=nobody,{}", suffix)
}

pub fn user_dn(login_name: &str, suffix: &str) -> String {
    format!("uid={},{}", login_name, users_ou(suffix))
}

pub fn group_dn(name: &str, suffix: &str) -> String {
    format!("cn={},{}", name, groups_ou(suffix))
}

pub fn posix_group_dn(name: &str, suffix: &str) -> String {
    format!("cn={},{}", name, posix_groups_ou(suffix))
}

pub fn viewers_group_dn(suffix: &str) -> String {
    format!("cn=portunus-viewers,{}", suffix)
}

/// Renders the full object tree for `db` under `suffix`. Order is
/// significant only in that skeleton objects come first; the diff engine
/// does not depend on ordering beyond that.
pub fn render(db: &Database, suffix: &str, bind_password_hash: &str) -> Vec<LdapObject> {
    let mut objects = skeleton(suffix, bind_password_hash);

    for user in &db.users {
        objects.push(render_user(user, db, suffix));
    }
    for group in &db.groups {
        objects.push(render_group(group, suffix));
        if group.posix_gid.is_some() {
            objects.push(render_posix_group(group, suffix));
        }
    }
    objects.push(render_viewers_group(db, suffix));

    objects
}

fn skeleton(suffix: &str, bind_password_hash: &str) -> Vec<LdapObject> {
    let root_dc = suffix
        .split(',')
        .next()
        .and_then(|first| first.strip_prefix("dc="))
        .unwrap_or("");

    vec![
        LdapObject::new(suffix)
            .push("objectClass", "dcObject")
            .push("objectClass", "organization")
            .push("objectClass", "top")
            .set("dc", root_dc)
            .set("o", root_dc),
        LdapObject::new(users_ou(suffix))
            .push("objectClass", "organizationalUnit")
            .push("objectClass", "top")
            .set("ou", "users"),
        LdapObject::new(groups_ou(suffix))
            .push("objectClass", "organizationalUnit")
            .push("objectClass", "top")
            .set("ou", "groups"),
        LdapObject::new(posix_groups_ou(suffix))
            .push("objectClass", "organizationalUnit")
            .push("objectClass", "top")
            .set("ou", "posix-groups"),
        LdapObject::new(bind_user_dn(suffix))
            .push("objectClass", "organizationalRole")
            .push("objectClass", "top")
            .set("cn", "portunus")
            .set("userPassword", bind_password_hash),
        LdapObject::new(nobody_dn(suffix))
            .push("objectClass", "inetOrgPerson")
            .push("objectClass", "organizationalPerson")
            .push("objectClass", "person")
            .push("objectClass", "top")
            .set("cn", "nobody")
            .set("sn", "nobody"),
    ]
}

fn render_user(user: &User, db: &Database, suffix: &str) -> LdapObject {
    let member_of: Vec<String> = db
        .groups
        .iter()
        .filter(|g| g.contains_user(user))
        .map(|g| group_dn(g.key(), suffix))
        .collect();

    let mut obj = LdapObject::new(user_dn(user.key(), suffix))
        .push("objectClass", "portunusPerson")
        .push("objectClass", "inetOrgPerson")
        .push("objectClass", "organizationalPerson")
        .push("objectClass", "person")
        .push("objectClass", "top")
        .set("uid", user.login_name.clone())
        .set("cn", user.full_name())
        .set("sn", user.family_name.clone())
        .set("givenName", user.given_name.clone())
        .set("userPassword", user.password_hash.clone())
        .set_many("isMemberOf", member_of);

    if let Some(email) = &user.email {
        obj = obj.set("mail", email.clone());
    }
    if !user.ssh_public_keys.is_empty() {
        obj = obj.set_many("sshPublicKey", user.ssh_public_keys.clone());
    }
    if let Some(posix) = &user.posix {
        obj = obj
            .push("objectClass", "posixAccount")
            .set("uidNumber", posix.uid.to_string())
            .set("gidNumber", posix.gid.to_string())
            .set("homeDirectory", posix.home_directory.clone())
            .set("gecos", posix.gecos.clone().unwrap_or_else(|| user.full_name()));
        if let Some(shell) = &posix.login_shell {
            if !shell.is_empty() {
                obj = obj.set("loginShell", shell.clone());
            }
        }
    }

    obj
}

fn render_group(group: &Group, suffix: &str) -> LdapObject {
    let mut members: Vec<String> = group
        .member_login_names
        .iter()
        .map(|login| user_dn(login, suffix))
        .collect();
    if members.is_empty() {
        members.push(nobody_dn(suffix));
    }

    LdapObject::new(group_dn(group.key(), suffix))
        .push("objectClass", "groupOfNames")
        .push("objectClass", "top")
        .set("cn", group.name.clone())
        .set_many("member", members)
}

fn render_posix_group(group: &Group, suffix: &str) -> LdapObject {
    LdapObject::new(posix_group_dn(group.key(), suffix))
        .push("objectClass", "posixGroup")
        .push("objectClass", "top")
        .set("cn", group.name.clone())
        .set("gidNumber", group.posix_gid.unwrap_or_default().to_string())
        .set_many(
            "memberUid",
            group.member_login_names.iter().cloned().collect(),
        )
}

fn render_viewers_group(db: &Database, suffix: &str) -> LdapObject {
    let mut members: Vec<String> = db
        .ldap_viewers()
        .into_iter()
        .map(|u| user_dn(u.key(), suffix))
        .collect();
    if members.is_empty() {
        members.push(nobody_dn(suffix));
    }

    LdapObject::new(viewers_group_dn(suffix))
        .push("objectClass", "groupOfNames")
        .push("objectClass", "top")
        .set("cn", "portunus-viewers")
        .set_many("member", members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portunus_model::{LdapPermissions, Permissions, PortunusPermissions};
    use std::collections::BTreeSet;

    const SUFFIX: &str = "dc=example,dc=org";

    fn sample_db() -> Database {
        Database {
            users: vec![User {
                login_name: "maxuser".into(),
                given_name: "Max".into(),
                family_name: "Mustermann".into(),
                email: Some("max@example.org".into()),
                ssh_public_keys: vec!["ssh-ed25519 AAAA".into()],
                password_hash: "{BCRYPT}xyz".into(),
                posix: Some(portunus_model::Posix {
                    uid: 42,
                    gid: 23,
                    home_directory: "/home/maxuser".into(),
                    login_shell: None,
                    gecos: None,
                }),
            }],
            groups: vec![Group {
                name: "maxgroup".into(),
                long_name: "Maximal Group".into(),
                member_login_names: BTreeSet::from(["maxuser".to_string()]),
                permissions: Permissions {
                    portunus: PortunusPermissions { is_admin: false },
                    ldap: LdapPermissions { can_read: true },
                },
                posix_gid: Some(23),
            }],
        }
    }

    #[test]
    fn renders_skeleton_plus_user_and_both_group_branches_and_viewers() {
        let objects = render(&sample_db(), SUFFIX, "{BCRYPT}bind");
        let dns: Vec<&str> = objects.iter().map(|o| o.dn.as_str()).collect();

        assert!(dns.contains(&SUFFIX));
        assert!(dns.contains(&"uid=maxuser,ou=users,dc=example,dc=org"));
        assert!(dns.contains(&"cn=maxgroup,ou=groups,dc=example,dc=org"));
        assert!(dns.contains(&"cn=maxgroup,ou=posix-groups,dc=example,dc=org"));
        assert!(dns.contains(&"cn=portunus-viewers,dc=example,dc=org"));
    }

    #[test]
    fn empty_group_contains_nobody_placeholder() {
        let db = Database {
            users: vec![],
            groups: vec![Group {
                name: "emptygroup".into(),
                long_name: "Empty".into(),
                member_login_names: BTreeSet::new(),
                permissions: Permissions::default(),
                posix_gid: None,
            }],
        };
        let objects = render(&db, SUFFIX, "{BCRYPT}bind");
        let group = objects
            .iter()
            .find(|o| o.dn == "cn=emptygroup,ou=groups,dc=example,dc=org")
            .unwrap();
        assert_eq!(
            group.attributes.get("member").unwrap(),
            &vec![nobody_dn(SUFFIX)]
        );
    }

    #[test]
    fn viewers_group_is_union_of_readable_members() {
        let objects = render(&sample_db(), SUFFIX, "{BCRYPT}bind");
        let viewers = objects
            .iter()
            .find(|o| o.dn == viewers_group_dn(SUFFIX))
            .unwrap();
        assert_eq!(
            viewers.attributes.get("member").unwrap(),
            &vec![user_dn("maxuser", SUFFIX)]
        );
    }

    #[test]
    fn user_has_is_member_of_derived_attribute() {
        let objects = render(&sample_db(), SUFFIX, "{BCRYPT}bind");
        let user = objects
            .iter()
            .find(|o| o.dn == user_dn("maxuser", SUFFIX))
            .unwrap();
        assert_eq!(
            user.attributes.get("isMemberOf").unwrap(),
            &vec![group_dn("maxgroup", SUFFIX)]
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let db = sample_db();
        let a = render(&db, SUFFIX, "{BCRYPT}bind");
        let b = render(&db, SUFFIX, "{BCRYPT}bind");
        assert_eq!(a, b);
    }
}
