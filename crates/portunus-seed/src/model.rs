//! Resolved seed (all `from_command` values already run) plus the apply and
//! conflict-detection operations.

use std::collections::BTreeSet;

use portunus_common::field_ref::{FieldRef, ObjectType, ValidationError};
use portunus_hash::PasswordHasher;
use portunus_model::{Database, Group, Permissions, Posix, User};

use crate::raw::{RawSeed, RawSeedGroup, RawSeedPosix, RawSeedUser};

#[derive(Debug, Clone, Default)]
pub struct Seed {
    pub users: Vec<SeedUser>,
    pub groups: Vec<SeedGroup>,
}

#[derive(Debug, Clone)]
pub struct SeedUser {
    pub login_name: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub email: Option<String>,
    pub ssh_public_keys: Option<Vec<String>>,
    pub password: Option<String>,
    pub posix: Option<SeedPosix>,
}

#[derive(Debug, Clone)]
pub struct SeedPosix {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub home_directory: Option<String>,
    pub login_shell: Option<String>,
    pub gecos: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SeedGroup {
    pub name: String,
    pub long_name: Option<String>,
    pub members: Option<BTreeSet<String>>,
    pub permissions: Option<Permissions>,
    pub posix_gid: Option<u32>,
}

impl Seed {
    /// Resolves every `from_command` value in a raw, just-parsed seed.
    /// Collects every resolution failure instead of stopping at the first.
    pub fn resolve(raw: RawSeed) -> Result<Seed, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut users = Vec::with_capacity(raw.users.len());
        for raw_user in raw.users {
            match resolve_user(raw_user) {
                Ok(u) => users.push(u),
                Err(e) => errors.push(e),
            }
        }
        let mut groups = Vec::with_capacity(raw.groups.len());
        for raw_group in raw.groups {
            match resolve_group(raw_group) {
                Ok(g) => groups.push(g),
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(Seed { users, groups })
        } else {
            Err(errors)
        }
    }

    /// Seed-specific checks beyond `Database::validate`: duplicate seeded
    /// entities, and a seeded POSIX block missing `uid`/`gid`.
    pub fn validate_self(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let mut seen_users = std::collections::HashSet::new();
        for user in &self.users {
            if !seen_users.insert(user.login_name.as_str()) {
                errors.push(ValidationError::unscoped(format!(
                    "user \"{}\" is seeded more than once",
                    user.login_name
                )));
            }
            if let Some(posix) = &user.posix {
                if posix.uid.is_none() || posix.gid.is_none() {
                    errors.push(
                        FieldRef::new(ObjectType::User, user.login_name.clone(), "posix")
                            .wrap("seeded posix block must supply uid and gid".to_string()),
                    );
                }
            }
        }

        let mut seen_groups = std::collections::HashSet::new();
        for group in &self.groups {
            if !seen_groups.insert(group.name.as_str()) {
                errors.push(ValidationError::unscoped(format!(
                    "group \"{}\" is seeded more than once",
                    group.name
                )));
            }
        }

        errors
    }

    /// Applies the seed onto `db` in place. Additive on group membership,
    /// overwriting on every other seeded field. Normalizes afterward.
    pub fn apply_to(&self, db: &mut Database, hasher: &dyn PasswordHasher) {
        for seed_group in &self.groups {
            let group = upsert_group(db, &seed_group.name);
            if let Some(long_name) = &seed_group.long_name {
                group.long_name = long_name.clone();
            }
            if let Some(members) = &seed_group.members {
                for member in members {
                    group.set_membership(member, true);
                }
            }
            if let Some(permissions) = &seed_group.permissions {
                group.permissions = *permissions;
            }
            if let Some(gid) = seed_group.posix_gid {
                group.posix_gid = Some(gid);
            }
        }

        for seed_user in &self.users {
            let user = upsert_user(db, &seed_user.login_name);
            if let Some(given_name) = &seed_user.given_name {
                user.given_name = given_name.clone();
            }
            if let Some(family_name) = &seed_user.family_name {
                user.family_name = family_name.clone();
            }
            if let Some(email) = &seed_user.email {
                user.email = Some(email.clone());
            }
            if let Some(keys) = &seed_user.ssh_public_keys {
                user.ssh_public_keys = keys.clone();
            }
            if let Some(posix) = &seed_user.posix {
                apply_posix(user, posix);
            }
            if let Some(password) = &seed_user.password {
                apply_password(user, password, hasher);
            }
        }

        db.normalize();
    }

    /// Clones `db`, applies the seed, and compares the result against the
    /// original field-by-field. Every seeded field that differs is reported
    /// on that field; seeded entities missing from `db` entirely are
    /// reported as "cannot be deleted".
    pub fn check_conflicts(&self, db: &Database, hasher: &dyn PasswordHasher) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for seed_group in &self.groups {
            let field = |name: &str| FieldRef::new(ObjectType::Group, seed_group.name.clone(), name);
            match db.find_group(&seed_group.name) {
                None => errors.push(field("name").wrap("cannot be deleted".to_string())),
                Some(existing) => {
                    if let Some(want) = &seed_group.long_name {
                        if &existing.long_name != want {
                            errors.push(field("long_name").wrap("must be equal to the seeded value".to_string()));
                        }
                    }
                    if let Some(want) = &seed_group.permissions {
                        if &existing.permissions != want {
                            errors.push(field("permissions").wrap("must be equal to the seeded value".to_string()));
                        }
                    }
                    if let Some(want) = seed_group.posix_gid {
                        if existing.posix_gid != Some(want) {
                            errors.push(field("posix_gid").wrap("must be equal to the seeded value".to_string()));
                        }
                    }
                    if let Some(members) = &seed_group.members {
                        for member in members {
                            if !existing.member_login_names.contains(member) {
                                errors.push(field("members").wrap(format!(
                                    "must contain the seeded member \"{}\"",
                                    member
                                )));
                            }
                        }
                    }
                }
            }
        }

        for seed_user in &self.users {
            let field = |name: &str| FieldRef::new(ObjectType::User, seed_user.login_name.clone(), name);
            match db.find_user(&seed_user.login_name) {
                None => errors.push(field("login_name").wrap("cannot be deleted".to_string())),
                Some(existing) => {
                    if let Some(want) = &seed_user.given_name {
                        if &existing.given_name != want {
                            errors.push(field("given_name").wrap("must be equal to the seeded value".to_string()));
                        }
                    }
                    if let Some(want) = &seed_user.family_name {
                        if &existing.family_name != want {
                            errors.push(field("family_name").wrap("must be equal to the seeded value".to_string()));
                        }
                    }
                    if let Some(want) = &seed_user.email {
                        if existing.email.as_ref() != Some(want) {
                            errors.push(field("email").wrap("must be equal to the seeded value".to_string()));
                        }
                    }
                    if let Some(want) = &seed_user.ssh_public_keys {
                        if &existing.ssh_public_keys != want {
                            errors.push(field("ssh_public_keys").wrap("must be equal to the seeded value".to_string()));
                        }
                    }
                    if let Some(posix) = &seed_user.posix {
                        let matches = match &existing.posix {
                            Some(p) => {
                                posix.uid.map(|uid| p.uid == uid).unwrap_or(true)
                                    && posix.gid.map(|gid| p.gid == gid).unwrap_or(true)
                                    && posix
                                        .home_directory
                                        .as_ref()
                                        .map(|h| &p.home_directory == h)
                                        .unwrap_or(true)
                                    && posix
                                        .login_shell
                                        .as_ref()
                                        .map(|s| p.login_shell.as_ref() == Some(s))
                                        .unwrap_or(true)
                                    && posix
                                        .gecos
                                        .as_ref()
                                        .map(|g| p.gecos.as_ref() == Some(g))
                                        .unwrap_or(true)
                            }
                            None => false,
                        };
                        if !matches {
                            errors.push(field("posix").wrap("must be equal to the seeded value".to_string()));
                        }
                    }
                    if let Some(password) = &seed_user.password {
                        if !hasher.check_password_hash(password, &existing.password_hash) {
                            errors.push(field("password").wrap("must be equal to the seeded value".to_string()));
                        }
                    }
                }
            }
        }

        errors
    }
}

fn resolve_user(raw: RawSeedUser) -> Result<SeedUser, ValidationError> {
    let field = |name: &str| FieldRef::new(ObjectType::User, raw.login_name.clone(), name);
    Ok(SeedUser {
        login_name: raw.login_name.clone(),
        given_name: resolve_opt(raw.given_name, &field, "given_name")?,
        family_name: resolve_opt(raw.family_name, &field, "family_name")?,
        email: resolve_opt(raw.email, &field, "email")?,
        ssh_public_keys: raw.ssh_public_keys,
        password: resolve_opt(raw.password, &field, "password")?,
        posix: raw.posix.map(|p| resolve_posix(p, &field)).transpose()?,
    })
}

fn resolve_posix(
    raw: RawSeedPosix,
    field: &impl Fn(&str) -> FieldRef,
) -> Result<SeedPosix, ValidationError> {
    Ok(SeedPosix {
        uid: raw.uid,
        gid: raw.gid,
        home_directory: resolve_opt(raw.home_directory, field, "posix.home_directory")?,
        login_shell: resolve_opt(raw.login_shell, field, "posix.login_shell")?,
        gecos: resolve_opt(raw.gecos, field, "posix.gecos")?,
    })
}

fn resolve_group(raw: RawSeedGroup) -> Result<SeedGroup, ValidationError> {
    let field = |name: &str| FieldRef::new(ObjectType::Group, raw.name.clone(), name);
    Ok(SeedGroup {
        name: raw.name.clone(),
        long_name: resolve_opt(raw.long_name, &field, "long_name")?,
        members: raw.members,
        permissions: raw.permissions,
        posix_gid: raw.posix_gid,
    })
}

fn resolve_opt(
    value: Option<crate::command::StringOrCommand>,
    field: &impl Fn(&str) -> FieldRef,
    name: &str,
) -> Result<Option<String>, ValidationError> {
    value
        .map(|v| v.resolve().map_err(|e| field(name).wrap(e)))
        .transpose()
}

fn upsert_group<'a>(db: &'a mut Database, name: &str) -> &'a mut Group {
    if db.find_group(name).is_none() {
        db.groups.push(Group {
            name: name.to_string(),
            long_name: String::new(),
            member_login_names: BTreeSet::new(),
            permissions: Permissions::default(),
            posix_gid: None,
        });
    }
    db.find_group_mut(name).expect("just inserted")
}

fn upsert_user<'a>(db: &'a mut Database, login_name: &str) -> &'a mut User {
    if db.find_user(login_name).is_none() {
        db.users.push(User {
            login_name: login_name.to_string(),
            given_name: String::new(),
            family_name: String::new(),
            email: None,
            ssh_public_keys: Vec::new(),
            password_hash: String::new(),
            posix: None,
        });
    }
    db.find_user_mut(login_name).expect("just inserted")
}

fn apply_posix(user: &mut User, seed: &SeedPosix) {
    let mut posix = user.posix.clone().unwrap_or(Posix {
        uid: seed.uid.unwrap_or(0),
        gid: seed.gid.unwrap_or(0),
        home_directory: String::new(),
        login_shell: None,
        gecos: None,
    });
    if let Some(uid) = seed.uid {
        posix.uid = uid;
    }
    if let Some(gid) = seed.gid {
        posix.gid = gid;
    }
    if let Some(home) = &seed.home_directory {
        posix.home_directory = home.clone();
    }
    if let Some(shell) = &seed.login_shell {
        posix.login_shell = Some(shell.clone());
    }
    if let Some(gecos) = &seed.gecos {
        posix.gecos = Some(gecos.clone());
    }
    user.posix = Some(posix);
}

/// Hashes a seeded password only when the stored hash is missing or weak,
/// so re-seeding doesn't force a bcrypt rehash on every run.
fn apply_password(user: &mut User, plaintext: &str, hasher: &dyn PasswordHasher) {
    let needs_hash = user.password_hash.is_empty()
        || hasher.is_weak_hash(&user.password_hash)
        || !hasher.check_password_hash(plaintext, &user.password_hash);
    if needs_hash {
        if let Ok(hash) = hasher.hash_password(plaintext) {
            user.password_hash = hash;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portunus_hash::BcryptHasher;

    fn seed_with_user(password: &str) -> Seed {
        Seed {
            users: vec![SeedUser {
                login_name: "maxuser".into(),
                given_name: Some("Max".into()),
                family_name: Some("Mustermann".into()),
                email: None,
                ssh_public_keys: None,
                password: Some(password.to_string()),
                posix: None,
            }],
            groups: vec![],
        }
    }

    #[test]
    fn apply_creates_missing_user() {
        let hasher = BcryptHasher::new();
        let seed = seed_with_user("swordfish");
        let mut db = Database::default();
        seed.apply_to(&mut db, &hasher);
        let user = db.find_user("maxuser").unwrap();
        assert!(hasher.check_password_hash("swordfish", &user.password_hash));
    }

    #[test]
    fn apply_is_idempotent_on_password_hash() {
        let hasher = BcryptHasher::new();
        let seed = seed_with_user("swordfish");
        let mut db = Database::default();
        seed.apply_to(&mut db, &hasher);
        let hash_after_first = db.find_user("maxuser").unwrap().password_hash.clone();
        seed.apply_to(&mut db, &hasher);
        let hash_after_second = db.find_user("maxuser").unwrap().password_hash.clone();
        assert_eq!(hash_after_first, hash_after_second);
    }

    #[test]
    fn apply_membership_is_additive() {
        let hasher = BcryptHasher::new();
        let seed = Seed {
            users: vec![],
            groups: vec![SeedGroup {
                name: "maxgroup".into(),
                long_name: None,
                members: Some(BTreeSet::from(["maxuser".to_string()])),
                permissions: None,
                posix_gid: None,
            }],
        };
        let mut db = Database {
            groups: vec![Group {
                name: "maxgroup".into(),
                long_name: "Existing".into(),
                member_login_names: BTreeSet::from(["otheruser".to_string()]),
                permissions: Permissions::default(),
                posix_gid: None,
            }],
            users: vec![],
        };
        seed.apply_to(&mut db, &hasher);
        let group = db.find_group("maxgroup").unwrap();
        assert!(group.member_login_names.contains("maxuser"));
        assert!(group.member_login_names.contains("otheruser"));
    }

    #[test]
    fn check_conflicts_is_empty_right_after_apply() {
        let hasher = BcryptHasher::new();
        let seed = seed_with_user("swordfish");
        let mut db = Database::default();
        seed.apply_to(&mut db, &hasher);
        assert!(seed.check_conflicts(&db, &hasher).is_empty());
    }

    #[test]
    fn check_conflicts_reports_diverged_scalar_field() {
        let hasher = BcryptHasher::new();
        let seed = Seed {
            users: vec![],
            groups: vec![SeedGroup {
                name: "maxgroup".into(),
                long_name: Some("Maximal Group".into()),
                members: None,
                permissions: None,
                posix_gid: None,
            }],
        };
        let db = Database {
            groups: vec![Group {
                name: "maxgroup".into(),
                long_name: "Something Else".into(),
                member_login_names: BTreeSet::new(),
                permissions: Permissions::default(),
                posix_gid: None,
            }],
            users: vec![],
        };
        let conflicts = seed.check_conflicts(&db, &hasher);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[0].to_string(),
            "field \"long_name\" in group \"maxgroup\" must be equal to the seeded value"
        );
    }

    #[test]
    fn check_conflicts_reports_diverged_posix_login_shell() {
        let hasher = BcryptHasher::new();
        let mut seed = seed_with_user("swordfish");
        seed.users[0].posix = Some(SeedPosix {
            uid: Some(42),
            gid: Some(23),
            home_directory: Some("/home/maxuser".into()),
            login_shell: Some("/bin/zsh".into()),
            gecos: None,
        });
        let db = Database {
            users: vec![User {
                login_name: "maxuser".into(),
                given_name: "Max".into(),
                family_name: "Mustermann".into(),
                email: None,
                ssh_public_keys: vec![],
                password_hash: hasher.hash_password("swordfish").unwrap(),
                posix: Some(Posix {
                    uid: 42,
                    gid: 23,
                    home_directory: "/home/maxuser".into(),
                    login_shell: Some("/bin/bash".into()),
                    gecos: None,
                }),
            }],
            groups: vec![],
        };
        let conflicts = seed.check_conflicts(&db, &hasher);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[0].to_string(),
            "field \"posix\" in user \"maxuser\" must be equal to the seeded value"
        );
    }

    #[test]
    fn check_conflicts_reports_vanished_seeded_group() {
        let hasher = BcryptHasher::new();
        let seed = Seed {
            users: vec![],
            groups: vec![SeedGroup {
                name: "maxgroup".into(),
                long_name: None,
                members: None,
                permissions: None,
                posix_gid: None,
            }],
        };
        let db = Database::default();
        let conflicts = seed.check_conflicts(&db, &hasher);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].to_string().contains("cannot be deleted"));
    }

    #[test]
    fn validate_self_flags_duplicate_seeded_user() {
        let seed = Seed {
            users: vec![seed_with_user("a").users[0].clone(), seed_with_user("b").users[0].clone()],
            groups: vec![],
        };
        let errors = seed.validate_self();
        assert!(errors.iter().any(|e| e.to_string().contains("more than once")));
    }

    #[test]
    fn validate_self_flags_posix_missing_uid_or_gid() {
        let mut seed = seed_with_user("a");
        seed.users[0].posix = Some(SeedPosix {
            uid: None,
            gid: Some(23),
            home_directory: Some("/home/maxuser".into()),
            login_shell: None,
            gecos: None,
        });
        let errors = seed.validate_self();
        assert!(errors.iter().any(|e| e.to_string().contains("uid and gid")));
    }
}
