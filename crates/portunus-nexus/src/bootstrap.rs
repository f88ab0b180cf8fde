//! First-run bootstrap: when
//! neither a store file nor a seed produces an initial database, generate
//! an `admin` user with a random password and print it once.

use std::collections::BTreeSet;

use rand::distr::Alphanumeric;
use rand::Rng;

use portunus_hash::PasswordHasher;
use portunus_model::{Database, Group, LdapPermissions, Permissions, PortunusPermissions, User};

const GENERATED_PASSWORD_LENGTH: usize = 24;

/// Builds the bootstrap database and returns it alongside the plaintext
/// password, which the caller logs exactly once and then discards.
pub fn bootstrap_database(hasher: &dyn PasswordHasher) -> (Database, String) {
    let password = generate_password();
    let hash = hasher
        .hash_password(&password)
        .expect("bootstrap password hashing must not fail");

    let admin = User {
        login_name: "admin".to_string(),
        given_name: "Portunus".to_string(),
        family_name: "Administrator".to_string(),
        email: None,
        ssh_public_keys: Vec::new(),
        password_hash: hash,
        posix: None,
    };
    let admins = Group {
        name: "admins".to_string(),
        long_name: "Portunus Administrators".to_string(),
        member_login_names: BTreeSet::from(["admin".to_string()]),
        permissions: Permissions {
            portunus: PortunusPermissions { is_admin: true },
            ldap: LdapPermissions { can_read: true },
        },
        posix_gid: None,
    };

    let db = Database {
        users: vec![admin],
        groups: vec![admins],
    };
    (db, password)
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use portunus_hash::BcryptHasher;

    #[test]
    fn bootstrap_creates_verifiable_admin() {
        let hasher = BcryptHasher::new();
        let (db, password) = bootstrap_database(&hasher);
        let admin = db.find_user("admin").unwrap();
        assert!(hasher.check_password_hash(&password, &admin.password_hash));
    }

    #[test]
    fn bootstrap_admin_is_member_of_admins_group() {
        let hasher = BcryptHasher::new();
        let (db, _) = bootstrap_database(&hasher);
        let group = db.find_group("admins").unwrap();
        assert!(group.contains_user(db.find_user("admin").unwrap()));
        assert!(group.permissions.portunus.is_admin);
    }

    #[test]
    fn generated_passwords_are_not_trivially_repeated() {
        assert_ne!(generate_password(), generate_password());
    }
}
