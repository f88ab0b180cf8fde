//! Core value types shared by every other Portunus crate: `User`, `Group`,
//! and the `Database` that owns them.

pub mod database;
pub mod group;
pub mod user;

pub use database::{Database, NameGrammars, StoredDatabase, SCHEMA_VERSION};
pub use group::{Group, LdapPermissions, Permissions, PortunusPermissions};
pub use user::{Posix, User};
