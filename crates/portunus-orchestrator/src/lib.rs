//! Privileged supervisor: binds the privileged
//! LDAP port, drops privilege, then runs `slapd` and the unprivileged
//! server as supervised children.

pub mod privilege;
pub mod supervisor;

pub use supervisor::LaunchPlan;
