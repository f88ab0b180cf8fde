//! Privilege drop: resolves the configured service user/group
//! by name and switches real/effective/saved UID+GID before exec'ing any
//! unprivileged child. Must run after the privileged LDAP port is bound and
//! before `slapd`/the server are spawned.

use nix::unistd::{Gid, Group, Uid, User, initgroups, setresgid, setresuid};

use portunus_common::error::PortunusError;

/// Looks up `user_name`/`group_name` and permanently drops to them. Returns
/// an error rather than panicking — a misconfigured service account name is
/// an operator mistake, not a programmer one.
pub fn drop_to(user_name: &str, group_name: &str) -> Result<(), PortunusError> {
    let user = User::from_name(user_name)
        .map_err(|e| PortunusError::config(format!("failed to look up user {}: {}", user_name, e)))?
        .ok_or_else(|| PortunusError::config(format!("no such user: {}", user_name)))?;
    let group = Group::from_name(group_name)
        .map_err(|e| PortunusError::config(format!("failed to look up group {}: {}", group_name, e)))?
        .ok_or_else(|| PortunusError::config(format!("no such group: {}", group_name)))?;

    // Order matters: supplementary groups and the primary GID must be set
    // while we still have the privilege to change them, before dropping the
    // UID makes that impossible.
    initgroups(&std::ffi::CString::new(user_name).unwrap(), group.gid)
        .map_err(|e| PortunusError::config(format!("initgroups failed: {}", e)))?;
    set_gid(group.gid)?;
    set_uid(user.uid)?;

    tracing::info!(user = user_name, group = group_name, "dropped privileges");
    Ok(())
}

fn set_gid(gid: Gid) -> Result<(), PortunusError> {
    setresgid(gid, gid, gid).map_err(|e| PortunusError::config(format!("setresgid failed: {}", e)))
}

fn set_uid(uid: Uid) -> Result<(), PortunusError> {
    setresuid(uid, uid, uid).map_err(|e| PortunusError::config(format!("setresuid failed: {}", e)))
}
