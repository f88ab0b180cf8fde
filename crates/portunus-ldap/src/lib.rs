//! LDAP adapter: renders the database into a directory tree,
//! diffs it against a shadow copy, and submits the difference over LDAP.

pub mod connection;
pub mod diff;
pub mod object;
pub mod render;

use ldap3::{Ldap, Mod};
use tokio_util::sync::CancellationToken;

use portunus_common::error::PortunusError;
use portunus_model::Database;
use portunus_nexus::Nexus;

pub use connection::{ConnectionConfig, TlsConfig};
pub use diff::{AttributeChange, Operation};
pub use object::LdapObject;

/// Projects database snapshots into LDAP and keeps the directory in sync
/// with the nexus's committed state.
pub struct LdapAdapter {
    suffix: String,
    bind_password_hash: String,
    connection: ConnectionConfig,
}

impl LdapAdapter {
    pub fn new(suffix: String, bind_password_hash: String, connection: ConnectionConfig) -> Self {
        LdapAdapter {
            suffix,
            bind_password_hash,
            connection,
        }
    }

    /// Runs until `token` is cancelled: connects (with retry), registers as
    /// a nexus listener, and on every snapshot renders, diffs against the
    /// shadow, and submits the delta.
    pub async fn run(&self, nexus: Nexus, token: CancellationToken) -> Result<(), PortunusError> {
        let mut ldap = connection::connect(&self.connection).await?;

        let handle = nexus.add_listener(token.clone());
        let mut receiver = handle.receiver;
        let mut shadow: Vec<LdapObject> = Vec::new();

        loop {
            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                snapshot = receiver.recv() => {
                    let Some(snapshot) = snapshot else { return Ok(()) };
                    self.sync_once(&mut ldap, &snapshot, &mut shadow).await?;
                }
            }
        }
    }

    async fn sync_once(
        &self,
        ldap: &mut Ldap,
        db: &Database,
        shadow: &mut Vec<LdapObject>,
    ) -> Result<(), PortunusError> {
        let projection = render::render(db, &self.suffix, &self.bind_password_hash);
        let ops = diff::diff(shadow, &projection);

        for op in ops {
            submit(ldap, op).await?;
        }

        *shadow = projection;
        Ok(())
    }
}

async fn submit(ldap: &mut Ldap, op: Operation) -> Result<(), PortunusError> {
    match op {
        Operation::Add { dn, attributes } => {
            let attrs: Vec<(String, std::collections::HashSet<String>)> = attributes
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect();
            ldap.add(&dn, attrs)
                .await
                .map_err(|e| PortunusError::protocol(format!("ldap add {} failed: {}", dn, e)))?
                .success()
                .map_err(|e| PortunusError::protocol(format!("ldap add {} rejected: {}", dn, e)))?;
        }
        Operation::Modify { dn, changes } => {
            let mods: Vec<Mod<String>> = changes
                .into_iter()
                .map(|change| match change {
                    AttributeChange::Replace(key, values) => {
                        Mod::Replace(key, values.into_iter().collect())
                    }
                    AttributeChange::Delete(key) => Mod::Delete(key, std::collections::HashSet::new()),
                })
                .collect();
            ldap.modify(&dn, mods)
                .await
                .map_err(|e| PortunusError::protocol(format!("ldap modify {} failed: {}", dn, e)))?
                .success()
                .map_err(|e| PortunusError::protocol(format!("ldap modify {} rejected: {}", dn, e)))?;
        }
        Operation::Delete { dn } => {
            ldap.delete(&dn)
                .await
                .map_err(|e| PortunusError::protocol(format!("ldap delete {} failed: {}", dn, e)))?
                .success()
                .map_err(|e| PortunusError::protocol(format!("ldap delete {} rejected: {}", dn, e)))?;
        }
    }
    Ok(())
}
