//! Connection lifecycle: retrying initial connect, service-user
//! bind, and the LDAPS-vs-plain-loopback choice. Modeled on the
//! `LdapConnAsync::with_settings` + spawned `conn.drive()` pattern.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::time::Duration;

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings};
use tokio::time::sleep;

use portunus_common::error::PortunusError;

use crate::render::bind_user_dn;

const MAX_CONNECT_ATTEMPTS: u32 = 10;
const INITIAL_BACKOFF: Duration = Duration::from_millis(5);

/// TLS parameters derived from `PORTUNUS_SLAPD_TLS_*`. Presence of this
/// struct means "connect via LDAPS"; its absence means plain loopback LDAP.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub domain_name: String,
    pub ca_certificate_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub suffix: String,
    pub bind_password: String,
    pub tls: Option<TlsConfig>,
}

impl ConnectionConfig {
    fn url(&self) -> String {
        match &self.tls {
            Some(tls) => format!("ldaps://{}:636", tls.domain_name),
            None => "ldap://127.0.0.1:389".to_string(),
        }
    }
}

/// Connects and binds as the service user, retrying up to
/// `MAX_CONNECT_ATTEMPTS` times with exponential backoff starting at
/// `INITIAL_BACKOFF` — `slapd` is started in parallel and may not yet be
/// listening.
pub async fn connect(config: &ConnectionConfig) -> Result<Ldap, PortunusError> {
    let mut backoff = INITIAL_BACKOFF;
    let mut last_err = None;

    for attempt in 1..=MAX_CONNECT_ATTEMPTS {
        match try_connect(config).await {
            Ok(ldap) => return Ok(ldap),
            Err(e) => {
                tracing::warn!(attempt, error = %e, "ldap connect attempt failed");
                last_err = Some(e);
                if attempt < MAX_CONNECT_ATTEMPTS {
                    sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| PortunusError::protocol("ldap connect failed with no recorded error")))
}

/// Builds a rustls client config trusting only the certificates in
/// `ca_certificate_path`, so `slapd`'s certificate is verified against the
/// operator-supplied CA instead of the system trust roots.
fn tls_client_config(ca_certificate_path: &str) -> Result<Arc<rustls::ClientConfig>, PortunusError> {
    let file = File::open(ca_certificate_path)
        .map_err(|e| PortunusError::protocol(format!("failed to open CA certificate {}: {}", ca_certificate_path, e)))?;
    let mut reader = BufReader::new(file);

    let mut root_store = rustls::RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert.map_err(|e| PortunusError::protocol(format!("invalid CA certificate {}: {}", ca_certificate_path, e)))?;
        root_store
            .add(cert)
            .map_err(|e| PortunusError::protocol(format!("untrusted CA certificate {}: {}", ca_certificate_path, e)))?;
    }

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

async fn try_connect(config: &ConnectionConfig) -> Result<Ldap, PortunusError> {
    // LDAPS vs plain is selected entirely by the URL scheme.
    let mut settings = LdapConnSettings::new();
    if let Some(tls) = &config.tls {
        if let Some(ca_certificate_path) = &tls.ca_certificate_path {
            settings = settings.set_config(tls_client_config(ca_certificate_path)?);
        }
    }

    let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &config.url())
        .await
        .map_err(|e| PortunusError::protocol(format!("ldap connect failed: {}", e)))?;

    tokio::spawn(async move {
        if let Err(e) = conn.drive().await {
            tracing::error!(error = %e, "ldap connection driver exited");
        }
    });

    ldap.simple_bind(&bind_user_dn(&config.suffix), &config.bind_password)
        .await
        .map_err(|e| PortunusError::protocol(format!("ldap bind failed: {}", e)))?
        .success()
        .map_err(|e| PortunusError::protocol(format!("ldap bind rejected: {}", e)))?;

    Ok(ldap)
}
