//! Unprivileged server: wires the nexus together with the disk-store, LDAP,
//! and admin-UI adapters, and runs them until cancelled.

pub mod config;

use std::sync::Arc;

use actix_web::cookie::Key;
use tokio_util::sync::CancellationToken;

use config::Config;
use portunus_common::error::PortunusError;
use portunus_hash::BcryptHasher;
use portunus_ldap::{ConnectionConfig, LdapAdapter, TlsConfig};
use portunus_nexus::{Nexus, NexusConfig};

/// Builds the nexus and spawns every adapter's `Run` loop on the current
/// tokio runtime. Returns once all tasks have been spawned; the caller
/// drives the returned `CancellationToken` to shut everything down.
pub async fn run(config: Config, token: CancellationToken) -> Result<(), PortunusError> {
    let hasher = Arc::new(BcryptHasher::new());

    let seed = match &config.seed_path {
        Some(path) => {
            let grammars = portunus_model::NameGrammars {
                user_name: config.user_name_regex.as_ref().unwrap_or(&portunus_common::validate::DEFAULT_NAME_REGEX),
                group_name: config.group_name_regex.as_ref().unwrap_or(&portunus_common::validate::DEFAULT_NAME_REGEX),
            };
            let seed = portunus_seed::read_seed(path, &grammars)
                .map_err(|errs| PortunusError::config(format!("invalid seed file: {:?}", errs)))?;
            Some(seed)
        }
        None => None,
    };

    let nexus = Nexus::new(NexusConfig {
        seed,
        hasher: hasher.clone(),
        user_name_regex: config.user_name_regex.clone(),
        group_name_regex: config.group_name_regex.clone(),
    });

    let store = portunus_store::DiskStore::new(config.store_path());
    let store_nexus = nexus.clone();
    let store_token = token.clone();
    tokio::spawn(async move {
        if let Err(e) = store.run(store_nexus, store_token).await {
            tracing::error!(error = %e, "disk-store adapter exited");
        }
    });

    let connection = ConnectionConfig {
        suffix: config.ldap_suffix.clone(),
        bind_password: config.ldap_password.clone(),
        tls: config.slapd_tls.as_ref().map(|tls| TlsConfig {
            domain_name: tls.domain_name.clone(),
            ca_certificate_path: tls.ca_certificate_path.clone(),
        }),
    };
    let bind_password_hash = hasher
        .hash_password(&config.ldap_password)
        .map_err(|e| PortunusError::config(format!("failed to hash ldap bind password: {}", e)))?;
    let ldap_adapter = LdapAdapter::new(config.ldap_suffix.clone(), bind_password_hash, connection);
    let ldap_nexus = nexus.clone();
    let ldap_token = token.clone();
    tokio::spawn(async move {
        if let Err(e) = ldap_adapter.run(ldap_nexus, ldap_token).await {
            tracing::error!(error = %e, "ldap adapter exited");
        }
    });

    let web_state = portunus_web::AppState {
        nexus,
        hasher,
        secure_cookies: config.http_secure,
    };
    let server = portunus_web::server(web_state, Key::generate(), &config.http_listen)?;
    let server_handle = server.handle();
    tokio::spawn(server);

    tokio::spawn(async move {
        token.cancelled().await;
        server_handle.stop(true).await;
    });

    Ok(())
}

/// Raises the default log filter to `debug` when `PORTUNUS_DEBUG=true`.
pub fn init_logging(debug: bool) {
    let default_directive = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();
}
