//! Environment configuration: the closed set of `PORTUNUS_*`
//! variables, each validated at startup. A malformed value is a fatal
//! `PortunusError::Config`, not a panic.

use std::path::PathBuf;

use regex::Regex;

use portunus_common::error::PortunusError;
use portunus_common::validate;

#[derive(Debug, Clone)]
pub struct SlapdTlsConfig {
    pub domain_name: String,
    pub ca_certificate_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub debug: bool,
    pub ldap_suffix: String,
    pub ldap_password: String,
    pub seed_path: Option<PathBuf>,
    pub state_dir: PathBuf,
    pub http_listen: String,
    pub http_secure: bool,
    pub user_name_regex: Option<Regex>,
    pub group_name_regex: Option<Regex>,
    pub slapd_tls: Option<SlapdTlsConfig>,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_flag(name: &str) -> bool {
    env_var(name).map(|v| v == "true").unwrap_or(false)
}

impl Config {
    /// Reads and validates every `PORTUNUS_*` variable. Required variables
    /// (`PORTUNUS_LDAP_SUFFIX`, `PORTUNUS_LDAP_PASSWORD`) missing entirely
    /// is also a `Config` error, not a panic — there is no sensible default
    /// for either.
    pub fn from_env() -> Result<Config, PortunusError> {
        let debug = env_flag("PORTUNUS_DEBUG");

        let ldap_suffix = env_var("PORTUNUS_LDAP_SUFFIX")
            .ok_or_else(|| PortunusError::config("PORTUNUS_LDAP_SUFFIX is required"))?;
        validate::must_be_ldap_suffix(&ldap_suffix).map_err(PortunusError::config)?;

        let ldap_password = env_var("PORTUNUS_LDAP_PASSWORD")
            .ok_or_else(|| PortunusError::config("PORTUNUS_LDAP_PASSWORD is required"))?;

        let seed_path = env_var("PORTUNUS_SEED_PATH").map(PathBuf::from);

        let state_dir = env_var("PORTUNUS_SERVER_STATE_DIR")
            .ok_or_else(|| PortunusError::config("PORTUNUS_SERVER_STATE_DIR is required"))?;
        validate::must_be_absolute_path(&state_dir).map_err(PortunusError::config)?;

        let http_listen = env_var("PORTUNUS_SERVER_HTTP_LISTEN").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        validate::must_be_listen_address(&http_listen).map_err(PortunusError::config)?;

        let http_secure = env_var("PORTUNUS_SERVER_HTTP_SECURE")
            .map(|v| v == "true")
            .unwrap_or(true);

        let user_name_regex = match env_var("PORTUNUS_USER_NAME_REGEX") {
            Some(pattern) => Some(Regex::new(&pattern).map_err(|e| {
                PortunusError::config(format!("PORTUNUS_USER_NAME_REGEX is not a valid regex: {}", e))
            })?),
            None => None,
        };
        let group_name_regex = match env_var("PORTUNUS_GROUP_NAME_REGEX") {
            Some(pattern) => Some(Regex::new(&pattern).map_err(|e| {
                PortunusError::config(format!("PORTUNUS_GROUP_NAME_REGEX is not a valid regex: {}", e))
            })?),
            None => None,
        };

        let slapd_tls = env_var("PORTUNUS_SLAPD_TLS_DOMAIN_NAME").map(|domain_name| SlapdTlsConfig {
            domain_name,
            ca_certificate_path: env_var("PORTUNUS_SLAPD_TLS_CA_CERTIFICATE"),
        });

        Ok(Config {
            debug,
            ldap_suffix,
            ldap_password,
            seed_path,
            state_dir: PathBuf::from(state_dir),
            http_listen,
            http_secure,
            user_name_regex,
            group_name_regex,
            slapd_tls,
        })
    }

    pub fn store_path(&self) -> PathBuf {
        self.state_dir.join("database.json")
    }
}
