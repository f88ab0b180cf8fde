//! Stateless validators and grammars.
//!
//! Every function here returns `Err(message)` describing the failure in a
//! form suitable for `FieldRef::wrap`; callers own the field attribution.

use std::sync::LazyLock;

use regex::Regex;

/// Default POSIX account-name grammar, used for both user login names and
/// group names when no operator override is configured.
pub static DEFAULT_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_-]*\$?$").expect("valid regex"));

static LDAP_SUFFIX_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("valid regex"));

static SSH_PUBLIC_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(ssh-[a-z0-9]+|ecdsa-sha2-[a-z0-9-]+) [A-Za-z0-9+/]+=*( .*)?$")
        .expect("valid regex")
});

pub fn must_not_be_empty(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(())
    }
}

pub fn must_not_have_surrounding_spaces(value: &str) -> Result<(), String> {
    if value != value.trim() {
        Err("must not have surrounding spaces".to_string())
    } else {
        Ok(())
    }
}

pub fn must_be_absolute_path(value: &str) -> Result<(), String> {
    if value.starts_with('/') {
        Ok(())
    } else {
        Err(format!("must be an absolute path, got \"{}\"", value))
    }
}

/// Validates against the given name grammar (the operator-configurable
/// regex, or `DEFAULT_NAME_REGEX` when unset).
pub fn must_match_name_regex(value: &str, pattern: &Regex) -> Result<(), String> {
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(format!(
            "must match the pattern {}, got \"{}\"",
            pattern.as_str(),
            value
        ))
    }
}

pub fn must_be_posix_account_name(value: &str) -> Result<(), String> {
    must_match_name_regex(value, &DEFAULT_NAME_REGEX)
}

pub fn must_be_posix_uid_or_gid(value: u32) -> Result<(), String> {
    if value <= 65535 {
        Ok(())
    } else {
        Err(format!("must be in the range 0..65535, got {}", value))
    }
}

/// Parses and validates a decimal UID/GID string, per the "decimal
/// 0..65535" grammar used when reading seed files (which carry numbers as
/// JSON integers, but the same rule applies).
pub fn must_parse_posix_uid_or_gid(value: &str) -> Result<u32, String> {
    let parsed: u32 = value
        .parse()
        .map_err(|_| format!("must be a decimal number in 0..65535, got \"{}\"", value))?;
    must_be_posix_uid_or_gid(parsed)?;
    Ok(parsed)
}

/// Validates authorized_keys-format SSH public keys: `<type> <base64>
/// [comment]`.
pub fn must_be_ssh_public_key(value: &str) -> Result<(), String> {
    if SSH_PUBLIC_KEY.is_match(value.trim()) {
        Ok(())
    } else {
        Err(format!("is not a valid SSH public key: \"{}\"", value))
    }
}

/// Validates an LDAP suffix: a comma-separated list of `dc=<token>`
/// components.
pub fn must_be_ldap_suffix(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    for component in value.split(',') {
        let component = component.trim();
        match component.strip_prefix("dc=") {
            Some(token) if LDAP_SUFFIX_TOKEN.is_match(token) => {}
            _ => {
                return Err(format!(
                    "must be a comma-separated list of dc=<token> components, got \"{}\"",
                    value
                ));
            }
        }
    }
    Ok(())
}

/// Validates a listen address: `ip4:port` or `[ip6]:port`. This is a
/// sanity filter, not a full parse — it rejects obviously bogus input
/// without attempting to resolve or fully parse the address, matching the
/// source's own deliberately loose grammar.
pub fn must_be_listen_address(value: &str) -> Result<(), String> {
    let bad = || format!("is not a valid listen address: \"{}\"", value);

    if let Some(rest) = value.strip_prefix('[') {
        let (host, port) = rest.split_once("]:").ok_or_else(bad)?;
        if host.is_empty() || !host.chars().all(|c| c.is_ascii_hexdigit() || c == ':') {
            return Err(bad());
        }
        validate_port(port).map_err(|_| bad())
    } else {
        let (host, port) = value.rsplit_once(':').ok_or_else(bad)?;
        if host.is_empty()
            || !host
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.')
        {
            return Err(bad());
        }
        validate_port(port).map_err(|_| bad())
    }
}

fn validate_port(port: &str) -> Result<(), ()> {
    if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
        return Err(());
    }
    port.parse::<u16>().map(|_| ()).map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_are_rejected() {
        assert!(must_not_be_empty("").is_err());
        assert!(must_not_be_empty("   ").is_err());
        assert!(must_not_be_empty("x").is_ok());
    }

    #[test]
    fn surrounding_spaces_are_rejected() {
        assert!(must_not_have_surrounding_spaces(" x").is_err());
        assert!(must_not_have_surrounding_spaces("x ").is_err());
        assert!(must_not_have_surrounding_spaces("x").is_ok());
    }

    #[test]
    fn absolute_paths_required() {
        assert!(must_be_absolute_path("/home/jdoe").is_ok());
        assert!(must_be_absolute_path("home/jdoe").is_err());
    }

    #[test]
    fn posix_account_names() {
        assert!(must_be_posix_account_name("jdoe").is_ok());
        assert!(must_be_posix_account_name("_svc").is_ok());
        assert!(must_be_posix_account_name("admins$").is_ok());
        assert!(must_be_posix_account_name("Jdoe").is_err());
        assert!(must_be_posix_account_name("1jdoe").is_err());
        assert!(must_be_posix_account_name("jdoe!").is_err());
    }

    #[test]
    fn uid_gid_range() {
        assert!(must_be_posix_uid_or_gid(0).is_ok());
        assert!(must_be_posix_uid_or_gid(65535).is_ok());
        assert!(must_be_posix_uid_or_gid(65536).is_err());
    }

    #[test]
    fn parse_uid_gid_rejects_non_numeric() {
        assert!(must_parse_posix_uid_or_gid("42").is_ok());
        assert!(must_parse_posix_uid_or_gid("-1").is_err());
        assert!(must_parse_posix_uid_or_gid("forty-two").is_err());
    }

    #[test]
    fn ssh_public_keys() {
        assert!(must_be_ssh_public_key(
            "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIMaxuserKey maxuser@example.com"
        )
        .is_ok());
        assert!(must_be_ssh_public_key("not a key").is_err());
    }

    #[test]
    fn ldap_suffix_grammar() {
        assert!(must_be_ldap_suffix("dc=example,dc=org").is_ok());
        assert!(must_be_ldap_suffix("dc=example").is_ok());
        assert!(must_be_ldap_suffix("example,dc=org").is_err());
        assert!(must_be_ldap_suffix("dc=Example").is_err());
        assert!(must_be_ldap_suffix("").is_err());
    }

    #[test]
    fn listen_address_grammar() {
        assert!(must_be_listen_address("127.0.0.1:389").is_ok());
        assert!(must_be_listen_address("0.0.0.0:636").is_ok());
        assert!(must_be_listen_address("[::1]:389").is_ok());
        assert!(must_be_listen_address("garbage").is_err());
        assert!(must_be_listen_address("127.0.0.1:notaport").is_err());
        assert!(must_be_listen_address("[::1]notevencolonport").is_err());
    }
}
