//! Strict on-disk shape of a seed file: a `Database`-shaped
//! document with every field optional, plus the `from_command` string
//! alternative. Unknown fields are a hard parse error.

use serde::Deserialize;

use crate::command::StringOrCommand;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RawSeed {
    pub users: Vec<RawSeedUser>,
    pub groups: Vec<RawSeedGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSeedUser {
    pub login_name: String,
    #[serde(default)]
    pub given_name: Option<StringOrCommand>,
    #[serde(default)]
    pub family_name: Option<StringOrCommand>,
    #[serde(default)]
    pub email: Option<StringOrCommand>,
    #[serde(default)]
    pub ssh_public_keys: Option<Vec<String>>,
    #[serde(default)]
    pub password: Option<StringOrCommand>,
    #[serde(default)]
    pub posix: Option<RawSeedPosix>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSeedPosix {
    #[serde(default)]
    pub uid: Option<u32>,
    #[serde(default)]
    pub gid: Option<u32>,
    #[serde(default)]
    pub home_directory: Option<StringOrCommand>,
    #[serde(default)]
    pub login_shell: Option<StringOrCommand>,
    #[serde(default)]
    pub gecos: Option<StringOrCommand>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSeedGroup {
    pub name: String,
    #[serde(default)]
    pub long_name: Option<StringOrCommand>,
    #[serde(default)]
    pub members: Option<std::collections::BTreeSet<String>>,
    #[serde(default)]
    pub permissions: Option<portunus_model::Permissions>,
    #[serde(default)]
    pub posix_gid: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_top_level_field_is_rejected() {
        let json = r#"{"users": [], "groups": [], "bogus": 1}"#;
        assert!(serde_json::from_str::<RawSeed>(json).is_err());
    }

    #[test]
    fn unknown_user_field_is_rejected() {
        let json = r#"{"users": [{"login_name": "max", "nickname": "m"}]}"#;
        assert!(serde_json::from_str::<RawSeed>(json).is_err());
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let parsed: RawSeed = serde_json::from_str("{}").unwrap();
        assert!(parsed.users.is_empty());
        assert!(parsed.groups.is_empty());
    }

    #[test]
    fn parses_full_user_and_group() {
        let json = r#"{
            "users": [{"login_name": "maxuser", "password": "swordfish"}],
            "groups": [{"name": "maxgroup", "members": ["maxuser"]}]
        }"#;
        let parsed: RawSeed = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.users.len(), 1);
        assert_eq!(parsed.groups.len(), 1);
    }
}
