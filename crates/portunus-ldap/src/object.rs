//! The rendered LDAP object shape: a DN plus an attribute map.

use std::collections::BTreeMap;

/// A single LDAP object as produced by rendering a database snapshot.
/// Attribute values are kept sorted so that structural/`PartialEq`
/// comparisons during diffing are stable regardless of construction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapObject {
    pub dn: String,
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl LdapObject {
    pub fn new(dn: impl Into<String>) -> Self {
        LdapObject {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute to a single value.
    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), vec![value.into()]);
        self
    }

    /// Sets an attribute to a list of values. An empty list is treated as
    /// "attribute absent": it is not inserted at all.
    pub fn set_many(mut self, key: &str, values: Vec<String>) -> Self {
        if !values.is_empty() {
            self.attributes.insert(key.to_string(), values);
        }
        self
    }

    /// Appends a single value to an objectClass-style multi-valued
    /// attribute, creating it if absent.
    pub fn push(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes
            .entry(key.to_string())
            .or_default()
            .push(value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_many_with_empty_list_omits_the_attribute() {
        let obj = LdapObject::new("cn=x").set_many("member", vec![]);
        assert!(!obj.attributes.contains_key("member"));
    }

    #[test]
    fn push_accumulates_into_same_key() {
        let obj = LdapObject::new("cn=x")
            .push("objectClass", "top")
            .push("objectClass", "groupOfNames");
        assert_eq!(
            obj.attributes.get("objectClass").unwrap(),
            &vec!["top".to_string(), "groupOfNames".to_string()]
        );
    }
}
