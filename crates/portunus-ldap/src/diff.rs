//! Diffs two renderings of the object tree into add/modify/delete
//! operations.

use std::collections::{BTreeMap, BTreeSet};

use crate::object::LdapObject;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeChange {
    Replace(String, Vec<String>),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Add {
        dn: String,
        attributes: BTreeMap<String, Vec<String>>,
    },
    Modify {
        dn: String,
        changes: Vec<AttributeChange>,
    },
    Delete {
        dn: String,
    },
}

/// Computes the minimal set of operations to turn `old` into `new`. DNs are
/// visited in sorted order, which is a deterministic stand-in for "the
/// order they were discovered" since the source's discovery
/// order is itself just map iteration.
pub fn diff(old: &[LdapObject], new: &[LdapObject]) -> Vec<Operation> {
    let old_by_dn: BTreeMap<&str, &LdapObject> = old.iter().map(|o| (o.dn.as_str(), o)).collect();
    let new_by_dn: BTreeMap<&str, &LdapObject> = new.iter().map(|o| (o.dn.as_str(), o)).collect();

    let all_dns: BTreeSet<&str> = old_by_dn.keys().chain(new_by_dn.keys()).copied().collect();

    let mut ops = Vec::new();
    for dn in all_dns {
        match (old_by_dn.get(dn), new_by_dn.get(dn)) {
            (None, Some(new_obj)) => ops.push(Operation::Add {
                dn: dn.to_string(),
                attributes: new_obj.attributes.clone(),
            }),
            (Some(_), None) => ops.push(Operation::Delete { dn: dn.to_string() }),
            (Some(old_obj), Some(new_obj)) => {
                let changes = diff_attributes(old_obj, new_obj);
                if !changes.is_empty() {
                    ops.push(Operation::Modify {
                        dn: dn.to_string(),
                        changes,
                    });
                }
            }
            (None, None) => unreachable!("dn came from one of the two maps"),
        }
    }
    ops
}

fn diff_attributes(old: &LdapObject, new: &LdapObject) -> Vec<AttributeChange> {
    let keys: BTreeSet<&String> = old.attributes.keys().chain(new.attributes.keys()).collect();
    let mut changes = Vec::new();
    for key in keys {
        match (old.attributes.get(key), new.attributes.get(key)) {
            (Some(o), Some(n)) if o != n => {
                changes.push(AttributeChange::Replace(key.clone(), n.clone()))
            }
            (Some(_), None) => changes.push(AttributeChange::Delete(key.clone())),
            (None, Some(n)) => changes.push(AttributeChange::Replace(key.clone(), n.clone())),
            _ => {}
        }
    }
    changes
}
