//! End-to-end scenario tests against the `fixtures/seed-basic.json` fixture
//!.

use std::sync::Arc;

use portunus_hash::BcryptHasher;
use portunus_nexus::{Nexus, NexusConfig, UpdateOptions};

const FIXTURE_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures/seed-basic.json");

fn load_fixture_nexus() -> Nexus {
    let grammars = portunus_model::NameGrammars {
        user_name: &portunus_common::validate::DEFAULT_NAME_REGEX,
        group_name: &portunus_common::validate::DEFAULT_NAME_REGEX,
    };
    let seed = portunus_seed::read_seed(std::path::Path::new(FIXTURE_PATH), &grammars)
        .expect("fixture seed should parse and validate");

    let nexus = Nexus::new(NexusConfig {
        seed: Some(seed),
        hasher: Arc::new(BcryptHasher::new()),
        user_name_regex: None,
        group_name_regex: None,
    });
    let errors = nexus.update(|_db| Err(portunus_nexus::NeedsInitialization), UpdateOptions::default());
    assert!(errors.is_empty(), "bootstrap from seed failed: {}", errors);
    nexus
}

#[test]
fn scenario_1_bootstrap_from_empty_db_equals_the_fixture() {
    let nexus = load_fixture_nexus();
    let db = nexus.snapshot();

    let maxuser = db.find_user("maxuser").expect("maxuser present");
    assert_eq!(maxuser.given_name, "Max");
    assert_eq!(maxuser.family_name, "Mustermann");
    let posix = maxuser.posix.as_ref().expect("maxuser has posix attributes");
    assert_eq!(posix.uid, 42);
    assert_eq!(posix.gid, 23);
    assert_eq!(posix.home_directory, "/home/maxuser");

    let maxgroup = db.find_group("maxgroup").expect("maxgroup present");
    assert_eq!(maxgroup.long_name, "Maximal Group");
    assert_eq!(maxgroup.posix_gid, Some(23));
    assert!(maxgroup.permissions.ldap.can_read);
    assert!(maxgroup.member_login_names.contains("maxuser"));

    assert!(db.find_user("minuser").is_some());
    assert!(db.find_group("mingroup").is_some());
}

#[test]
fn scenario_2_divergent_update_is_silently_corrected_without_conflict_flag() {
    let nexus = load_fixture_nexus();

    let errors = nexus.update(
        |db| {
            db.find_group_mut("maxgroup").unwrap().long_name = "Renamed".to_string();
            Ok(())
        },
        UpdateOptions::default(),
    );

    assert!(errors.is_empty());
    assert_eq!(nexus.snapshot().find_group("maxgroup").unwrap().long_name, "Maximal Group");
}

#[test]
fn scenario_3_divergent_update_is_rejected_with_conflict_flag() {
    let nexus = load_fixture_nexus();

    let errors = nexus.update(
        |db| {
            db.find_group_mut("maxgroup").unwrap().long_name = "Renamed".to_string();
            Ok(())
        },
        UpdateOptions {
            conflict_with_seed_is_error: true,
            dry_run: false,
        },
    );

    assert_eq!(
        errors.to_string(),
        "field \"long_name\" in group \"maxgroup\" must be equal to the seeded value"
    );
    assert_eq!(nexus.snapshot().find_group("maxgroup").unwrap().long_name, "Maximal Group");
}

#[test]
fn scenario_4_additive_membership_change_is_accepted_under_conflict_flag() {
    let nexus = load_fixture_nexus();

    let errors = nexus.update(
        |db| {
            db.find_group_mut("maxgroup").unwrap().set_membership("minuser", true);
            Ok(())
        },
        UpdateOptions {
            conflict_with_seed_is_error: true,
            dry_run: false,
        },
    );

    assert!(errors.is_empty());
    assert!(nexus.snapshot().find_group("maxgroup").unwrap().member_login_names.contains("minuser"));
}
