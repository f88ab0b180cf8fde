//! Operator seed: parse, validate, apply, and detect conflicts.

pub mod command;
pub mod model;
pub mod raw;

pub use command::StringOrCommand;
pub use model::{Seed, SeedGroup, SeedPosix, SeedUser};

use std::path::Path;

use portunus_common::field_ref::ValidationError;
use portunus_model::{Database, NameGrammars};

/// Reads and fully validates a seed file: strict JSON parse, `from_command`
/// resolution, seed-specific checks (duplicates, POSIX completeness), and
/// `Database::validate` on the result of applying the seed to an empty
/// database. Every error found is returned; none of them short-circuit the
/// others.
pub fn read_seed(path: &Path, grammars: &NameGrammars) -> Result<Seed, Vec<ValidationError>> {
    let bytes = std::fs::read_to_string(path)
        .map_err(|e| vec![ValidationError::unscoped(format!("cannot read seed file: {}", e))])?;

    let raw: raw::RawSeed = serde_json::from_str(&bytes)
        .map_err(|e| vec![ValidationError::unscoped(format!("invalid seed file: {}", e))])?;

    let seed = Seed::resolve(raw)?;

    let mut errors = seed.validate_self();

    let mut staging = Database::default();
    // A no-op hasher is enough here: applying a seed to an empty DB for the
    // sole purpose of structural validation never needs to verify an
    // existing hash, only produce one.
    let hasher = portunus_hash::BcryptHasher::new();
    seed.apply_to(&mut staging, &hasher);
    errors.extend(staging.validate(grammars));

    if errors.is_empty() {
        Ok(seed)
    } else {
        Err(errors)
    }
}
