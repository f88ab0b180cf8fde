//! The Nexus: the only component allowed to write the authoritative
//! `Database`. Owns a single exclusive lock covering the whole
//! update protocol, including listener invocation.

pub mod bootstrap;
pub mod listener;

use std::sync::Arc;

use parking_lot::Mutex;
use regex::Regex;
use tokio_util::sync::CancellationToken;

use portunus_common::error::ErrorSet;
use portunus_common::validate::DEFAULT_NAME_REGEX;
use portunus_hash::PasswordHasher;
use portunus_model::{Database, NameGrammars};
use portunus_seed::Seed;

use listener::{ListenerEntry, ListenerHandle, DEFAULT_LISTENER_CAPACITY};

/// Sentinel returned by a reducer action when it has no usable state to
/// work from (e.g. the store file does not exist yet). This is not itself
/// an error kind — it is a signal consumed entirely within `Nexus::update`.
#[derive(Debug, Clone, Copy)]
pub struct NeedsInitialization;

/// Options controlling a single `Nexus::update` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// When set, any divergence from the configured seed is reported as a
    /// validation error instead of being silently corrected.
    pub conflict_with_seed_is_error: bool,
    /// When set, validate and compute conflicts but never commit.
    pub dry_run: bool,
}

struct NexusState {
    db: Database,
    listeners: Vec<ListenerEntry>,
    seed: Option<Seed>,
    hasher: Arc<dyn PasswordHasher>,
    user_name_regex: Regex,
    group_name_regex: Regex,
}

/// The authoritative database plus its update protocol. Cheaply cloneable:
/// every clone shares the same lock and state.
#[derive(Clone)]
pub struct Nexus(Arc<Mutex<NexusState>>);

/// Construction parameters for a `Nexus`.
pub struct NexusConfig {
    pub seed: Option<Seed>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub user_name_regex: Option<Regex>,
    pub group_name_regex: Option<Regex>,
}

impl Nexus {
    pub fn new(config: NexusConfig) -> Nexus {
        Nexus(Arc::new(Mutex::new(NexusState {
            db: Database::default(),
            listeners: Vec::new(),
            seed: config.seed,
            hasher: config.hasher,
            user_name_regex: config.user_name_regex.unwrap_or_else(|| DEFAULT_NAME_REGEX.clone()),
            group_name_regex: config.group_name_regex.unwrap_or_else(|| DEFAULT_NAME_REGEX.clone()),
        })))
    }

    /// Registers a listener. If a non-empty database already exists, the
    /// current snapshot is delivered immediately on the returned channel.
    /// The listener is considered dead (and pruned on next commit) once
    /// `token` is cancelled or the receiver is dropped.
    pub fn add_listener(&self, token: CancellationToken) -> ListenerHandle {
        let (sender, receiver) = tokio::sync::mpsc::channel(DEFAULT_LISTENER_CAPACITY);
        let mut state = self.0.lock();

        if !state.db.users.is_empty() || !state.db.groups.is_empty() {
            let _ = sender.try_send(state.db.clone());
        }

        state.listeners.push(ListenerEntry {
            sender,
            token: token.clone(),
        });

        ListenerHandle { receiver, token }
    }

    /// The only mutator: clone, run the action, normalize, validate, resolve
    /// seed conflicts, suppress no-op commits, commit, fan out to listeners.
    pub fn update<F>(&self, action: F, opts: UpdateOptions) -> ErrorSet
    where
        F: FnOnce(&mut Database) -> Result<(), NeedsInitialization>,
    {
        let mut state = self.0.lock();

        let mut staging = state.db.clone();
        if action(&mut staging).is_err() {
            staging = match &state.seed {
                Some(seed) => {
                    let mut seeded = Database::default();
                    seed.apply_to(&mut seeded, state.hasher.as_ref());
                    seeded
                }
                None => {
                    let (bootstrapped, password) = bootstrap::bootstrap_database(state.hasher.as_ref());
                    tracing::info!(%password, "generated initial admin password, record it now");
                    bootstrapped
                }
            };
        }

        staging.normalize();

        let grammars = NameGrammars {
            user_name: &state.user_name_regex,
            group_name: &state.group_name_regex,
        };
        let mut errors = ErrorSet::from_iter(staging.validate(&grammars));

        if let Some(seed) = state.seed.clone() {
            let conflicts = seed.check_conflicts(&staging, state.hasher.as_ref());
            if opts.conflict_with_seed_is_error {
                errors.extend(conflicts);
            } else if !conflicts.is_empty() {
                seed.apply_to(&mut staging, state.hasher.as_ref());
                staging.normalize();
            }
        }

        if !errors.is_empty() || opts.dry_run {
            return errors;
        }

        if staging == state.db {
            return ErrorSet::new();
        }

        state.db = staging.clone();
        state.listeners.retain(|entry| entry.notify(staging.clone()));

        ErrorSet::new()
    }

    /// Returns the current committed snapshot without going through
    /// `update` (used by the HTTP UI to render read-only views).
    pub fn snapshot(&self) -> Database {
        self.0.lock().db.clone()
    }
}
