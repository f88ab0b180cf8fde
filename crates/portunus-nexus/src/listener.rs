//! Listener fan-out: each registered listener gets its own
//! bounded channel and is notified synchronously, inside the update lock,
//! on every committed change. Modeled on the subscriber-registry shape of
//! `batata-core`'s `ConfigSubscriberManager` — register/unregister by
//! token, broadcast by iterating the live set.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use portunus_model::Database;

/// The receiving half handed back to a caller of `Nexus::add_listener`. The
/// matching entry in the registry is pruned the next time a commit tries to
/// notify it and finds the channel closed or the token cancelled.
pub struct ListenerHandle {
    pub receiver: mpsc::Receiver<Database>,
    pub token: CancellationToken,
}

pub(crate) struct ListenerEntry {
    pub sender: mpsc::Sender<Database>,
    pub token: CancellationToken,
}

impl ListenerEntry {
    /// Attempts to hand off a snapshot. Returns `false` if this entry is
    /// dead and should be pruned from the registry.
    pub fn notify(&self, snapshot: Database) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        match self.sender.try_send(snapshot) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Backpressure: the listener is falling behind. Per spec
                // §5, listeners may coalesce under backpressure, so we drop
                // this snapshot rather than block the whole nexus.
                tracing::warn!("listener channel full, dropping snapshot");
                true
            }
        }
    }
}

/// Default channel capacity for a new listener.
pub const DEFAULT_LISTENER_CAPACITY: usize = 4;
