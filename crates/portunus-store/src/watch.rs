//! A thin wrapper around `notify` that forwards filesystem events onto a
//! bounded tokio channel, matching the rest of the adapter's handoff style.

use std::path::Path;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::Sender;

/// Watches `path` for changes, sending `()` on `tx` whenever the underlying
/// notify backend reports an event. The returned watcher must be kept
/// alive for as long as events are wanted; dropping it stops delivery.
pub fn spawn(path: &Path, tx: Sender<()>) -> notify::Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if res.is_ok() {
            let _ = tx.try_send(());
        }
    })?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
