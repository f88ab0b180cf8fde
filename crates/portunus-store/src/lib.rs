//! Disk-store adapter: translates between the authoritative
//! `Database` and a single JSON file, tolerating concurrent external edits
//! via filesystem notification.

mod watch;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use portunus_common::error::PortunusError;
use portunus_model::{Database, StoredDatabase, SCHEMA_VERSION};
use portunus_nexus::{NeedsInitialization, Nexus, UpdateOptions};

/// How long to wait after a watcher event before rereading the file, to let
/// a concurrent writer finish.
const WATCHER_SETTLE_DELAY: Duration = Duration::from_millis(25);

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("store file not found")]
    NotFound,
    #[error("store file has unsupported schema_version {0}")]
    UnsupportedSchemaVersion(u32),
    #[error("store file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("i/o error reading store file: {0}")]
    Io(#[source] io::Error),
}

pub struct DiskStore {
    path: PathBuf,
}

impl DiskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DiskStore { path: path.into() }
    }

    /// Reads and parses the store file. A missing file is reported
    /// distinctly so the caller can submit `NeedsInitialization`.
    pub fn load(&self) -> Result<Database, LoadError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LoadError::NotFound),
            Err(e) => return Err(LoadError::Io(e)),
        };
        let stored: StoredDatabase = serde_json::from_slice(&bytes)?;
        if stored.schema_version != SCHEMA_VERSION {
            return Err(LoadError::UnsupportedSchemaVersion(stored.schema_version));
        }
        Ok(stored.into())
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    /// Serializes `db` as pretty-printed JSON plus a trailing newline.
    pub fn render_bytes(db: &Database) -> serde_json::Result<Vec<u8>> {
        let stored = db.clone().into_stored();
        let mut bytes = serde_json::to_vec_pretty(&stored)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Write-tempfile-then-rename within the same directory, so the rename
    /// is atomic. Temp name is `.<base>.<pid>`.
    fn write_atomic_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let base = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "database.json".to_string());
        let temp_path = dir.join(format!(".{}.{}", base, std::process::id()));

        std::fs::write(&temp_path, bytes)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Runs the adapter until `token` is cancelled: initial load, bootstrap
    /// write-back, then the watcher loop.
    pub async fn run(&self, nexus: Nexus, token: CancellationToken) -> Result<(), PortunusError> {
        let initial = self.load();
        let needs_bootstrap_writeback = matches!(initial, Err(LoadError::NotFound));
        if let Err(e) = &initial {
            if !matches!(e, LoadError::NotFound) {
                return Err(PortunusError::protocol(e.to_string()));
            }
        }

        let errors = nexus.update(
            move |db| match initial {
                Ok(loaded) => {
                    *db = loaded;
                    Ok(())
                }
                Err(_) => Err(NeedsInitialization),
            },
            UpdateOptions::default(),
        );
        if !errors.is_empty() {
            return Err(PortunusError::protocol(errors.to_string()));
        }

        let handle = nexus.add_listener(token.clone());
        let mut receiver = handle.receiver;

        let mut last_written_bytes = self.read_bytes().ok();

        if needs_bootstrap_writeback {
            if let Some(snapshot) = receiver.recv().await {
                let bytes = Self::render_bytes(&snapshot).map_err(|e| PortunusError::protocol(e.to_string()))?;
                self.write_atomic_bytes(&bytes)
                    .map_err(PortunusError::Io)?;
                last_written_bytes = Some(bytes);
            }
        }

        let (watch_tx, mut watch_rx) = tokio::sync::mpsc::channel(4);
        let mut watcher = watch::spawn(&self.path, watch_tx.clone())
            .map_err(|e| PortunusError::protocol(e.to_string()))?;

        loop {
            tokio::select! {
                _ = token.cancelled() => return Ok(()),

                event = watch_rx.recv() => {
                    if event.is_none() {
                        return Ok(());
                    }
                    tokio::time::sleep(WATCHER_SETTLE_DELAY).await;
                    let raw = self.read_bytes().ok();
                    let reread = self.load();
                    if let Err(e) = &reread {
                        if !matches!(e, LoadError::NotFound) {
                            tracing::warn!(error = %e, "failed to reread store file after watcher event");
                        }
                    }
                    let reread_ok = reread.is_ok();
                    let errors = nexus.update(
                        move |db| match reread {
                            Ok(loaded) => { *db = loaded; Ok(()) }
                            Err(_) => Err(NeedsInitialization),
                        },
                        UpdateOptions::default(),
                    );
                    if !errors.is_empty() {
                        tracing::warn!(%errors, "store file reread produced validation errors");
                    }
                    if reread_ok && errors.is_empty() {
                        // The file already reflects this content: record it so
                        // the subsequent listener-triggered snapshot doesn't
                        // write the same bytes back.
                        last_written_bytes = raw;
                    }
                    // Re-arm: the original inode may be gone after an atomic rename.
                    watcher = watch::spawn(&self.path, watch_tx.clone())
                        .map_err(|e| PortunusError::protocol(e.to_string()))?;
                }

                snapshot = receiver.recv() => {
                    let Some(snapshot) = snapshot else { return Ok(()) };
                    drop(watcher);
                    let bytes = Self::render_bytes(&snapshot).map_err(|e| PortunusError::protocol(e.to_string()))?;
                    if last_written_bytes.as_deref() != Some(bytes.as_slice()) {
                        self.write_atomic_bytes(&bytes).map_err(PortunusError::Io)?;
                        last_written_bytes = Some(bytes);
                    }
                    watcher = watch::spawn(&self.path, watch_tx.clone())
                        .map_err(|e| PortunusError::protocol(e.to_string()))?;
                }
            }
        }
    }
}
