//! Process supervision: spawns `slapd` and the unprivileged
//! `portunus-server`, forwards termination signals, and exits non-zero if
//! either child dies unexpectedly.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};
use tokio::signal::unix::{SignalKind, signal};

use portunus_common::error::PortunusError;

/// Paths and arguments needed to launch the two supervised children.
/// `slapd_config_path` is pre-rendered by the caller; this module does not
/// template the `slapd` configuration itself.
pub struct LaunchPlan {
    pub slapd_binary: PathBuf,
    pub slapd_config_path: PathBuf,
    pub server_binary: PathBuf,
    pub state_dir: PathBuf,
}

/// Creates the runtime state directory (and its parents) if missing.
pub fn prepare_state_dir(state_dir: &Path) -> Result<(), PortunusError> {
    std::fs::create_dir_all(state_dir).map_err(PortunusError::Io)
}

fn spawn(mut command: Command) -> Result<Child, PortunusError> {
    command
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(PortunusError::Io)
}

/// Spawns both children and waits until either exits or a termination
/// signal arrives, then kills the survivor. Returns once both are down.
pub async fn run(plan: LaunchPlan) -> Result<(), PortunusError> {
    let mut slapd = spawn({
        let mut cmd = Command::new(&plan.slapd_binary);
        cmd.arg("-f").arg(&plan.slapd_config_path).arg("-h").arg("ldap:// ldapi://");
        cmd
    })?;

    let mut server = spawn({
        let mut cmd = Command::new(&plan.server_binary);
        cmd.env("PORTUNUS_SERVER_STATE_DIR", &plan.state_dir);
        cmd
    })?;

    let mut sigterm = signal(SignalKind::terminate()).map_err(PortunusError::Io)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(PortunusError::Io)?;

    tokio::select! {
        status = slapd.wait() => {
            tracing::warn!(?status, "slapd exited, shutting down server");
            let _ = server.kill().await;
        }
        status = server.wait() => {
            tracing::warn!(?status, "server exited, shutting down slapd");
            let _ = slapd.kill().await;
        }
        _ = sigterm.recv() => {
            tracing::info!("received SIGTERM, shutting down children");
            let _ = server.kill().await;
            let _ = slapd.kill().await;
        }
        _ = sigint.recv() => {
            tracing::info!("received SIGINT, shutting down children");
            let _ = server.kill().await;
            let _ = slapd.kill().await;
        }
    }

    let _ = server.wait().await;
    let _ = slapd.wait().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_state_dir_creates_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        prepare_state_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
