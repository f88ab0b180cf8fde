use std::path::PathBuf;

use portunus_orchestrator::{privilege, supervisor, LaunchPlan};

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let state_dir = PathBuf::from(env_or("PORTUNUS_SERVER_STATE_DIR", "/var/lib/portunus"));
    if let Err(e) = supervisor::prepare_state_dir(&state_dir) {
        eprintln!("FATAL: failed to prepare state directory: {}", e);
        std::process::exit(1);
    }

    // The privileged LDAP listen socket is bound here, before dropping
    // privilege, then handed off to the unprivileged server via file
    // descriptor passing. That hand-off plumbing is orchestrator-internal
    // and not reproduced in this contract-level implementation.

    let server_user = env_or("PORTUNUS_SERVER_USER", "portunus");
    let server_group = env_or("PORTUNUS_SERVER_GROUP", "portunus");
    if let Err(e) = privilege::drop_to(&server_user, &server_group) {
        eprintln!("FATAL: failed to drop privileges: {}", e);
        std::process::exit(1);
    }

    let plan = LaunchPlan {
        slapd_binary: PathBuf::from(env_or("PORTUNUS_SLAPD_BINARY", "/usr/sbin/slapd")),
        slapd_config_path: state_dir.join("slapd.conf"),
        server_binary: PathBuf::from(env_or("PORTUNUS_SERVER_BINARY", "/usr/bin/portunus-server")),
        state_dir: state_dir.clone(),
    };

    if let Err(e) = supervisor::run(plan).await {
        tracing::error!(error = %e, "supervisor exited with an error");
        std::process::exit(1);
    }
}
