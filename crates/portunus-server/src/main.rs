use tokio_util::sync::CancellationToken;

use portunus_server::config::Config;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };

    portunus_server::init_logging(config.debug);

    let token = CancellationToken::new();
    if let Err(e) = portunus_server::run(config, token.clone()).await {
        tracing::error!(error = %e, "failed to start");
        std::process::exit(1);
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
    }
    tracing::info!("shutting down");
    token.cancel();
}
