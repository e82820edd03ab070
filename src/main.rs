use anyhow::Context;
use pet_care::api::{self, AppState};
use pet_care::auth::TokenSigner;
use pet_care::config::Config;
use pet_care::pet_state::ThreadRngSource;
use pet_care::storage::Store;
use pet_care::telemetry;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    telemetry::init(&config);
    config.validate().context("invalid configuration")?;

    if config.uses_default_secret() {
        warn!("PETCARE_JWT_SECRET is not set, signing tokens with the default secret");
    }

    let store = Store::open(&config.db_path)
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;

    let signer = TokenSigner::new(&config.jwt_secret, config.token_ttl_secs()?);
    let state = AppState::new(store.clone(), signer, Arc::new(ThreadRngSource));

    if let Some((email, password)) = config.admin_seed() {
        state
            .auth
            .ensure_admin(email, password)
            .context("failed to seed admin account")?;
    }

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "pet care service listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.flush()?;
    info!("pet care service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
