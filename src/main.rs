use std::sync::Arc;

mod app;
mod auth;
mod config;
mod error;
mod state;
mod store;

use crate::config::{AppConfig, PasswordScheme};
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "login_portal=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    if config.password_scheme == PasswordScheme::Plaintext {
        tracing::warn!("PASSWORD_SCHEME=plaintext: passwords are stored and compared unhashed");
    }

    let store = PgStore::connect(&config.db).await?;

    // Run migrations if present
    if let Err(e) = sqlx::migrate!("./migrations").run(store.pool()).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let (host, port) = (config.host.clone(), config.port);
    let state = AppState::from_parts(Arc::new(store.clone()), Arc::new(config));

    if state.config.seed_demo_users {
        auth::services::seed_demo_users(&state).await?;
    }

    let served = app::serve(app::build_app(state), &host, port).await;
    store.close().await;
    served
}
