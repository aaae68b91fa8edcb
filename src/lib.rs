pub mod auth;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod storage;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::auth::jwt::JwtService;
use crate::catalog::Catalog;
use crate::chat::{ConsoleRegistry, RandomPicker};
use crate::config::AppConfig;
use crate::state::AppState;
use crate::storage::LocalDiskStorage;

/// Assembles the production state: local disk uploads, random chat replies,
/// and the catalog seeded according to `config`.
pub fn build_state(config: AppConfig) -> Result<AppState> {
    let mut catalog = Catalog::new(Uuid::new_v4());
    if config.seed_fixtures {
        seed::seed_fixtures(&mut catalog).context("failed to load fixtures")?;
    }
    if let Some(hash) = config.bootstrap_admin_password_hash.as_deref() {
        let admin_id =
            seed::install_bootstrap_admin(&mut catalog, &config.bootstrap_admin_email, hash)
                .context("failed to install bootstrap administrator")?;
        tracing::info!(
            user_id = %admin_id,
            email = %config.bootstrap_admin_email,
            "bootstrap administrator ready"
        );
    }

    let storage = Arc::new(LocalDiskStorage::new(config.upload_dir.clone()));
    let jwt = JwtService::from_config(&config)?;
    let picker = Arc::new(RandomPicker::new(config.chat_delay_min, config.chat_delay_max));
    let consoles = ConsoleRegistry::new(picker);

    Ok(AppState::new(config, catalog, storage, jwt, consoles))
}

/// Periodically ends expired sessions so the consoles they opened are
/// released even when the client never logs out.
pub fn spawn_session_reaper(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            state.reap_expired_sessions().await;
        }
    })
}
