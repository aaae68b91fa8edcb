use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::{
    auth::{jwt::JwtService, session::SessionRegistry},
    catalog::Catalog,
    chat::ConsoleRegistry,
    config::AppConfig,
    storage::ObjectStorage,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<RwLock<Catalog>>,
    pub storage: Arc<dyn ObjectStorage>,
    pub jwt: JwtService,
    pub sessions: SessionRegistry,
    pub consoles: ConsoleRegistry,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        catalog: Catalog,
        storage: Arc<dyn ObjectStorage>,
        jwt: JwtService,
        consoles: ConsoleRegistry,
    ) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(RwLock::new(catalog)),
            storage,
            jwt,
            sessions: SessionRegistry::new(),
            consoles,
        }
    }

    /// Ends expired sessions and closes the chat consoles they owned.
    /// Returns how many sessions were reaped.
    pub async fn reap_expired_sessions(&self) -> usize {
        let expired = self.sessions.prune_expired().await;
        let mut closed = 0;
        for session_id in &expired {
            closed += self.consoles.close_owned_by(*session_id).await;
        }
        if !expired.is_empty() {
            info!(
                sessions = expired.len(),
                closed_consoles = closed,
                "reaped expired sessions"
            );
        }
        expired.len()
    }
}
