//! Shared application state handed to every handler via axum's
//! `State` extractor, following `ferrex-server::infra::app_state::AppState`.

use std::sync::Arc;

use pseudovision_core::PostgresDatabase;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<PostgresDatabase>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PostgresDatabase, config: Config) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
        }
    }
}
