//! Shared application state.

use crate::config::Config;
use crate::engine::RelayEngine;

/// Shared application state passed to all handlers.
pub struct AppState {
    pub config: Config,
    pub engine: RelayEngine,
}

impl AppState {
    pub fn new(config: Config, engine: RelayEngine) -> Self {
        Self { config, engine }
    }

    pub fn has_credential(&self) -> bool {
        self.engine.has_credential()
    }
}
