//! Service container for dependency injection
//!
//! Wires the loaded session store and settings into the ledger service.

use std::path::Path;
use std::sync::Arc;

use crate::application::services::LedgerService;
use crate::config::Settings;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::session_file::load_session;
use crate::infrastructure::store::SessionStore;

/// Container holding the session records and application settings.
#[derive(Debug)]
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Records of the loaded session
    pub store: SessionStore,
}

impl ServiceContainer {
    /// Create a container around an already populated store.
    pub fn new(settings: Settings, store: SessionStore) -> Self {
        Self {
            settings: Arc::new(settings),
            store,
        }
    }

    /// Load the session file and wire it up.
    pub fn load(settings: Settings, session_path: &Path) -> InfraResult<Self> {
        let store = load_session(session_path)?;
        Ok(Self::new(settings, store))
    }

    /// Ledger over the current store, using the configured tolerance.
    pub fn ledger(&self) -> LedgerService<'_, SessionStore> {
        LedgerService::new(&self.store, self.settings.tolerance)
    }
}
