use std::sync::Arc;

use snippetbox::{
    AppConfig, BindingError, SessionManager, SessionStore, SnippetStore, UserDirectory,
    validate_form_bindings,
};

/// Everything the pipeline stages and handlers need, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub users: Arc<dyn UserDirectory>,
    pub snippets: Arc<dyn SnippetStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wires the collaborators together.
    ///
    /// Fails if any form mapping table is malformed, so a broken build never serves
    /// requests.
    pub fn new(
        config: AppConfig,
        session_store: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        snippets: Arc<dyn SnippetStore>,
    ) -> Result<Self, BindingError> {
        validate_form_bindings()?;

        Ok(Self {
            sessions: Arc::new(SessionManager::new(session_store, config.session.clone())),
            users,
            snippets,
            config: Arc::new(config),
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
