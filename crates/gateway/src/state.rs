use std::sync::Arc;

use pl_domain::config::Config;
use pl_scheduler::Translator;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub translator: Translator,
}
