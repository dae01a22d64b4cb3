use std::sync::Arc;

use crate::config::Config;
use crate::resumes::ResumeStore;
use crate::storage::JobseekerStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Backing store chosen once at startup. See `storage::select_store`.
    pub store: Arc<dyn JobseekerStore>,
    pub resumes: ResumeStore,
    pub config: Config,
}
