use std::sync::Arc;

use crate::config::Config;
use crate::export::ExportOptions;
use crate::session::SessionRegistry;
use crate::storage::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable record store. `PgResumeStore` with a database, `MemoryResumeStore` without.
    pub store: Arc<dyn ResumeStore>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Config,
    pub export: ExportOptions,
}
