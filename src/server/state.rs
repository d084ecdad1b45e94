//! Shared server state.

use crate::config::ExplorerConfig;
use crate::dataset::Dataset;
use crate::error::DataLoadError;
use crate::report::ExecutiveSummary;
use crate::session::{Session, SessionContext};
use std::sync::Arc;
use tokio::sync::Mutex;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Dataset loaded at startup; API handlers read it directly.
    pub dataset: Arc<Dataset>,
    /// Summary computed at startup.
    pub summary: Arc<ExecutiveSummary>,
    pub explorer: ExplorerConfig,
    /// The dashboard session; input events run one at a time.
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    /// Build the state around a session context whose dataset is already cached.
    pub fn new(context: SessionContext, summary: ExecutiveSummary) -> Result<Self, DataLoadError> {
        let dataset = context.dataset()?;
        let explorer = context.explorer().clone();

        Ok(Self {
            dataset,
            summary: Arc::new(summary),
            explorer,
            session: Arc::new(Mutex::new(Session::new(context))),
        })
    }
}
