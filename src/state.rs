use crate::agents::{Analyzer, CompletionModel};
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::pipeline::SubmissionPipeline;
use crate::storage::ReviewStore;
use std::sync::Arc;

pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<ReviewStore>,
    pub pipeline: SubmissionPipeline,
    pub dashboard: Dashboard,
}

impl AppState {
    pub fn new(config: Config, model: Arc<dyn CompletionModel>) -> Self {
        let store = Arc::new(ReviewStore::new(config.data_file.clone()));
        let pipeline = SubmissionPipeline::new(Analyzer::new(model), store.clone());
        let dashboard = Dashboard::new(store.clone(), config.cache_ttl);

        Self {
            config: Arc::new(config),
            store,
            pipeline,
            dashboard,
        }
    }
}
