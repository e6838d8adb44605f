use std::sync::Arc;

use crate::analysis::pipeline::StageOptions;
use crate::config::Config;
use crate::llm_client::BackendFactory;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Builds one LLM backend per stage call. Default: `EnvBackendFactory`.
    pub backends: Arc<dyn BackendFactory>,
}

impl AppState {
    pub fn stage_options(&self) -> StageOptions {
        StageOptions {
            timeout: self.config.llm.timeout,
        }
    }
}
