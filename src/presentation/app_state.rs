// Application state for HTTP handlers
use crate::application::engine::TelemetryEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TelemetryEngine>,
}
