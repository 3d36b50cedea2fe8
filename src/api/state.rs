use std::sync::Arc;
use std::time::Duration;

use crate::services::RecommendationService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationService>,
    /// Upper bound on a single request's handling time
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(recommendations: RecommendationService, request_timeout: Duration) -> Self {
        Self {
            recommendations: Arc::new(recommendations),
            request_timeout,
        }
    }
}
