use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // Outermost first: the request ID must exist before the trace span is made
    let layers = ServiceBuilder::new()
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(state.request_timeout));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(layers)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:user_id/recommendations",
            get(handlers::list_recommendations).post(handlers::create_recommendation),
        )
        .route(
            "/users/:user_id/recommendations/:recommendation_id",
            get(handlers::get_recommendation).delete(handlers::delete_recommendation),
        )
}
