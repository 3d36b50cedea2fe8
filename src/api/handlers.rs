use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{ContextKey, Recommendation, Track},
    services::ContextRequest,
};

use super::AppState;

/// Recommendation with its tracks loaded from the catalog
#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub id: Uuid,
    pub user_id: String,
    #[serde(flatten)]
    pub context: ContextKey,
    pub tracks: Vec<Track>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RecommendationResponse {
    fn new(recommendation: Recommendation, tracks: Vec<Track>) -> Self {
        Self {
            id: recommendation.id,
            user_id: recommendation.user_id,
            context: recommendation.context,
            tracks,
            created_at: recommendation.created_at,
            expires_at: recommendation.expires_at,
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Recommends tracks for the user's current context
pub async fn create_recommendation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ContextRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        mood = ?request.mood,
        "Recommendation requested"
    );

    let recommendation = state.recommendations.recommend(&user_id, &request).await?;
    let tracks = state.recommendations.resolve_tracks(&recommendation).await?;

    Ok(Json(RecommendationResponse::new(recommendation, tracks)))
}

/// Lists the user's live recommendations
pub async fn list_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let recommendations = state.recommendations.list_for_user(&user_id).await?;
    Ok(Json(recommendations))
}

/// Fetches one stored recommendation with its tracks, even after expiry
pub async fn get_recommendation(
    State(state): State<AppState>,
    Path((user_id, recommendation_id)): Path<(String, Uuid)>,
) -> AppResult<Json<RecommendationResponse>> {
    let recommendation = state
        .recommendations
        .get_for_user(&user_id, recommendation_id)
        .await?;
    let tracks = state.recommendations.resolve_tracks(&recommendation).await?;

    Ok(Json(RecommendationResponse::new(recommendation, tracks)))
}

pub async fn delete_recommendation(
    State(state): State<AppState>,
    Path((user_id, recommendation_id)): Path<(String, Uuid)>,
) -> AppResult<StatusCode> {
    state
        .recommendations
        .delete_for_user(&user_id, recommendation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
