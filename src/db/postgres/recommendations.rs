use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    clock::Clock,
    db::RecommendationStore,
    error::{AppError, AppResult},
    models::{ContextKey, Recommendation},
};

const RECOMMENDATION_COLUMNS: &str =
    "id, user_id, mood, weather, time_of_day, track_ids, created_at, expires_at";

#[derive(Debug, FromRow)]
struct RecommendationRow {
    id: Uuid,
    user_id: String,
    mood: String,
    weather: String,
    time_of_day: String,
    track_ids: Vec<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<RecommendationRow> for Recommendation {
    type Error = AppError;

    fn try_from(row: RecommendationRow) -> Result<Self, Self::Error> {
        let corrupt = |e: AppError| {
            AppError::Internal(format!("Stored recommendation {} is corrupt: {}", row.id, e))
        };

        let context = ContextKey::new(
            row.mood.parse().map_err(corrupt)?,
            row.weather.parse().map_err(corrupt)?,
            row.time_of_day.parse().map_err(corrupt)?,
        );

        Ok(Recommendation {
            id: row.id,
            user_id: row.user_id,
            context,
            track_ids: row.track_ids,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

/// Recommendation cache backed by the `recommendations` table
///
/// The table carries a unique constraint on (user_id, mood, weather,
/// time_of_day), so upserts resolve concurrent writers in a single statement.
#[derive(Clone)]
pub struct PgRecommendationStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgRecommendationStore {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait::async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn find_live(
        &self,
        user_id: &str,
        context: &ContextKey,
    ) -> AppResult<Option<Recommendation>> {
        let row = sqlx::query_as::<_, RecommendationRow>(&format!(
            "SELECT {} FROM recommendations \
             WHERE user_id = $1 AND mood = $2 AND weather = $3 AND time_of_day = $4 \
             AND expires_at > $5",
            RECOMMENDATION_COLUMNS
        ))
        .bind(user_id)
        .bind(context.mood.as_str())
        .bind(context.weather.as_str())
        .bind(context.time_of_day.as_str())
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Recommendation::try_from).transpose()
    }

    async fn upsert(&self, recommendation: Recommendation) -> AppResult<Recommendation> {
        // A live row keeps its identity; an expired one is taken over by the new ID.
        let sql = format!(
            r#"
            INSERT INTO recommendations
                (id, user_id, mood, weather, time_of_day, track_ids, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT ON CONSTRAINT recommendations_context_key DO UPDATE SET
                id = CASE WHEN recommendations.expires_at > EXCLUDED.created_at
                          THEN recommendations.id ELSE EXCLUDED.id END,
                track_ids = EXCLUDED.track_ids,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            RETURNING {}
            "#,
            RECOMMENDATION_COLUMNS
        );

        let row = sqlx::query_as::<_, RecommendationRow>(&sql)
            .bind(recommendation.id)
            .bind(&recommendation.user_id)
            .bind(recommendation.context.mood.as_str())
            .bind(recommendation.context.weather.as_str())
            .bind(recommendation.context.time_of_day.as_str())
            .bind(&recommendation.track_ids)
            .bind(recommendation.created_at)
            .bind(recommendation.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::from_upsert(
                    e,
                    format!("{}/{}", recommendation.user_id, recommendation.context),
                )
            })?;

        let stored = Recommendation::try_from(row)?;

        tracing::debug!(
            recommendation_id = %stored.id,
            user_id = %stored.user_id,
            context = %stored.context,
            replaced = stored.id != recommendation.id,
            "Recommendation upserted"
        );

        Ok(stored)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Recommendation>> {
        let row = sqlx::query_as::<_, RecommendationRow>(&format!(
            "SELECT {} FROM recommendations WHERE id = $1",
            RECOMMENDATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Recommendation::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM recommendations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_live_for_user(&self, user_id: &str) -> AppResult<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, RecommendationRow>(&format!(
            "SELECT {} FROM recommendations \
             WHERE user_id = $1 AND expires_at > $2 \
             ORDER BY created_at DESC",
            RECOMMENDATION_COLUMNS
        ))
        .bind(user_id)
        .bind(self.clock.now())
        .fetch_all(&self.pool)
        .await?;

        let mut recommendations = Vec::with_capacity(rows.len());
        for row in rows {
            match Recommendation::try_from(row) {
                Ok(rec) => recommendations.push(rec),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable recommendation"),
            }
        }

        Ok(recommendations)
    }

    async fn delete_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM recommendations WHERE expires_at <= $1")
            .bind(self.clock.now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
