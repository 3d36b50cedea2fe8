use sqlx::{FromRow, PgPool};

use crate::{
    db::UserStore,
    error::AppResult,
    models::{User, UserPreferences},
};

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    preferences: serde_json::Value,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        // Unreadable preferences fall back to defaults
        let preferences = serde_json::from_value::<UserPreferences>(row.preferences)
            .unwrap_or_else(|e| {
                tracing::error!(
                    user_id = %row.id,
                    error = %e,
                    "Failed to decode user preferences, using defaults"
                );
                UserPreferences::default()
            });

        User {
            id: row.id,
            name: row.name,
            preferences,
        }
    }
}

/// User lookups backed by the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn get_user_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, preferences FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }
}
