use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ContextKey;

/// A computed track list cached for one user and context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: String,
    #[serde(flatten)]
    pub context: ContextKey,
    /// Track IDs in rank order
    pub track_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Recommendation {
    /// Creates a recommendation that stays live for `ttl` from `now`
    pub fn new(
        user_id: impl Into<String>,
        context: ContextKey,
        track_ids: Vec<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            context,
            track_ids,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Live means the expiry is strictly after `now`
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Whether this entry is stored under the given user and context
    pub fn is_for(&self, user_id: &str, context: &ContextKey) -> bool {
        self.user_id == user_id && self.context == *context
    }
}
