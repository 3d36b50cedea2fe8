//! Storage contracts the recommendation engine depends on, with Postgres,
//! in-memory and Redis implementations.
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{ContextKey, Recommendation, Signal, Track, User},
};

pub mod memory;
pub mod postgres;
pub mod redis;

pub use postgres::{create_pool, PgRecommendationStore, PgTrackCatalog, PgUserStore};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;

/// Read access to the track catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Looks up a single track; `None` when the ID is unknown
    async fn get_track_by_id(&self, id: &str) -> AppResult<Option<Track>>;

    /// Up to `limit` tracks matching the signal, most popular first.
    ///
    /// Signals without a dedicated rule return the most popular tracks. An
    /// empty catalog yields an empty list rather than an error.
    async fn retrieve_by_signal(&self, signal: Signal, limit: usize) -> AppResult<Vec<Track>>;

    /// Up to `limit` tracks by popularity, ties by ID
    async fn get_most_popular(&self, limit: usize) -> AppResult<Vec<Track>>;
}

/// Read access to users and their preferences
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user_by_id(&self, id: &str) -> AppResult<Option<User>>;
}

/// Time-bounded store of computed recommendations, one live entry per
/// (user, context)
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Returns the entry for this user and context if it has not expired.
    /// Expired entries are reported as absent but left in place.
    async fn find_live(
        &self,
        user_id: &str,
        context: &ContextKey,
    ) -> AppResult<Option<Recommendation>>;

    /// Saves a recommendation, replacing the live entry for the same user and
    /// context in place if one exists.
    ///
    /// Returns the stored row, whose ID is the existing entry's ID when one was
    /// replaced. The check and the write are atomic per context key.
    async fn upsert(&self, recommendation: Recommendation) -> AppResult<Recommendation>;

    /// Looks an entry up by ID, expired or not
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Recommendation>>;

    /// Removes one entry; `false` when no entry had this ID
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Live entries for a user, newest first
    async fn list_live_for_user(&self, user_id: &str) -> AppResult<Vec<Recommendation>>;

    /// Removes every expired entry and returns how many were removed
    async fn delete_expired(&self) -> AppResult<u64>;
}
