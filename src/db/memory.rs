//! In-process stores with the same contracts as the Postgres ones.
//!
//! Used for local runs without a database and by the integration tests.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    clock::Clock,
    db::{RecommendationStore, TrackCatalog, UserStore},
    error::AppResult,
    models::{ContextKey, Recommendation, Signal, Track, User},
};

/// Catalog over a fixed set of tracks, filtered with the feature rules
#[derive(Clone, Default)]
pub struct MemoryTrackCatalog {
    tracks: Arc<RwLock<Vec<Track>>>,
}

impl MemoryTrackCatalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks: Arc::new(RwLock::new(tracks)),
        }
    }

    pub async fn insert(&self, track: Track) {
        let mut tracks = self.tracks.write().await;
        tracks.retain(|t| t.id != track.id);
        tracks.push(track);
    }

    fn ranked<'a>(tracks: impl Iterator<Item = &'a Track>, limit: usize) -> Vec<Track> {
        let mut ranked: Vec<Track> = tracks.cloned().collect();
        ranked.sort_by(|a, b| b.popularity.cmp(&a.popularity).then_with(|| a.id.cmp(&b.id)));
        ranked.truncate(limit);
        ranked
    }
}

#[async_trait::async_trait]
impl TrackCatalog for MemoryTrackCatalog {
    async fn get_track_by_id(&self, id: &str) -> AppResult<Option<Track>> {
        let tracks = self.tracks.read().await;
        Ok(tracks.iter().find(|t| t.id == id).cloned())
    }

    async fn retrieve_by_signal(&self, signal: Signal, limit: usize) -> AppResult<Vec<Track>> {
        if !signal.has_dedicated_predicate() {
            return self.get_most_popular(limit).await;
        }

        let tracks = self.tracks.read().await;
        Ok(Self::ranked(
            tracks.iter().filter(|t| signal.matches(&t.audio_features)),
            limit,
        ))
    }

    async fn get_most_popular(&self, limit: usize) -> AppResult<Vec<Track>> {
        let tracks = self.tracks.read().await;
        Ok(Self::ranked(tracks.iter(), limit))
    }
}

/// Users keyed by ID
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }
}

type RecommendationKey = (String, ContextKey);
type Slot = Arc<Mutex<Option<Recommendation>>>;

/// Recommendation cache keyed by (user, context)
///
/// Each key owns a slot with its own mutex, so the check-then-write of
/// `upsert` is atomic per key and writers on different keys do not wait on
/// each other. The outer map lock is only held to find or create a slot.
#[derive(Clone)]
pub struct MemoryRecommendationStore {
    slots: Arc<RwLock<HashMap<RecommendationKey, Slot>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryRecommendationStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored entries, live or expired
    pub async fn len(&self) -> usize {
        self.snapshot().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn existing_slot(&self, key: &RecommendationKey) -> Option<Slot> {
        self.slots.read().await.get(key).cloned()
    }

    async fn slot(&self, key: RecommendationKey) -> Slot {
        if let Some(slot) = self.existing_slot(&key).await {
            return slot;
        }
        self.slots.write().await.entry(key).or_default().clone()
    }

    async fn all_slots(&self) -> Vec<Slot> {
        self.slots.read().await.values().cloned().collect()
    }

    /// Copies of every stored entry
    async fn snapshot(&self) -> Vec<Recommendation> {
        let mut entries = Vec::new();
        for slot in self.all_slots().await {
            if let Some(rec) = slot.lock().await.as_ref() {
                entries.push(rec.clone());
            }
        }
        entries
    }
}

#[async_trait::async_trait]
impl RecommendationStore for MemoryRecommendationStore {
    async fn find_live(
        &self,
        user_id: &str,
        context: &ContextKey,
    ) -> AppResult<Option<Recommendation>> {
        let now = self.clock.now();
        let Some(slot) = self.existing_slot(&(user_id.to_string(), *context)).await else {
            return Ok(None);
        };
        let entry = slot.lock().await;
        Ok(entry.as_ref().filter(|rec| rec.is_live_at(now)).cloned())
    }

    async fn upsert(&self, recommendation: Recommendation) -> AppResult<Recommendation> {
        let slot = self
            .slot((recommendation.user_id.clone(), recommendation.context))
            .await;
        let mut entry = slot.lock().await;

        if let Some(existing) = entry
            .as_mut()
            .filter(|existing| existing.is_live_at(recommendation.created_at))
        {
            existing.track_ids = recommendation.track_ids;
            existing.created_at = recommendation.created_at;
            existing.expires_at = recommendation.expires_at;
            return Ok(existing.clone());
        }

        *entry = Some(recommendation.clone());
        Ok(recommendation)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Recommendation>> {
        Ok(self.snapshot().await.into_iter().find(|rec| rec.id == id))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        for slot in self.all_slots().await {
            let mut entry = slot.lock().await;
            if entry.as_ref().is_some_and(|rec| rec.id == id) {
                *entry = None;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn list_live_for_user(&self, user_id: &str) -> AppResult<Vec<Recommendation>> {
        let now = self.clock.now();
        let mut live: Vec<Recommendation> = self
            .snapshot()
            .await
            .into_iter()
            .filter(|rec| rec.user_id == user_id && rec.is_live_at(now))
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(live)
    }

    async fn delete_expired(&self) -> AppResult<u64> {
        let now = self.clock.now();
        let mut slots = self.slots.write().await;
        let mut removed = 0;

        // A slot cloned by an in-flight call stays in the map so its write is not lost.
        slots.retain(|_, slot| {
            let in_use = Arc::strong_count(slot) > 1;
            let Ok(mut entry) = slot.try_lock() else {
                return true;
            };
            if entry.as_ref().is_some_and(|rec| !rec.is_live_at(now)) {
                *entry = None;
                removed += 1;
            }
            entry.is_some() || in_use
        });

        Ok(removed)
    }
}
