use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::{
    clock::Clock,
    config::Config,
    db::{RecommendationStore, TrackCatalog, UserStore},
    error::{AppError, AppResult},
    models::{ContextKey, Recommendation, Signal, Track},
    services::{
        context::{ContextRequest, ContextResolver},
        fusion::{fuse, CandidateList},
        sampling::{filter_by_tempo, Sampler},
    },
};

/// Size and lifetime knobs of the recommendation flow
#[derive(Debug, Clone, Copy)]
pub struct RecommendationSettings {
    /// Fused list length; each signal retrieves twice as many
    pub retrieval_limit: usize,
    /// Tracks kept in a stored recommendation
    pub output_count: usize,
    pub ttl: Duration,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            retrieval_limit: 50,
            output_count: 20,
            ttl: Duration::hours(24),
        }
    }
}

impl TryFrom<&Config> for RecommendationSettings {
    type Error = anyhow::Error;

    fn try_from(config: &Config) -> Result<Self, Self::Error> {
        Ok(Self {
            retrieval_limit: config.retrieval_limit,
            output_count: config.output_count,
            ttl: config.recommendation_ttl()?,
        })
    }
}

/// Builds and caches context-aware track lists.
///
/// A request is answered from the recommendation cache when a live entry
/// exists for the user and context. Otherwise the three context signals are
/// retrieved, fused, narrowed to the user's tempo band, sampled and stored.
#[derive(Clone)]
pub struct RecommendationService {
    catalog: Arc<dyn TrackCatalog>,
    users: Arc<dyn UserStore>,
    store: Arc<dyn RecommendationStore>,
    sampler: Arc<dyn Sampler>,
    resolver: ContextResolver,
    clock: Arc<dyn Clock>,
    settings: RecommendationSettings,
}

impl RecommendationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<dyn TrackCatalog>,
        users: Arc<dyn UserStore>,
        store: Arc<dyn RecommendationStore>,
        sampler: Arc<dyn Sampler>,
        resolver: ContextResolver,
        clock: Arc<dyn Clock>,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            catalog,
            users,
            store,
            sampler,
            resolver,
            clock,
            settings,
        }
    }

    /// Resolves a raw request context and returns the recommendation for it
    pub async fn recommend(
        &self,
        user_id: &str,
        request: &ContextRequest,
    ) -> AppResult<Recommendation> {
        let context = self.resolver.resolve(request).await?;
        self.get_recommendation(user_id, context).await
    }

    /// Returns the live recommendation for this user and context, computing
    /// and storing a new one on a miss.
    pub async fn get_recommendation(
        &self,
        user_id: &str,
        context: ContextKey,
    ) -> AppResult<Recommendation> {
        if let Some(cached) = self.store.find_live(user_id, &context).await? {
            tracing::info!(
                user_id = %user_id,
                context = %context,
                recommendation_id = %cached.id,
                "Serving cached recommendation"
            );
            return Ok(cached);
        }

        let user = self
            .users
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        let lists = self.retrieve(&context).await?;
        if lists.iter().all(|list| list.tracks.is_empty()) {
            tracing::warn!(user_id = %user_id, context = %context, "No candidate tracks for context");
            return Err(AppError::NoRecommendationsAvailable);
        }

        let fused: Vec<Track> = fuse(&lists, self.settings.retrieval_limit)
            .into_iter()
            .map(|scored| scored.track)
            .collect();
        let filtered = filter_by_tempo(fused, &user.preferences);
        let sampled = self.sampler.sample(filtered, self.settings.output_count);

        let recommendation = Recommendation::new(
            user_id,
            context,
            sampled.into_iter().map(|track| track.id).collect(),
            self.clock.now(),
            self.settings.ttl,
        );

        tracing::info!(
            user_id = %user_id,
            context = %context,
            tracks = recommendation.track_ids.len(),
            "Computed new recommendation"
        );

        Ok(self.persist(recommendation).await)
    }

    /// Live recommendations for a user, newest first
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Recommendation>> {
        self.store.list_live_for_user(user_id).await
    }

    /// A stored recommendation of this user, expired or not
    pub async fn get_for_user(&self, user_id: &str, id: Uuid) -> AppResult<Recommendation> {
        self.store
            .get_by_id(id)
            .await?
            .filter(|rec| rec.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Recommendation {} not found", id)))
    }

    /// Deletes a stored recommendation of this user
    pub async fn delete_for_user(&self, user_id: &str, id: Uuid) -> AppResult<()> {
        self.get_for_user(user_id, id).await?;

        if !self.store.delete(id).await? {
            return Err(AppError::NotFound(format!("Recommendation {} not found", id)));
        }

        tracing::info!(user_id = %user_id, recommendation_id = %id, "Recommendation deleted");
        Ok(())
    }

    /// Loads the tracks of a recommendation in rank order, skipping IDs that
    /// are no longer in the catalog
    pub async fn resolve_tracks(&self, recommendation: &Recommendation) -> AppResult<Vec<Track>> {
        let mut tracks = Vec::with_capacity(recommendation.track_ids.len());
        for id in &recommendation.track_ids {
            match self.catalog.get_track_by_id(id).await? {
                Some(track) => tracks.push(track),
                None => tracing::warn!(
                    track_id = %id,
                    recommendation_id = %recommendation.id,
                    "Recommended track missing from catalog"
                ),
            }
        }
        Ok(tracks)
    }

    async fn retrieve(&self, context: &ContextKey) -> AppResult<Vec<CandidateList>> {
        let limit = self.settings.retrieval_limit * 2;
        let [mood, weather, time_of_day] = Signal::for_context(context);

        for signal in [mood, weather, time_of_day] {
            if !signal.has_dedicated_predicate() {
                tracing::debug!(signal = %signal, "Signal has no retrieval rule, using popularity");
            }
        }

        let (mood_tracks, weather_tracks, time_tracks) = tokio::try_join!(
            self.catalog.retrieve_by_signal(mood, limit),
            self.catalog.retrieve_by_signal(weather, limit),
            self.catalog.retrieve_by_signal(time_of_day, limit),
        )?;

        Ok(vec![
            CandidateList::new(mood, mood_tracks),
            CandidateList::new(weather, weather_tracks),
            CandidateList::new(time_of_day, time_tracks),
        ])
    }

    /// Writes the recommendation through to the store.
    ///
    /// A write conflict is retried once. Any remaining failure is logged and the
    /// computed recommendation is returned unsaved.
    async fn persist(&self, recommendation: Recommendation) -> Recommendation {
        let outcome = match self.store.upsert(recommendation.clone()).await {
            Ok(stored) => return stored,
            Err(AppError::CacheWriteConflict(detail)) => {
                tracing::warn!(
                    user_id = %recommendation.user_id,
                    context = %recommendation.context,
                    detail = %detail,
                    "Recommendation write conflicted, retrying once"
                );
                self.store.upsert(recommendation.clone()).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(
                    user_id = %recommendation.user_id,
                    context = %recommendation.context,
                    error = %e,
                    "Failed to store recommendation, returning it uncached"
                );
                recommendation
            }
        }
    }
}
