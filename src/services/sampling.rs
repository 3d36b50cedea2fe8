use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::models::{Track, UserPreferences};

/// Keeps tracks whose tempo lies in the user's band.
///
/// Returns the input unchanged when no track survives, so a narrow band never
/// empties a recommendation.
pub fn filter_by_tempo(tracks: Vec<Track>, preferences: &UserPreferences) -> Vec<Track> {
    let filtered: Vec<Track> = tracks
        .iter()
        .filter(|track| preferences.accepts_tempo(track.tempo()))
        .cloned()
        .collect();

    if filtered.is_empty() {
        tracing::debug!(
            candidates = tracks.len(),
            min_tempo = preferences.min_tempo,
            max_tempo = preferences.max_tempo,
            "Tempo filter matched nothing, keeping unfiltered candidates"
        );
        return tracks;
    }

    filtered
}

/// Picks the final tracks out of the filtered candidates
pub trait Sampler: Send + Sync {
    /// Returns at most `count` tracks, all drawn from `tracks`.
    /// Lists no longer than `count` come back unchanged.
    fn sample(&self, tracks: Vec<Track>, count: usize) -> Vec<Track>;
}

/// Uniform random subset
pub struct RandomSampler {
    rng: Mutex<StdRng>,
}

impl RandomSampler {
    /// Sampler seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible sampler
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomSampler {
    fn sample(&self, mut tracks: Vec<Track>, count: usize) -> Vec<Track> {
        if tracks.len() <= count {
            return tracks;
        }

        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        tracks.shuffle(&mut *rng);
        tracks.truncate(count);
        tracks
    }
}

/// Deterministic sampler keeping the first `count` tracks in rank order
#[derive(Debug, Clone, Copy, Default)]
pub struct TopSampler;

impl Sampler for TopSampler {
    fn sample(&self, mut tracks: Vec<Track>, count: usize) -> Vec<Track> {
        tracks.truncate(count);
        tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioFeatures;
    use std::collections::HashSet;

    fn track(id: usize, tempo: f64) -> Track {
        Track {
            id: format!("t{:02}", id),
            external_id: format!("ext-{}", id),
            name: format!("Track {}", id),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            release_date: None,
            popularity: 50,
            audio_features: AudioFeatures {
                tempo,
                ..Default::default()
            },
            preview_url: None,
            image_url: None,
        }
    }

    #[test]
    fn test_filter_keeps_inclusive_band() {
        let prefs = UserPreferences::new().with_tempo_range(90.0, 140.0);
        let tracks = vec![track(1, 89.0), track(2, 90.0), track(3, 140.0), track(4, 141.0)];

        let kept: Vec<String> = filter_by_tempo(tracks, &prefs)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(kept, vec!["t02".to_string(), "t03".to_string()]);
    }

    #[test]
    fn test_filter_falls_back_when_nothing_matches() {
        let prefs = UserPreferences::new().with_tempo_range(200.0, 210.0);
        let tracks = vec![track(1, 80.0), track(2, 120.0)];

        let kept = filter_by_tempo(tracks.clone(), &prefs);
        assert_eq!(kept, tracks);
    }

    #[test]
    fn test_random_sampler_returns_unique_subset() {
        let tracks: Vec<Track> = (0..35).map(|i| track(i, 120.0)).collect();
        let input: HashSet<String> = tracks.iter().map(|t| t.id.clone()).collect();

        let sampled = RandomSampler::new().sample(tracks, 20);
        let ids: HashSet<String> = sampled.iter().map(|t| t.id.clone()).collect();

        assert_eq!(sampled.len(), 20);
        assert_eq!(ids.len(), 20);
        assert!(ids.is_subset(&input));
    }

    #[test]
    fn test_short_list_is_returned_unchanged() {
        let tracks: Vec<Track> = (0..12).map(|i| track(i, 120.0)).collect();
        assert_eq!(RandomSampler::seeded(7).sample(tracks.clone(), 20), tracks);
        assert_eq!(RandomSampler::seeded(7).sample(tracks.clone(), 12), tracks);
    }

    #[test]
    fn test_seeded_samplers_agree() {
        let tracks: Vec<Track> = (0..35).map(|i| track(i, 120.0)).collect();
        let a = RandomSampler::seeded(42).sample(tracks.clone(), 20);
        let b = RandomSampler::seeded(42).sample(tracks, 20);
        assert_eq!(a, b);
    }

    #[test]
    fn test_top_sampler_keeps_rank_order() {
        let tracks: Vec<Track> = (0..30).map(|i| track(i, 120.0)).collect();
        let sampled = TopSampler.sample(tracks.clone(), 20);
        assert_eq!(sampled, tracks[..20].to_vec());
    }
}
