use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{Signal, Track};

/// A fused candidate with its accumulated vote score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTrack {
    pub track: Track,
    pub score: u32,
    pub popularity: i32,
}

impl ScoredTrack {
    /// Composite rank order: score desc, popularity desc, ID asc
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.popularity.cmp(&self.popularity))
            .then_with(|| self.track.id.cmp(&other.track.id))
    }
}

/// Candidate list produced by one retrieval signal
#[derive(Debug, Clone)]
pub struct CandidateList {
    pub signal: Signal,
    pub tracks: Vec<Track>,
}

impl CandidateList {
    pub fn new(signal: Signal, tracks: Vec<Track>) -> Self {
        Self { signal, tracks }
    }
}

/// Merges per-signal candidate lists into one ranked list of at most `limit`.
///
/// Every appearance of a track adds the weight of its list to the track's
/// score. Lists are applied in the given order, and the track record kept for
/// output is the one from the last list that contained it.
pub fn fuse(lists: &[CandidateList], limit: usize) -> Vec<ScoredTrack> {
    let mut scored: HashMap<&str, ScoredTrack> = HashMap::new();

    for list in lists {
        let weight = list.signal.weight();
        for track in &list.tracks {
            scored
                .entry(track.id.as_str())
                .and_modify(|entry| {
                    entry.score += weight;
                    entry.popularity = track.popularity;
                    entry.track = track.clone();
                })
                .or_insert_with(|| ScoredTrack {
                    track: track.clone(),
                    score: weight,
                    popularity: track.popularity,
                });
        }
    }

    let mut ranked: Vec<ScoredTrack> = scored.into_values().collect();
    ranked.sort_by(ScoredTrack::rank_cmp);
    ranked.truncate(limit);

    tracing::debug!(
        lists = lists.len(),
        fused = ranked.len(),
        limit,
        "Fused candidate lists"
    );

    ranked
}
