use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::AudioFeatures;

/// A catalog track with its audio analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Internal catalog ID
    pub id: String,
    /// ID in the external music catalog (e.g. a Spotify track ID)
    pub external_id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub release_date: Option<NaiveDate>,
    /// Catalog popularity, 0 to 100
    pub popularity: i32,
    pub audio_features: AudioFeatures,
    pub preview_url: Option<String>,
    pub image_url: Option<String>,
}

impl Track {
    pub fn tempo(&self) -> f64 {
        self.audio_features.tempo
    }
}
