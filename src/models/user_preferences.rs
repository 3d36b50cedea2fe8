use serde::{Deserialize, Serialize};

/// Default lower bound of the accepted tempo band, in BPM
pub const DEFAULT_MIN_TEMPO: f64 = 0.0;
/// Default upper bound of the accepted tempo band, in BPM
pub const DEFAULT_MAX_TEMPO: f64 = 250.0;

/// A listener as seen by the recommendation engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub preferences: UserPreferences,
}

/// Listening preferences stored with each user
///
/// Only the tempo band takes part in recommendation filtering. Genres and
/// preferred moods are kept for clients but not applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreferences {
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub disliked_genres: Vec<String>,
    #[serde(default = "default_min_tempo")]
    pub min_tempo: f64,
    #[serde(default = "default_max_tempo")]
    pub max_tempo: f64,
    #[serde(default)]
    pub preferred_moods: Vec<String>,
}

fn default_min_tempo() -> f64 {
    DEFAULT_MIN_TEMPO
}

fn default_max_tempo() -> f64 {
    DEFAULT_MAX_TEMPO
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self::new()
    }
}

impl UserPreferences {
    /// Creates preferences with the full default tempo band
    pub fn new() -> Self {
        Self {
            favorite_genres: Vec::new(),
            disliked_genres: Vec::new(),
            min_tempo: DEFAULT_MIN_TEMPO,
            max_tempo: DEFAULT_MAX_TEMPO,
            preferred_moods: Vec::new(),
        }
    }

    /// Narrows the accepted tempo band
    pub fn with_tempo_range(mut self, min_tempo: f64, max_tempo: f64) -> Self {
        self.min_tempo = min_tempo;
        self.max_tempo = max_tempo;
        self
    }

    /// Whether a track tempo falls inside the band, both ends included
    pub fn accepts_tempo(&self, tempo: f64) -> bool {
        !(tempo < self.min_tempo || tempo > self.max_tempo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_preferences() {
        let prefs = UserPreferences::new();
        assert!(prefs.favorite_genres.is_empty());
        assert_eq!(prefs.min_tempo, 0.0);
        assert_eq!(prefs.max_tempo, 250.0);
    }

    #[test]
    fn test_accepts_tempo_inclusive_bounds() {
        let prefs = UserPreferences::new().with_tempo_range(90.0, 140.0);
        assert!(prefs.accepts_tempo(90.0));
        assert!(prefs.accepts_tempo(140.0));
        assert!(prefs.accepts_tempo(120.5));
        assert!(!prefs.accepts_tempo(89.9));
        assert!(!prefs.accepts_tempo(140.1));
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"favorite_genres": ["jazz"]}"#).unwrap();
        assert_eq!(prefs.favorite_genres, vec!["jazz".to_string()]);
        assert_eq!(prefs.min_tempo, DEFAULT_MIN_TEMPO);
        assert_eq!(prefs.max_tempo, DEFAULT_MAX_TEMPO);
    }
}
