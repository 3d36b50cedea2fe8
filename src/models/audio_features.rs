use serde::{Deserialize, Serialize};

use super::{Mood, TimeOfDay, Weather};

/// Audio analysis vector attached to every catalog track
///
/// Unit-interval fields (danceability, energy, speechiness, acousticness,
/// instrumentalness, liveness, valence) range over [0, 1]. Loudness is in dB,
/// tempo in beats per minute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub danceability: f64,
    pub energy: f64,
    pub key: i32,
    pub loudness: f64,
    pub mode: i32,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
    pub duration_ms: i64,
    pub time_signature: i32,
}

// Every rule below uses strict comparisons: a feature sitting exactly on a
// threshold does not match, and NaN never matches.

impl AudioFeatures {
    /// Whether the track fits the given mood
    pub fn matches_mood(&self, mood: Mood) -> bool {
        match mood {
            Mood::Happy => self.valence > 0.7 && self.energy > 0.5,
            Mood::Sad => self.valence < 0.4 && self.energy < 0.5,
            Mood::Energetic => self.energy > 0.8 && self.tempo > 120.0,
            Mood::Calm => self.energy < 0.4 && self.acousticness > 0.5,
            Mood::Focused => self.instrumentalness > 0.5 && self.energy < 0.7,
            Mood::Romantic => self.valence > 0.5 && self.energy < 0.6 && self.acousticness > 0.4,
            Mood::Nostalgic => self.valence > 0.3 && self.valence < 0.7 && self.acousticness > 0.4,
            Mood::Party => self.danceability > 0.7 && self.energy > 0.7,
            Mood::Melancholy => {
                self.valence < 0.4 && self.energy < 0.5 && self.acousticness > 0.5
            }
        }
    }

    /// Whether the track fits the given weather
    pub fn matches_weather(&self, weather: Weather) -> bool {
        match weather {
            Weather::Sunny => self.valence > 0.6 && self.energy > 0.5,
            Weather::Rainy => self.valence < 0.5 && self.acousticness > 0.5,
            Weather::Stormy => self.energy > 0.7 && self.loudness > -8.0,
            Weather::Snowy => self.acousticness > 0.6 && self.energy < 0.5,
            Weather::Cloudy => self.valence > 0.3 && self.valence < 0.7,
            Weather::Foggy => self.acousticness > 0.5 && self.instrumentalness > 0.3,
            Weather::Windy => self.energy > 0.6 && self.acousticness < 0.4,
            Weather::Hot => self.energy > 0.5 && self.danceability > 0.6,
            Weather::Cold => self.energy < 0.6 && self.acousticness > 0.4,
        }
    }

    /// Whether the track fits the given time of day
    pub fn matches_time_of_day(&self, time_of_day: TimeOfDay) -> bool {
        match time_of_day {
            TimeOfDay::Morning => self.valence > 0.5 && self.energy > 0.5 && self.energy < 0.8,
            TimeOfDay::Afternoon => self.energy > 0.5 && self.danceability > 0.5,
            TimeOfDay::Evening => self.energy > 0.3 && self.energy < 0.8,
            // Either winding down or still dancing
            TimeOfDay::Night => {
                (self.energy < 0.5 && self.acousticness > 0.5)
                    || (self.energy > 0.8 && self.danceability > 0.7)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(valence: f64, energy: f64) -> AudioFeatures {
        AudioFeatures {
            valence,
            energy,
            ..Default::default()
        }
    }

    #[test]
    fn test_happy_requires_high_valence_and_energy() {
        assert!(features(0.8, 0.6).matches_mood(Mood::Happy));
        assert!(!features(0.8, 0.4).matches_mood(Mood::Happy));
        assert!(!features(0.6, 0.9).matches_mood(Mood::Happy));
    }

    #[test]
    fn test_threshold_values_do_not_match() {
        assert!(!features(0.7, 0.6).matches_mood(Mood::Happy));
        assert!(!features(0.8, 0.5).matches_mood(Mood::Happy));

        let at_tempo = AudioFeatures {
            energy: 0.9,
            tempo: 120.0,
            ..Default::default()
        };
        assert!(!at_tempo.matches_mood(Mood::Energetic));

        let morning_ceiling = features(0.6, 0.8);
        assert!(!morning_ceiling.matches_time_of_day(TimeOfDay::Morning));
    }

    #[test]
    fn test_energetic_uses_tempo() {
        let fast = AudioFeatures {
            energy: 0.9,
            tempo: 128.0,
            ..Default::default()
        };
        let slow = AudioFeatures { tempo: 95.0, ..fast.clone() };
        assert!(fast.matches_mood(Mood::Energetic));
        assert!(!slow.matches_mood(Mood::Energetic));
    }

    #[test]
    fn test_rainy_prefers_acoustic_low_valence() {
        let acoustic = AudioFeatures {
            valence: 0.3,
            acousticness: 0.7,
            ..Default::default()
        };
        assert!(acoustic.matches_weather(Weather::Rainy));
        assert!(!acoustic.matches_weather(Weather::Sunny));
    }

    #[test]
    fn test_stormy_uses_loudness() {
        let loud = AudioFeatures {
            energy: 0.8,
            loudness: -5.0,
            ..Default::default()
        };
        let quiet = AudioFeatures { loudness: -12.0, ..loud.clone() };
        assert!(loud.matches_weather(Weather::Stormy));
        assert!(!quiet.matches_weather(Weather::Stormy));
    }

    #[test]
    fn test_night_accepts_both_quiet_and_dance_tracks() {
        let quiet = AudioFeatures {
            energy: 0.2,
            acousticness: 0.8,
            ..Default::default()
        };
        let club = AudioFeatures {
            energy: 0.9,
            danceability: 0.8,
            ..Default::default()
        };
        let middling = AudioFeatures {
            energy: 0.6,
            danceability: 0.6,
            acousticness: 0.3,
            ..Default::default()
        };
        assert!(quiet.matches_time_of_day(TimeOfDay::Night));
        assert!(club.matches_time_of_day(TimeOfDay::Night));
        assert!(!middling.matches_time_of_day(TimeOfDay::Night));
    }

    #[test]
    fn test_nan_features_never_match() {
        let nan = AudioFeatures {
            valence: f64::NAN,
            energy: f64::NAN,
            ..Default::default()
        };
        for mood in Mood::ALL {
            assert!(!nan.matches_mood(mood));
        }
    }

    #[test]
    fn test_predicates_are_deterministic() {
        let track = AudioFeatures {
            danceability: 0.65,
            energy: 0.55,
            acousticness: 0.45,
            valence: 0.52,
            tempo: 110.0,
            ..Default::default()
        };
        for mood in Mood::ALL {
            assert_eq!(track.matches_mood(mood), track.matches_mood(mood));
        }
        for weather in Weather::ALL {
            assert_eq!(track.matches_weather(weather), track.matches_weather(weather));
        }
        for time in TimeOfDay::ALL {
            assert_eq!(track.matches_time_of_day(time), track.matches_time_of_day(time));
        }
    }

    #[test]
    fn test_deserializes_catalog_payload() {
        let json = r#"{
            "danceability": 0.735,
            "energy": 0.578,
            "key": 5,
            "loudness": -11.84,
            "mode": 0,
            "speechiness": 0.0461,
            "acousticness": 0.514,
            "instrumentalness": 0.0902,
            "liveness": 0.159,
            "valence": 0.624,
            "tempo": 98.002,
            "duration_ms": 255349,
            "time_signature": 4
        }"#;

        let parsed: AudioFeatures = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.key, 5);
        assert_eq!(parsed.duration_ms, 255349);
        assert!(parsed.matches_time_of_day(TimeOfDay::Afternoon));
    }
}
