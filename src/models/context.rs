use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// Listener mood supplied with a recommendation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Focused,
    Romantic,
    Nostalgic,
    Party,
    Melancholy,
}

/// Current weather at the listener's location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
    Foggy,
    Windy,
    Hot,
    Cold,
}

/// Wall-clock bucket of the listener's day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl Mood {
    pub const ALL: [Mood; 9] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Energetic,
        Mood::Calm,
        Mood::Focused,
        Mood::Romantic,
        Mood::Nostalgic,
        Mood::Party,
        Mood::Melancholy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Energetic => "energetic",
            Mood::Calm => "calm",
            Mood::Focused => "focused",
            Mood::Romantic => "romantic",
            Mood::Nostalgic => "nostalgic",
            Mood::Party => "party",
            Mood::Melancholy => "melancholy",
        }
    }
}

impl Weather {
    pub const ALL: [Weather; 9] = [
        Weather::Sunny,
        Weather::Cloudy,
        Weather::Rainy,
        Weather::Stormy,
        Weather::Snowy,
        Weather::Foggy,
        Weather::Windy,
        Weather::Hot,
        Weather::Cold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Sunny => "sunny",
            Weather::Cloudy => "cloudy",
            Weather::Rainy => "rainy",
            Weather::Stormy => "stormy",
            Weather::Snowy => "snowy",
            Weather::Foggy => "foggy",
            Weather::Windy => "windy",
            Weather::Hot => "hot",
            Weather::Cold => "cold",
        }
    }

    /// Maps an OpenWeatherMap condition code to a weather bucket
    ///
    /// See https://openweathermap.org/weather-conditions. Codes outside the
    /// documented groups read as sunny.
    pub fn from_condition_code(code: i64) -> Self {
        match code {
            200..=299 => Weather::Stormy,
            300..=399 | 500..=599 => Weather::Rainy,
            600..=699 => Weather::Snowy,
            700..=799 => Weather::Foggy,
            800 => Weather::Sunny,
            c if c > 800 => Weather::Cloudy,
            _ => Weather::Sunny,
        }
    }
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }

    /// Buckets a wall-clock hour: [5,12) morning, [12,17) afternoon,
    /// [17,22) evening, everything else night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

impl FromStr for Mood {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "happy" => Ok(Mood::Happy),
            "sad" => Ok(Mood::Sad),
            "energetic" => Ok(Mood::Energetic),
            "calm" => Ok(Mood::Calm),
            "focused" => Ok(Mood::Focused),
            "romantic" => Ok(Mood::Romantic),
            "nostalgic" => Ok(Mood::Nostalgic),
            "party" => Ok(Mood::Party),
            "melancholy" => Ok(Mood::Melancholy),
            other => Err(AppError::InvalidContext(format!("unknown mood '{}'", other))),
        }
    }
}

impl FromStr for Weather {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sunny" => Ok(Weather::Sunny),
            "cloudy" => Ok(Weather::Cloudy),
            "rainy" => Ok(Weather::Rainy),
            "stormy" => Ok(Weather::Stormy),
            "snowy" => Ok(Weather::Snowy),
            "foggy" => Ok(Weather::Foggy),
            "windy" => Ok(Weather::Windy),
            "hot" => Ok(Weather::Hot),
            "cold" => Ok(Weather::Cold),
            other => Err(AppError::InvalidContext(format!(
                "unknown weather '{}'",
                other
            ))),
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(TimeOfDay::Morning),
            "afternoon" => Ok(TimeOfDay::Afternoon),
            "evening" => Ok(TimeOfDay::Evening),
            "night" => Ok(TimeOfDay::Night),
            other => Err(AppError::InvalidContext(format!(
                "unknown time of day '{}'",
                other
            ))),
        }
    }
}

impl Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for Weather {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (mood, weather, time-of-day) triple a recommendation is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextKey {
    pub mood: Mood,
    pub weather: Weather,
    pub time_of_day: TimeOfDay,
}

impl ContextKey {
    pub fn new(mood: Mood, weather: Weather, time_of_day: TimeOfDay) -> Self {
        Self {
            mood,
            weather,
            time_of_day,
        }
    }
}

impl Display for ContextKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.mood, self.weather, self.time_of_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_parses_from_its_name() {
        for mood in Mood::ALL {
            assert_eq!(mood.as_str().parse::<Mood>().unwrap(), mood);
        }
        for weather in Weather::ALL {
            assert_eq!(weather.as_str().parse::<Weather>().unwrap(), weather);
        }
        for time in TimeOfDay::ALL {
            assert_eq!(time.as_str().parse::<TimeOfDay>().unwrap(), time);
        }
    }

    #[test]
    fn test_unknown_mood_is_invalid_context() {
        let err = "ecstatic".parse::<Mood>().unwrap_err();
        assert!(matches!(err, AppError::InvalidContext(_)));
        assert!(err.to_string().contains("ecstatic"));
    }

    #[test]
    fn test_parsing_is_case_sensitive() {
        assert!("Happy".parse::<Mood>().is_err());
        assert!("SUNNY".parse::<Weather>().is_err());
    }

    #[test]
    fn test_time_of_day_bucket_boundaries() {
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(16), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(22), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
    }

    #[test]
    fn test_condition_codes() {
        assert_eq!(Weather::from_condition_code(211), Weather::Stormy);
        assert_eq!(Weather::from_condition_code(301), Weather::Rainy);
        assert_eq!(Weather::from_condition_code(502), Weather::Rainy);
        assert_eq!(Weather::from_condition_code(601), Weather::Snowy);
        assert_eq!(Weather::from_condition_code(741), Weather::Foggy);
        assert_eq!(Weather::from_condition_code(800), Weather::Sunny);
        assert_eq!(Weather::from_condition_code(804), Weather::Cloudy);
        assert_eq!(Weather::from_condition_code(450), Weather::Sunny);
        assert_eq!(Weather::from_condition_code(-1), Weather::Sunny);
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Mood::Melancholy).unwrap(), "\"melancholy\"");
        let weather: Weather = serde_json::from_str("\"foggy\"").unwrap();
        assert_eq!(weather, Weather::Foggy);
    }

    #[test]
    fn test_context_key_display() {
        let key = ContextKey::new(Mood::Party, Weather::Hot, TimeOfDay::Night);
        assert_eq!(key.to_string(), "party/hot/night");
    }
}
