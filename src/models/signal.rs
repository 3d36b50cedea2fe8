use serde::Serialize;
use std::fmt::Display;

use super::{AudioFeatures, ContextKey, Mood, TimeOfDay, Weather};

/// One of the three independent retrieval signals of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Signal {
    Mood(Mood),
    Weather(Weather),
    TimeOfDay(TimeOfDay),
}

impl Signal {
    /// Splits a context into its mood, weather and time-of-day signals, in that order
    pub fn for_context(context: &ContextKey) -> [Signal; 3] {
        [
            Signal::Mood(context.mood),
            Signal::Weather(context.weather),
            Signal::TimeOfDay(context.time_of_day),
        ]
    }

    /// Vote weight of this signal during rank fusion
    pub fn weight(&self) -> u32 {
        match self {
            Signal::Mood(_) => 3,
            Signal::Weather(_) => 2,
            Signal::TimeOfDay(_) => 1,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Signal::Mood(_) => "mood",
            Signal::Weather(_) => "weather",
            Signal::TimeOfDay(_) => "time_of_day",
        }
    }

    /// Applies the feature rule for this signal
    pub fn matches(&self, features: &AudioFeatures) -> bool {
        match *self {
            Signal::Mood(mood) => features.matches_mood(mood),
            Signal::Weather(weather) => features.matches_weather(weather),
            Signal::TimeOfDay(time_of_day) => features.matches_time_of_day(time_of_day),
        }
    }

    /// Whether catalog retrieval has a rule for this signal.
    ///
    /// Signals without one are served from the most popular tracks instead.
    pub fn has_dedicated_predicate(&self) -> bool {
        match self {
            Signal::Mood(_) => true,
            Signal::Weather(weather) => *weather == Weather::Rainy,
            Signal::TimeOfDay(time_of_day) => *time_of_day == TimeOfDay::Morning,
        }
    }

    /// Every signal value that currently falls back to popularity
    pub fn without_dedicated_predicate() -> Vec<Signal> {
        Mood::ALL
            .into_iter()
            .map(Signal::Mood)
            .chain(Weather::ALL.into_iter().map(Signal::Weather))
            .chain(TimeOfDay::ALL.into_iter().map(Signal::TimeOfDay))
            .filter(|signal| !signal.has_dedicated_predicate())
            .collect()
    }
}

impl Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Mood(mood) => write!(f, "mood:{}", mood),
            Signal::Weather(weather) => write!(f, "weather:{}", weather),
            Signal::TimeOfDay(time_of_day) => write!(f, "time_of_day:{}", time_of_day),
        }
    }
}
