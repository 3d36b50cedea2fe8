mod audio_features;
mod context;
mod recommendation;
mod signal;
mod track;
mod user_preferences;

pub use audio_features::AudioFeatures;
pub use context::{ContextKey, Mood, TimeOfDay, Weather};
pub use recommendation::Recommendation;
pub use signal::Signal;
pub use track::Track;
pub use user_preferences::{User, UserPreferences, DEFAULT_MAX_TEMPO, DEFAULT_MIN_TEMPO};
