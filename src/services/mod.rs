pub mod context;
pub mod fusion;
pub mod recommendations;
pub mod sampling;
pub mod sweeper;
pub mod weather;

pub use context::{ContextRequest, ContextResolver};
pub use recommendations::{RecommendationService, RecommendationSettings};
pub use sampling::{RandomSampler, Sampler, TopSampler};
pub use sweeper::{spawn_sweeper, SweeperHandle};
pub use weather::{OpenWeatherProvider, WeatherProvider};
