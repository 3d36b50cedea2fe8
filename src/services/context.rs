use std::sync::Arc;

use serde::Deserialize;

use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    models::{ContextKey, Mood, TimeOfDay, Weather},
    services::weather::WeatherProvider,
};

/// Raw context supplied with a recommendation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextRequest {
    pub mood: Option<String>,
    pub weather: Option<String>,
    pub time_of_day: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Values parsed from a request before any defaults are looked up
struct ParsedContext {
    mood: Mood,
    weather: Option<Weather>,
    time_of_day: Option<TimeOfDay>,
}

impl ContextRequest {
    fn parse(&self) -> AppResult<ParsedContext> {
        let mood = self
            .mood
            .as_deref()
            .ok_or_else(|| AppError::InvalidContext("mood is required".to_string()))?
            .parse::<Mood>()?;

        let weather = self.weather.as_deref().map(str::parse::<Weather>).transpose()?;
        let time_of_day = self
            .time_of_day
            .as_deref()
            .map(str::parse::<TimeOfDay>)
            .transpose()?;

        Ok(ParsedContext {
            mood,
            weather,
            time_of_day,
        })
    }
}

/// Completes partial request contexts into a [`ContextKey`].
///
/// Weather comes from the provider when coordinates are given and falls back
/// to sunny otherwise. Time of day comes from the clock.
#[derive(Clone)]
pub struct ContextResolver {
    weather: Option<Arc<dyn WeatherProvider>>,
    clock: Arc<dyn Clock>,
}

impl ContextResolver {
    pub fn new(weather: Option<Arc<dyn WeatherProvider>>, clock: Arc<dyn Clock>) -> Self {
        Self { weather, clock }
    }

    /// Validates every explicit field first, so malformed input never reaches
    /// the weather provider.
    pub async fn resolve(&self, request: &ContextRequest) -> AppResult<ContextKey> {
        let parsed = request.parse()?;

        let weather = match parsed.weather {
            Some(weather) => weather,
            None => self.lookup_weather(request.latitude, request.longitude).await,
        };

        let time_of_day = parsed
            .time_of_day
            .unwrap_or_else(|| self.clock.time_of_day());

        Ok(ContextKey::new(parsed.mood, weather, time_of_day))
    }

    async fn lookup_weather(&self, latitude: Option<f64>, longitude: Option<f64>) -> Weather {
        let (Some(provider), Some(latitude), Some(longitude)) = (&self.weather, latitude, longitude)
        else {
            return Weather::Sunny;
        };

        match provider.current_weather(latitude, longitude).await {
            Ok(weather) => weather,
            Err(e) => {
                tracing::warn!(
                    provider = provider.name(),
                    error = %e,
                    latitude,
                    longitude,
                    "Weather lookup failed, assuming sunny"
                );
                Weather::Sunny
            }
        }
    }
}
