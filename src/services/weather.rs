//! Current-weather lookups.
//!
//! OpenWeatherMap flow: `/data/2.5/weather?lat=..&lon=..` returns a list of
//! conditions; the first condition code is mapped to a [`Weather`] bucket.
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::Weather,
};

const WEATHER_CACHE_TTL: u64 = 600; // 10 minutes

/// Source of the current weather at a location
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, latitude: f64, longitude: f64) -> AppResult<Weather>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    weather: Vec<WeatherCondition>,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    id: i64,
}

impl WeatherResponse {
    fn bucket(&self) -> AppResult<Weather> {
        self.weather
            .first()
            .map(|condition| Weather::from_condition_code(condition.id))
            .ok_or_else(|| {
                AppError::ExternalApi("OpenWeatherMap response has no conditions".to_string())
            })
    }
}

#[derive(Clone)]
pub struct OpenWeatherProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Option<Cache>,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, api_url: String, cache: Option<Cache>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    async fn fetch_weather(&self, latitude: f64, longitude: f64) -> AppResult<Weather> {
        let url = format!("{}/data/2.5/weather", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OpenWeatherMap API returned status {}: {}",
                status, body
            )));
        }

        let body: WeatherResponse = response.json().await?;
        let weather = body.bucket()?;

        tracing::info!(
            latitude,
            longitude,
            weather = %weather,
            "Fetched current weather from OpenWeatherMap"
        );

        Ok(weather)
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(&self, latitude: f64, longitude: f64) -> AppResult<Weather> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::ExternalApi(format!(
                "Coordinates out of range: {}, {}",
                latitude, longitude
            )));
        }

        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::weather(latitude, longitude),
                WEATHER_CACHE_TTL,
                self.fetch_weather(latitude, longitude)
            ),
            None => self.fetch_weather(latitude, longitude).await,
        }
    }

    fn name(&self) -> &'static str {
        "openweathermap"
    }
}
