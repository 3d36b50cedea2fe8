use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moodtune_api::{
    api::{create_router, AppState},
    clock::{Clock, SystemClock},
    config::Config,
    db::{
        create_pool, create_redis_client, Cache, PgRecommendationStore, PgTrackCatalog,
        PgUserStore, RecommendationStore,
    },
    models::Signal,
    services::{
        spawn_sweeper, ContextResolver, OpenWeatherProvider, RandomSampler,
        RecommendationService, RecommendationSettings, WeatherProvider,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let pool = create_pool(&config.database_url).await?;
    let (cache, cache_writer) = Cache::new(create_redis_client(&config.redis_url)?);

    let weather: Option<Arc<dyn WeatherProvider>> = if config.weather_api_key.is_empty() {
        tracing::warn!("WEATHER_API_KEY not set, requests without weather will assume sunny");
        drop(cache);
        None
    } else {
        Some(Arc::new(OpenWeatherProvider::new(
            config.weather_api_key.clone(),
            config.weather_api_url.clone(),
            Some(cache),
        )))
    };

    let fallbacks: Vec<String> = Signal::without_dedicated_predicate()
        .iter()
        .map(ToString::to_string)
        .collect();
    tracing::info!(
        count = fallbacks.len(),
        signals = %fallbacks.join(", "),
        "Signals without a retrieval rule are served by popularity"
    );

    let store: Arc<dyn RecommendationStore> =
        Arc::new(PgRecommendationStore::new(pool.clone(), clock.clone()));
    let sweeper = spawn_sweeper(
        store.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    );

    let service = RecommendationService::new(
        Arc::new(PgTrackCatalog::new(pool.clone())),
        Arc::new(PgUserStore::new(pool)),
        store,
        Arc::new(RandomSampler::from_seed(config.sampler_seed)),
        ContextResolver::new(weather, clock.clone()),
        clock,
        RecommendationSettings::try_from(&config)?,
    );

    let state = AppState::new(service, Duration::from_secs(config.request_timeout_secs));
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    cache_writer.shutdown(Duration::from_secs(5)).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
