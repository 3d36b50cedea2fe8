/// Read-through caching over [`Cache`](crate::db::Cache).
///
/// Looks the key up first and returns the cached value on a hit. A miss, or a
/// failed cache read, awaits `$block`, hands the result to the background
/// writer with the given TTL (seconds) and returns it. Errors from the block
/// are propagated with `?`. The macro evaluates to `Ok(value)`, so use it as
/// the tail expression of a function returning `AppResult`.
///
/// # Example
/// ```rust,ignore
/// async fn weather_at(&self, lat: f64, lon: f64) -> AppResult<Weather> {
///     cached!(self.cache, CacheKey::weather(lat, lon), 600, async {
///         self.fetch_condition(lat, lon).await
///     })
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        };

        if let Some(cached) = hit {
            tracing::debug!(key = %key, "Cache hit");
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
