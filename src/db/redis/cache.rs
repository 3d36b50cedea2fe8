use std::fmt::Display;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Weather reading for a location, in hundredths of a degree
    Weather { lat: i64, lon: i64 },
}

impl CacheKey {
    /// Weather key for a coordinate, rounded to two decimals (roughly 1 km)
    pub fn weather(lat: f64, lon: f64) -> Self {
        CacheKey::Weather {
            lat: (lat * 100.0).round() as i64,
            lon: (lon * 100.0).round() as i64,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Weather { lat, lon } => write!(
                f,
                "weather:{:.2}:{:.2}",
                *lat as f64 / 100.0,
                *lon as f64 / 100.0
            ),
        }
    }
}

/// Opens a Redis client. No connection is made until first use.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    Ok(Client::open(redis_url)?)
}

/// A serialized value waiting to be stored
struct PendingWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// JSON values in Redis with expiry; writes go through a background task
#[derive(Clone)]
pub struct Cache {
    client: Client,
    writes: mpsc::UnboundedSender<PendingWrite>,
}

/// Completion handle of the background writer.
///
/// The writer stops once every [`Cache`] clone has been dropped and the queue
/// is drained.
pub struct CacheWriterHandle {
    task: JoinHandle<usize>,
}

impl CacheWriterHandle {
    /// Waits up to `grace` for queued writes to reach Redis
    pub async fn shutdown(self, grace: Duration) {
        match tokio::time::timeout(grace, self.task).await {
            Ok(Ok(written)) => tracing::info!(written, "Cache writer stopped"),
            Ok(Err(e)) => tracing::error!(error = %e, "Cache writer ended abnormally"),
            Err(_) => tracing::warn!("Cache writer still busy at shutdown, pending writes dropped"),
        }
    }
}

impl Cache {
    pub fn new(client: Client) -> (Self, CacheWriterHandle) {
        let (writes, queue) = mpsc::unbounded_channel();
        let task = tokio::spawn(drain_writes(client.clone(), queue));
        (Self { client, writes }, CacheWriterHandle { task })
    }

    /// Reads and decodes a value; `None` when absent or expired
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(key.to_string()).await?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|e| AppError::Internal(format!("Cache entry {} is unreadable: {}", key, e)))
    }

    /// Queues a value for storage with a TTL in seconds.
    ///
    /// Never blocks the caller; failures are only logged.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            value,
            ttl,
        };
        if self.writes.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer has stopped, value not stored");
        }
    }
}

/// Stores queued writes over one reused connection, reconnecting after errors.
/// Returns the number of values written.
async fn drain_writes(client: Client, mut queue: mpsc::UnboundedReceiver<PendingWrite>) -> usize {
    let mut conn: Option<MultiplexedConnection> = None;
    let mut written = 0;

    while let Some(write) = queue.recv().await {
        if conn.is_none() {
            match client.get_multiplexed_async_connection().await {
                Ok(fresh) => conn = Some(fresh),
                Err(e) => {
                    tracing::warn!(key = %write.key, error = %e, "Redis unreachable, cache write dropped");
                    continue;
                }
            }
        }
        let Some(active) = conn.as_mut() else {
            continue;
        };

        let result: redis::RedisResult<()> = active.set_ex(&write.key, &write.value, write.ttl).await;
        match result {
            Ok(()) => written += 1,
            Err(e) => {
                tracing::warn!(key = %write.key, error = %e, "Cache write failed");
                conn = None;
            }
        }
    }

    written
}
