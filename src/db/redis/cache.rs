use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Embedding of a user prompt under a given model
    ///
    /// Casing is kept: the provider embeds the prompt as typed.
    PromptEmbedding { model: String, prompt: String },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::PromptEmbedding { model, prompt } => {
                write!(f, "embed:{}:{}", model, prompt.trim())
            }
        }
    }
}

/// Creates a Redis client for caching
///
/// Opening the client does not connect; connections are made per operation.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

struct CacheWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed JSON cache with a background writer
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    op_timeout: Duration,
    write_tx: mpsc::UnboundedSender<CacheWrite>,
}

/// Handle for stopping the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer to flush queued writes and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates the cache and spawns its writer task
    ///
    /// Writes go through a channel so request handlers never wait on Redis.
    /// Every connect plus command is bounded by `op_timeout`.
    pub async fn new(redis_client: Client, op_timeout: Duration) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::run_writer(client, op_timeout, write_rx, shutdown_rx).await;
        });

        (
            Self {
                redis_client,
                op_timeout,
                write_tx,
            },
            CacheWriterHandle { shutdown_tx },
        )
    }

    async fn run_writer(
        client: Client,
        op_timeout: Duration,
        mut write_rx: mpsc::UnboundedReceiver<CacheWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");
        let mut failed_writes = 0_u64;

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    if let Err(e) = Self::write(&client, op_timeout, write).await {
                        failed_writes += 1;
                        tracing::warn!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    // Only drain what is queued; clones of the sender may outlive the writer
                    while let Ok(write) = write_rx.try_recv() {
                        if let Err(e) = Self::write(&client, op_timeout, write).await {
                            failed_writes += 1;
                            tracing::warn!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }

                    tracing::info!(failed_writes, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write(client: &Client, op_timeout: Duration, write: CacheWrite) -> AppResult<()> {
        bounded(op_timeout, "write", async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(write.key, write.value, write.ttl).await?;
            Ok::<_, AppError>(())
        })
        .await
    }

    /// Reads and deserializes a cached value, `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let cached: Option<String> = bounded(self.op_timeout, "read", async {
            let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
            let cached: Option<String> = conn.get(key.to_string()).await?;
            Ok::<_, AppError>(cached)
        })
        .await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })
            })
            .transpose()
    }

    /// Queues a value for writing without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let write = CacheWrite {
            key: key.to_string(),
            value,
            ttl,
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer stopped; dropping write");
        }
    }
}

/// Fails with [`AppError::Cache`] when Redis does not answer within `limit`
async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    fut: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Cache(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "Redis did not respond in time",
            format!("{} exceeded {}ms", operation, limit.as_millis()),
        )))),
    }
}
