use super::DbClient;
use crate::errors::ApiError;
use crate::Result;
use redis::AsyncCommands;

/// Cache key for a document's status summary
pub fn document_status_key(document_id: &str) -> String {
    format!("document_status:{document_id}")
}

impl DbClient {
    pub async fn set_cache(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.get_async_redis_conn().await.map_err(|err| {
            tracing::error!("Redis connection error: {}", err);
            ApiError::from(err)
        })?;

        conn.set_ex::<_, _, ()>(key, value, self.cache_ttl_seconds())
            .await
            .map_err(|err| {
                tracing::error!("Redis SET failed: {}", err);
                ApiError::from(err)
            })?;
        tracing::debug!("Cache set for key: {}", key);
        Ok(())
    }

    pub async fn get_cache(&self, key: &str) -> Result<String> {
        let mut conn = self.get_async_redis_conn().await?;

        let value: Option<String> = conn.get(key).await.map_err(|err| {
            tracing::error!("Redis GET failed: {}", err);
            ApiError::from(err)
        })?;

        value.ok_or_else(|| ApiError::NotFound(format!("Cache miss for key: {key}")))
    }

    /// Drops a cached value; failures are logged and swallowed
    pub async fn invalidate_cache(&self, key: &str) {
        let result = async {
            let mut conn = self.get_async_redis_conn().await?;
            conn.del::<_, ()>(key).await
        }
        .await;

        match result {
            Ok(()) => tracing::debug!("Cache invalidated for key: {}", key),
            Err(err) => tracing::warn!("Failed to invalidate cache key {}: {}", key, err),
        }
    }
}
