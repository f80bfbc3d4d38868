//! Redis cache for the chart of accounts and rate limiting.

use redis::{aio::ConnectionManager, AsyncCommands, RedisError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use common::{AppError, AppResult, CacheConfig};

use crate::clients::AccountView;

/// Cache key for the full chart of accounts, inactive accounts included
const CACHE_KEY_ACCOUNTS: &str = "ledger:accounts";

/// Cache key prefix for rate limiting
const CACHE_PREFIX_RATE_LIMIT: &str = "rate_limit:";

/// Redis cache wrapper.
pub struct Cache {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl Cache {
    /// Connect to Redis.
    pub async fn connect(config: &CacheConfig) -> Result<Self, RedisError> {
        debug!("Connecting to Redis at {}", config.url);
        let client = redis::Client::open(config.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            ttl_seconds: config.default_ttl_seconds,
        })
    }

    // =========================================================================
    // Generic Cache Operations
    // =========================================================================

    /// Get a value from cache.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let mut conn = self.conn.clone();
        let result: Option<String> = conn.get(key).await.map_err(|e| {
            warn!("Redis get error for key {}: {}", key, e);
            AppError::from(e)
        })?;

        match result {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    // Stale shape after a deploy reads as a miss
                    warn!("Failed to deserialize cached value for key {}: {}", key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Set a value in cache with the configured TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Serialization error: {}", e)))?;
        conn.set_ex::<_, _, ()>(key, json, self.ttl_seconds)
            .await
            .map_err(|e| {
                warn!("Redis set error for key {}: {}", key, e);
                AppError::from(e)
            })?;
        Ok(())
    }

    /// Delete a value from cache.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(|e| {
            warn!("Redis delete error for key {}: {}", key, e);
            AppError::from(e)
        })?;
        Ok(())
    }

    /// Round trip to Redis.
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    // =========================================================================
    // Chart of accounts
    // =========================================================================

    /// Cached chart of accounts. Cache failures read as a miss.
    pub async fn get_accounts(&self) -> Option<Vec<AccountView>> {
        self.get(CACHE_KEY_ACCOUNTS).await.unwrap_or(None)
    }

    pub async fn set_accounts(&self, accounts: &[AccountView]) {
        if let Err(e) = self.set(CACHE_KEY_ACCOUNTS, &accounts).await {
            warn!("Could not cache chart of accounts: {}", e);
        }
    }

    /// Drop the cached chart after anything that changes accounts or balances.
    pub async fn invalidate_accounts(&self) {
        if let Err(e) = self.delete(CACHE_KEY_ACCOUNTS).await {
            warn!("Could not invalidate chart of accounts: {}", e);
        }
    }

    // =========================================================================
    // Rate Limiting
    // =========================================================================

    /// Check rate limit and increment counter.
    /// Returns (current_count, allowed).
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let mut conn = self.conn.clone();

        let count: u64 = conn.incr(&key, 1).await.map_err(AppError::from)?;

        // Window starts on the first request
        if count == 1 {
            conn.expire::<_, ()>(&key, window_seconds as i64)
                .await
                .map_err(AppError::from)?;
        }

        Ok((count, count <= max_requests))
    }
}
