//! Redis backend
//!
//! Connects lazily on first use through a [`ConnectionManager`], which
//! reconnects by itself after a dropped connection. A failed first connect is
//! reported as [`StoreError::Connection`] and retried on the next command, so
//! the readiness probe in [`NamespacedStore`](crate::NamespacedStore) keeps
//! working while Redis is still coming up.

use crate::{KeyValueBackend, StoreError, StoreResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use tokio::sync::OnceCell;
use tracing::info;

pub struct RedisBackend {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisBackend {
    /// Parse `url` without connecting.
    pub fn open(url: &str) -> StoreResult<Self> {
        let client = Client::open(url)
            .map_err(|e| StoreError::InvalidInput(format!("invalid redis url: {}", e)))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> StoreResult<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone()).await?;
                info!("Connected to redis");
                Ok::<_, RedisError>(manager)
            })
            .await
            .map_err(map_redis_error)?;
        Ok(manager.clone())
    }
}

fn map_redis_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Backend(e.to_string())
    }
}

/// Escape glob metacharacters so a prefix matches literally in `KEYS`
fn glob_escape(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('*');
    escaped
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    async fn mset(&self, pairs: &[(String, String)]) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("MSET");
        for (key, value) in pairs {
            cmd.arg(key).arg(value);
        }
        cmd.query_async::<_, ()>(&mut conn)
            .await
            .map_err(map_redis_error)
    }

    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("MGET");
        for key in keys {
            cmd.arg(key);
        }
        cmd.query_async::<_, Vec<Option<String>>>(&mut conn)
            .await
            .map_err(map_redis_error)
    }

    async fn del(&self, keys: &[String]) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("DEL");
        for key in keys {
            cmd.arg(key);
        }
        cmd.query_async::<_, ()>(&mut conn)
            .await
            .map_err(map_redis_error)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.connection().await?;
        redis::cmd("KEYS")
            .arg(glob_escape(prefix))
            .query_async::<_, Vec<String>>(&mut conn)
            .await
            .map_err(map_redis_error)
    }
}
