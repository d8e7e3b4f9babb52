use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::{config::Config, error::Result};

/// Time-bounded USD quote store keyed by `<source>:<identifier>`.
///
/// Concurrent writers for the same key are allowed; the last write wins.
#[async_trait]
pub trait PriceCache: Send + Sync {
    /// Returns the value only while it is younger than the backend's TTL.
    async fn get(&self, key: &str) -> Option<f64>;
    async fn set(&self, key: &str, value: f64);
    fn backend(&self) -> &'static str;
}

#[derive(Clone)]
struct CachedEntry<V> {
    fetched_at: Instant,
    value: V,
}

/// In-process map whose entries expire by being ignored once stale.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedEntry<V>>>,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let guard = self.entries.read().await;
        let entry = guard.get(key)?;
        if entry.fetched_at.elapsed() < self.ttl {
            return Some(entry.value.clone());
        }
        None
    }

    pub async fn insert(&self, key: &str, value: V) {
        let mut guard = self.entries.write().await;
        guard.insert(
            key.to_string(),
            CachedEntry {
                fetched_at: Instant::now(),
                value,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

pub struct MemoryPriceCache {
    inner: TtlCache<f64>,
}

impl MemoryPriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl PriceCache for MemoryPriceCache {
    async fn get(&self, key: &str) -> Option<f64> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: f64) {
        self.inner.insert(key, value).await;
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Shared cache for multi-instance deployments; redis expiry enforces the TTL.
pub struct RedisPriceCache {
    conn: redis::aio::ConnectionManager,
    ttl_secs: u64,
}

const REDIS_KEY_PREFIX: &str = "price:";

impl RedisPriceCache {
    pub async fn connect(url: &str, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            ttl_secs: ttl.as_secs().max(1),
        })
    }
}

#[async_trait]
impl PriceCache for RedisPriceCache {
    async fn get(&self, key: &str) -> Option<f64> {
        let mut conn = self.conn.clone();
        let full_key = format!("{}{}", REDIS_KEY_PREFIX, key);
        match conn.get::<_, Option<String>>(&full_key).await {
            Ok(value) => value.and_then(|raw| raw.parse::<f64>().ok()),
            Err(err) => {
                tracing::warn!("price cache read failed for {}: {}", key, err);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: f64) {
        let mut conn = self.conn.clone();
        let full_key = format!("{}{}", REDIS_KEY_PREFIX, key);
        if let Err(err) = conn
            .set_ex::<_, _, ()>(&full_key, value.to_string(), self.ttl_secs)
            .await
        {
            tracing::warn!("price cache write failed for {}: {}", key, err);
        }
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// Picks redis when `REDIS_URL` is set and reachable, else the in-process map.
pub async fn build_price_cache(config: &Config) -> Arc<dyn PriceCache> {
    let ttl = config.price_cache_ttl();
    if let Some(url) = config.redis_url.as_deref() {
        match RedisPriceCache::connect(url, ttl).await {
            Ok(cache) => {
                tracing::info!("Price cache backend: redis");
                return Arc::new(cache);
            }
            Err(err) => {
                tracing::warn!("Redis unavailable ({}); using in-memory price cache", err);
            }
        }
    }
    Arc::new(MemoryPriceCache::new(ttl))
}
