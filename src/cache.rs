//! Caching wrapper for resolvers.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;

use moka::future::Cache;

use crate::host_spec::normalize_host;
use crate::resolver::Resolver;
use crate::Error;

/// Caches successful, non-empty lookups of an inner resolver for a fixed TTL.
///
/// Empty results and errors are never cached, so a host that starts
/// resolving is picked up on the next evaluation.
pub struct CachedResolver<R> {
    inner: R,
    cache: Cache<String, BTreeSet<IpAddr>>,
}

impl<R: Resolver> CachedResolver<R> {
    pub fn new(inner: R, capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait::async_trait]
impl<R: Resolver> Resolver for CachedResolver<R> {
    async fn resolve(&self, host: &str) -> Result<BTreeSet<IpAddr>, Error> {
        let key = normalize_host(host);
        if let Some(addrs) = self.cache.get(&key).await {
            tracing::debug!(host = %host, "resolver cache hit");
            return Ok(addrs);
        }

        let addrs = self.inner.resolve(host).await?;
        if !addrs.is_empty() {
            self.cache.insert(key, addrs.clone()).await;
        }
        Ok(addrs)
    }
}
