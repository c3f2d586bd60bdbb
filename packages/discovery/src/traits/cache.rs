//! Key/value cache for geocoding outcomes.

use async_trait::async_trait;

use crate::error::CacheResult;
use crate::types::CachedGeocode;

/// Cache of geocoding outcomes keyed by a hash of the normalized address.
///
/// Implementations store whatever they are given; expiry is judged by the
/// caller against [`CachedGeocode::expires_at`]. Concurrent writers to the
/// same key are last-write-wins.
#[async_trait]
pub trait GeocodeCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedGeocode>>;

    async fn put(&self, key: &str, entry: CachedGeocode) -> CacheResult<()>;

    async fn remove(&self, key: &str) -> CacheResult<()>;
}
