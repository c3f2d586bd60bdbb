//! Cached address resolution.
//!
//! [`GeoResolver`] puts a TTL cache in front of a [`GeocodeProvider`]. The
//! provider is expected to arrive already wrapped in a
//! [`ThrottledProvider`](super::ThrottledProvider), which keeps the rate
//! limit a separate, independently testable layer.

use chrono::Duration as TimeDelta;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::key::{cache_key, normalize_address};
use crate::traits::{Clock, GeocodeCache, GeocodeProvider};
use crate::types::{CachedGeocode, GeocodeOutcome};

/// Street-level geocoding is effectively static, so entries live for days.
pub const DEFAULT_CACHE_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct GeoResolverConfig {
    /// Lifetime of positive and negative cache entries
    pub ttl: TimeDelta,
    /// Cache "not found" outcomes so an unresolvable address doesn't hit the
    /// provider on every call. Callers that need an immediate retry use
    /// [`GeoResolver::resolve_fresh`].
    pub cache_negative: bool,
}

impl Default for GeoResolverConfig {
    fn default() -> Self {
        Self {
            ttl: TimeDelta::days(DEFAULT_CACHE_TTL_DAYS),
            cache_negative: true,
        }
    }
}

pub struct GeoResolver {
    provider: Arc<dyn GeocodeProvider>,
    cache: Arc<dyn GeocodeCache>,
    clock: Arc<dyn Clock>,
    config: GeoResolverConfig,
}

impl GeoResolver {
    pub fn new(
        provider: Arc<dyn GeocodeProvider>,
        cache: Arc<dyn GeocodeCache>,
        clock: Arc<dyn Clock>,
        config: GeoResolverConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            clock,
            config,
        }
    }

    /// Resolve `address`, serving from cache when an unexpired entry exists.
    ///
    /// Never fails: provider and cache problems are logged and surface as
    /// `NotFound` or a cache miss respectively.
    #[instrument(skip(self))]
    pub async fn resolve(&self, address: &str) -> GeocodeOutcome {
        let normalized = normalize_address(address);
        if normalized.is_empty() {
            return GeocodeOutcome::NotFound;
        }
        let key = cache_key(&normalized);

        match self.cache.get(&key).await {
            Ok(Some(entry)) if entry.is_fresh(self.clock.now()) => {
                debug!(key = %key, found = entry.outcome.is_found(), "Geocode cache hit");
                return entry.outcome;
            }
            Ok(Some(_)) => debug!(key = %key, "Geocode cache entry expired"),
            Ok(None) => debug!(key = %key, "Geocode cache miss"),
            Err(e) => warn!(error = %e, key = %key, "Geocode cache read failed, treating as miss"),
        }

        self.lookup_and_store(&normalized, &key).await
    }

    /// Resolve `address` skipping the cache read. The outcome is still
    /// written back so later `resolve` calls see it.
    #[instrument(skip(self))]
    pub async fn resolve_fresh(&self, address: &str) -> GeocodeOutcome {
        let normalized = normalize_address(address);
        if normalized.is_empty() {
            return GeocodeOutcome::NotFound;
        }
        let key = cache_key(&normalized);

        self.lookup_and_store(&normalized, &key).await
    }

    async fn lookup_and_store(&self, normalized: &str, key: &str) -> GeocodeOutcome {
        let outcome = match self.provider.lookup(normalized).await {
            Ok(point) => GeocodeOutcome::from(point),
            Err(e) => {
                warn!(error = %e, address = %normalized, "Geocoding failed, answering not found");
                GeocodeOutcome::NotFound
            }
        };

        if !outcome.is_found() && !self.config.cache_negative {
            return outcome;
        }

        let entry = CachedGeocode {
            outcome,
            expires_at: self.clock.now() + self.config.ttl,
        };
        if let Err(e) = self.cache.put(key, entry).await {
            warn!(error = %e, key = %key, "Failed to write geocode cache entry");
        } else {
            info!(key = %key, found = outcome.is_found(), "Cached geocode outcome");
        }

        outcome
    }
}
