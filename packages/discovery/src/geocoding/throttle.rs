//! Provider wrapper that respects the upstream request-rate ceiling.
//!
//! Every lookup waits a fixed delay and holds a lock for the duration of the
//! call, so at most one external request is in flight and consecutive
//! requests are spaced by at least the delay. Only cache misses reach a
//! provider, so cached addresses never pay it.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::trace;

use crate::error::ProviderResult;
use crate::traits::{Clock, GeocodeProvider};
use crate::types::GeoPoint;

/// Nominatim's public instance allows one request per second.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);

/// Serializes lookups through `inner`.
///
/// The lock is held across the delay and the call itself, so with N misses
/// queued the last caller waits up to N times (delay + provider timeout).
/// Only listing creation and address changes queue here; reads never do.
pub struct ThrottledProvider<P: GeocodeProvider> {
    inner: P,
    clock: Arc<dyn Clock>,
    min_delay: Duration,
    in_flight: Mutex<()>,
}

impl<P: GeocodeProvider> ThrottledProvider<P> {
    pub fn new(inner: P, clock: Arc<dyn Clock>, min_delay: Duration) -> Self {
        Self {
            inner,
            clock,
            min_delay,
            in_flight: Mutex::new(()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: GeocodeProvider> GeocodeProvider for ThrottledProvider<P> {
    async fn lookup(&self, query: &str) -> ProviderResult<Option<GeoPoint>> {
        let _permit = self.in_flight.lock().await;

        trace!(delay_ms = self.min_delay.as_millis() as u64, "Throttling geocoder request");
        self.clock.sleep(self.min_delay).await;

        self.inner.lookup(query).await
    }
}

/// Extension trait for wrapping any provider.
pub trait GeocodeProviderExt: GeocodeProvider + Sized {
    fn throttled(self, clock: Arc<dyn Clock>, min_delay: Duration) -> ThrottledProvider<Self> {
        ThrottledProvider::new(self, clock, min_delay)
    }
}

impl<P: GeocodeProvider + Sized> GeocodeProviderExt for P {}
