//! External geocoding provider abstraction.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::types::GeoPoint;

/// A service that turns a free-text query into its single best match.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Look up `query`.
    ///
    /// `Ok(None)` means the provider answered but had no match; transport,
    /// status and decoding problems are reported as errors.
    async fn lookup(&self, query: &str) -> ProviderResult<Option<GeoPoint>>;
}
