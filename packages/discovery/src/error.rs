//! Typed errors for the discovery library.
//!
//! Uses `thiserror` so the server can map each variant to a response
//! without string matching.

use thiserror::Error;

use crate::types::ListingId;

/// Errors surfaced by listing queries, the access gate and ingestion.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Malformed filter parameters or an invalid listing payload
    #[error("invalid request: {reason}")]
    Validation { reason: String },

    /// The requested listing does not exist
    #[error("listing not found: {id}")]
    ListingNotFound { id: ListingId },

    /// The requester may not modify this listing
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    /// Storage backend failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DiscoveryError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }

    /// True when the error means "no such listing" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ListingNotFound { .. })
    }
}

/// Failures talking to the external geocoding provider.
///
/// These never escape [`GeoResolver::resolve`](crate::GeoResolver::resolve);
/// the resolver logs them and answers `NotFound`.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Request could not be sent or the connection failed
    #[error("geocoder request failed: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Provider did not answer within the bounded timeout
    #[error("geocoder timed out")]
    Timeout,

    /// Provider answered with a non-success status
    #[error("geocoder returned HTTP {0}")]
    Status(u16),

    /// Response body could not be decoded into coordinates
    #[error("geocoder response could not be decoded: {0}")]
    Decode(String),
}

/// Errors from a geocode cache backend.
#[derive(Debug, Error)]
#[error("geocode cache error: {0}")]
pub struct CacheError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Result type alias for provider lookups.
pub type ProviderResult<T> = std::result::Result<T, GeocodeError>;

/// Result type alias for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
