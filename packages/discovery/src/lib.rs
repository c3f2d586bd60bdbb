//! Room Discovery & Access Control
//!
//! Search over room listings by budget, radius and map viewport, the 24 hour
//! early-access rule that hides contact details of new listings from
//! non-entitled viewers, and cached, rate-limited geocoding that places
//! listings on the map at creation time.
//!
//! # Usage
//!
//! ```rust,ignore
//! use discovery::{AccessGate, ListingCatalog, MemoryListingStore, RequesterContext, SystemClock};
//!
//! let clock = Arc::new(SystemClock);
//! let catalog = ListingCatalog::new(Arc::new(MemoryListingStore::new()), clock.clone());
//! let gate = AccessGate::new(catalog, clock);
//!
//! // Anonymous viewers get redacted views of listings younger than 24 hours
//! let views = gate.by_budget(500, Some(800), &RequesterContext::anonymous()).await?;
//! ```
//!
//! # Modules
//!
//! - [`types`] - Listings, requester context, outgoing views
//! - [`geo`] - Pure radius and bounding-box predicates
//! - [`catalog`] - Validated listing queries and owner-checked mutations
//! - [`policy`] - Early-access visibility rules
//! - [`gate`] - Applies the policy to reads and search results
//! - [`geocoding`] - Nominatim client, throttle and cached resolver
//! - [`ingest`] - Listing creation with geocoding
//! - [`stores`] - Memory and PostgreSQL backends
//! - [`testing`] - Mock implementations for testing

pub mod catalog;
pub mod error;
pub mod gate;
pub mod geo;
pub mod geocoding;
pub mod ingest;
pub mod policy;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

pub use catalog::ListingCatalog;
pub use error::{CacheError, DiscoveryError, GeocodeError, Result};
pub use gate::{AccessGate, GateOutcome};
pub use geo::{BoundingBox, DEFAULT_RADIUS_KM};
pub use geocoding::{
    GeoResolver, GeoResolverConfig, GeocodeProviderExt, NominatimConfig, NominatimProvider,
    ThrottledProvider,
};
pub use ingest::{IngestReport, ListingIngestor};
pub use policy::{VisibilityDecision, EARLY_ACCESS_WINDOW};
pub use traits::{Clock, GeocodeCache, GeocodeProvider, ListingStore, SystemClock};
pub use types::{
    Address, CachedGeocode, GeoPoint, GeocodeOutcome, Listing, ListingId, ListingSource,
    ListingStatus, ListingUpdate, ListingView, NewListing, RequesterContext, UserId,
};

pub use stores::{MemoryGeocodeCache, MemoryListingStore};

#[cfg(feature = "postgres")]
pub use stores::{PostgresGeocodeCache, PostgresListingStore};
