//! Address-to-coordinate resolution.
//!
//! Layers, outermost first:
//!
//! - [`GeoResolver`]: normalization, cache lookup, TTL and negative caching
//! - [`ThrottledProvider`]: one request in flight, fixed delay per request
//! - [`NominatimProvider`]: the HTTP client
//!
//! ```rust,ignore
//! use discovery::geocoding::*;
//!
//! let provider = NominatimProvider::new(NominatimConfig::default())?
//!     .throttled(clock.clone(), DEFAULT_MIN_DELAY);
//! let resolver = GeoResolver::new(Arc::new(provider), cache, clock, GeoResolverConfig::default());
//! ```

pub mod key;
pub mod nominatim;
pub mod resolver;
pub mod throttle;

pub use key::{cache_key, normalize_address};
pub use nominatim::{NominatimConfig, NominatimProvider};
pub use resolver::{GeoResolver, GeoResolverConfig, DEFAULT_CACHE_TTL_DAYS};
pub use throttle::{GeocodeProviderExt, ThrottledProvider, DEFAULT_MIN_DELAY};
