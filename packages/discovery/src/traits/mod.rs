//! Infrastructure traits.
//!
//! These carry no business rules; the catalog, gate and resolver are written
//! against them so backends can be swapped and mocked.

pub mod cache;
pub mod clock;
pub mod geocoder;
pub mod store;

pub use cache::GeocodeCache;
pub use clock::{Clock, SystemClock};
pub use geocoder::GeocodeProvider;
pub use store::ListingStore;
