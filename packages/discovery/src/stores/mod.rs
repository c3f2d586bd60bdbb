//! Storage implementations for listings and geocode outcomes.
//!
//! Available backends:
//! - `MemoryListingStore` / `MemoryGeocodeCache` - in-memory (always available)
//! - `PostgresListingStore` / `PostgresGeocodeCache` - PostgreSQL (requires `postgres` feature)

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{MemoryGeocodeCache, MemoryListingStore};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresGeocodeCache, PostgresListingStore};
