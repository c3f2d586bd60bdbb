//! Listing persistence abstraction.
//!
//! Geospatial methods take already-validated regions; parameter checking
//! lives in [`ListingCatalog`](crate::ListingCatalog).

use async_trait::async_trait;

use crate::error::Result;
use crate::geo::BoundingBox;
use crate::types::{GeoPoint, Listing, ListingId, UserId};

#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Listings with `min <= budget` and, when given, `budget <= max`.
    async fn find_by_budget(&self, min: i64, max: Option<i64>) -> Result<Vec<Listing>>;

    /// Listings whose point lies within `radius_km` of `center`.
    async fn find_nearby(&self, center: GeoPoint, radius_km: f64) -> Result<Vec<Listing>>;

    /// Listings whose point lies inside `bbox`.
    async fn find_within_bounds(&self, bbox: BoundingBox) -> Result<Vec<Listing>>;

    async fn find_by_owner(&self, owner_id: UserId) -> Result<Vec<Listing>>;

    /// `Ok(None)` when no listing has this id.
    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>>;

    async fn insert(&self, listing: &Listing) -> Result<()>;

    /// Replace a stored listing. Returns false when the id is unknown.
    async fn replace(&self, listing: &Listing) -> Result<bool>;

    /// Returns false when the id is unknown.
    async fn delete(&self, id: ListingId) -> Result<bool>;
}
