//! Listing queries and mutations with parameter validation.
//!
//! [`ListingCatalog`] sits between callers and a [`ListingStore`]: it checks
//! filter parameters, decides which inputs are errors and which simply match
//! nothing, and turns a missing row into [`DiscoveryError::ListingNotFound`].

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{DiscoveryError, Result};
use crate::geo::{BoundingBox, DEFAULT_RADIUS_KM};
use crate::traits::{Clock, ListingStore};
use crate::types::{GeoPoint, Listing, ListingId, ListingUpdate, NewListing, RequesterContext, UserId};

#[derive(Clone)]
pub struct ListingCatalog {
    store: Arc<dyn ListingStore>,
    clock: Arc<dyn Clock>,
}

impl ListingCatalog {
    pub fn new(store: Arc<dyn ListingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Listings with `min <= budget <= max`; `None` leaves the top open.
    ///
    /// Negative bounds are rejected. An inverted range matches nothing.
    #[instrument(skip(self))]
    pub async fn by_budget(&self, min: i64, max: Option<i64>) -> Result<Vec<Listing>> {
        if min < 0 {
            return Err(DiscoveryError::validation("budget_min must be >= 0"));
        }
        if let Some(max) = max {
            if max < 0 {
                return Err(DiscoveryError::validation("budget_max must be >= 0"));
            }
            if min > max {
                debug!("Inverted budget range, nothing can match");
                return Ok(Vec::new());
            }
        }

        self.store.find_by_budget(min, max).await
    }

    /// Listings within `radius_km` (default 5 km) of the given point.
    #[instrument(skip(self))]
    pub async fn nearby(&self, lat: f64, lon: f64, radius_km: Option<f64>) -> Result<Vec<Listing>> {
        let center = GeoPoint::new(lon, lat);
        center.validate()?;

        let radius_km = radius_km.unwrap_or(DEFAULT_RADIUS_KM);
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(DiscoveryError::validation(format!(
                "radius_km must be a non-negative number, got {}",
                radius_km
            )));
        }

        self.store.find_nearby(center, radius_km).await
    }

    /// Listings inside the viewport. A malformed viewport yields an empty
    /// result, never an error.
    #[instrument(skip(self))]
    pub async fn within_bounds(
        &self,
        sw_lon: f64,
        sw_lat: f64,
        ne_lon: f64,
        ne_lat: f64,
    ) -> Result<Vec<Listing>> {
        let bbox = BoundingBox::new(sw_lon, sw_lat, ne_lon, ne_lat);
        if !bbox.is_well_formed() {
            debug!("Malformed bounding box, returning no listings");
            return Ok(Vec::new());
        }

        self.store.find_within_bounds(bbox).await
    }

    pub async fn by_owner(&self, owner_id: UserId) -> Result<Vec<Listing>> {
        self.store.find_by_owner(owner_id).await
    }

    pub async fn by_id(&self, id: ListingId) -> Result<Listing> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(DiscoveryError::ListingNotFound { id })
    }

    /// Validate and store a new listing stamped with the current time.
    #[instrument(skip(self, new_listing), fields(title = %new_listing.title))]
    pub async fn create(&self, new_listing: NewListing) -> Result<Listing> {
        new_listing.validate()?;

        let listing = new_listing.into_listing(self.clock.now());
        self.store.insert(&listing).await?;

        info!(listing_id = %listing.id, source = %listing.source, "Listing created");
        Ok(listing)
    }

    /// Apply `update` to a listing owned by `requester`.
    #[instrument(skip(self, requester, update))]
    pub async fn update(
        &self,
        id: ListingId,
        requester: &RequesterContext,
        update: ListingUpdate,
    ) -> Result<Listing> {
        update.validate()?;

        let mut listing = self.owned_by(id, requester).await?;
        update.apply(&mut listing);

        if !self.store.replace(&listing).await? {
            // Deleted between the read and the write
            return Err(DiscoveryError::ListingNotFound { id });
        }

        info!(listing_id = %id, "Listing updated");
        Ok(listing)
    }

    #[instrument(skip(self, requester))]
    pub async fn delete(&self, id: ListingId, requester: &RequesterContext) -> Result<()> {
        self.owned_by(id, requester).await?;

        if !self.store.delete(id).await? {
            return Err(DiscoveryError::ListingNotFound { id });
        }

        info!(listing_id = %id, "Listing deleted");
        Ok(())
    }

    /// The listing, if `requester` owns it; `Forbidden` otherwise.
    pub async fn owned_by(&self, id: ListingId, requester: &RequesterContext) -> Result<Listing> {
        let listing = self.by_id(id).await?;
        if !requester.owns(&listing) {
            return Err(DiscoveryError::forbidden("only the owner may modify this listing"));
        }
        Ok(listing)
    }
}
