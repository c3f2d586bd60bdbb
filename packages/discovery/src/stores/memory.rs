//! In-memory storage for testing and development.
//!
//! Data is lost on restart. Geospatial queries scan every listing and apply
//! the predicates from [`crate::geo`] directly.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{CacheResult, Result};
use crate::geo::{within_radius, BoundingBox};
use crate::traits::{GeocodeCache, ListingStore};
use crate::types::{CachedGeocode, GeoPoint, Listing, ListingId, UserId};

#[derive(Default)]
pub struct MemoryListingStore {
    listings: RwLock<HashMap<ListingId, Listing>>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `listings`.
    pub fn with_listings(listings: impl IntoIterator<Item = Listing>) -> Self {
        Self {
            listings: RwLock::new(listings.into_iter().map(|l| (l.id, l)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }

    async fn filter<F>(&self, predicate: F) -> Vec<Listing>
    where
        F: Fn(&Listing) -> bool,
    {
        let mut matches: Vec<Listing> = self
            .listings
            .read()
            .await
            .values()
            .filter(|l| predicate(l))
            .cloned()
            .collect();

        // HashMap order is arbitrary; v7 ids sort by creation
        matches.sort_by_key(|l| l.id);
        matches
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn find_by_budget(&self, min: i64, max: Option<i64>) -> Result<Vec<Listing>> {
        Ok(self
            .filter(|l| l.budget >= min && max.map_or(true, |max| l.budget <= max))
            .await)
    }

    async fn find_nearby(&self, center: GeoPoint, radius_km: f64) -> Result<Vec<Listing>> {
        Ok(self
            .filter(|l| {
                l.location
                    .map_or(false, |point| within_radius(center, radius_km, point))
            })
            .await)
    }

    async fn find_within_bounds(&self, bbox: BoundingBox) -> Result<Vec<Listing>> {
        Ok(self
            .filter(|l| l.location.map_or(false, |point| bbox.contains(point)))
            .await)
    }

    async fn find_by_owner(&self, owner_id: UserId) -> Result<Vec<Listing>> {
        Ok(self.filter(|l| l.owner_id == Some(owner_id)).await)
    }

    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>> {
        Ok(self.listings.read().await.get(&id).cloned())
    }

    async fn insert(&self, listing: &Listing) -> Result<()> {
        self.listings
            .write()
            .await
            .insert(listing.id, listing.clone());
        Ok(())
    }

    async fn replace(&self, listing: &Listing) -> Result<bool> {
        let mut listings = self.listings.write().await;
        match listings.get_mut(&listing.id) {
            Some(existing) => {
                *existing = listing.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ListingId) -> Result<bool> {
        Ok(self.listings.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryGeocodeCache {
    entries: RwLock<HashMap<String, CachedGeocode>>,
}

impl MemoryGeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GeocodeCache for MemoryGeocodeCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedGeocode>> {
        Ok(self.entries.read().await.get(key).copied())
    }

    async fn put(&self, key: &str, entry: CachedGeocode) -> CacheResult<()> {
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
