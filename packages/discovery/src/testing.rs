//! Testing utilities including mock implementations.
//!
//! Lets applications built on this library exercise geocoding and visibility
//! rules without network access or real waiting.

use async_trait::async_trait;
use chrono::{DateTime, Duration as TimeDelta, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use crate::error::{CacheError, CacheResult, DiscoveryError, GeocodeError, ProviderResult, Result};
use crate::geo::BoundingBox;
use crate::traits::{Clock, GeocodeCache, GeocodeProvider, ListingStore};
use crate::types::{
    Address, CachedGeocode, GeoPoint, Listing, ListingId, ListingSource, ListingStatus, UserId,
};

/// A manually driven clock.
///
/// `sleep` returns immediately, records the requested duration and moves the
/// clock forward by it.
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl Default for MockClock {
    fn default() -> Self {
        Self::at(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }
}

impl MockClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().unwrap() += by;
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        if let Ok(delta) = TimeDelta::from_std(duration) {
            self.advance(delta);
        }
        tokio::task::yield_now().await;
    }
}

/// A geocoding provider with canned answers.
///
/// Unknown queries answer "no match". Queries registered with
/// [`with_failure`](Self::with_failure) answer with a provider error.
#[derive(Default)]
pub struct MockGeocodeProvider {
    points: RwLock<HashMap<String, GeoPoint>>,
    failures: RwLock<HashSet<String>>,
    latency: Option<Duration>,

    /// Call tracking for assertions
    calls: RwLock<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockGeocodeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_point(self, query: impl Into<String>, point: GeoPoint) -> Self {
        self.set_point(query, point);
        self
    }

    pub fn with_failure(self, query: impl Into<String>) -> Self {
        self.failures.write().unwrap().insert(query.into());
        self
    }

    /// Hold each lookup open for `latency` of real time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Register or replace an answer after construction; clears any failure
    /// registered for the same query.
    pub fn set_point(&self, query: impl Into<String>, point: GeoPoint) {
        let query = query.into();
        self.failures.write().unwrap().remove(&query);
        self.points.write().unwrap().insert(query, point);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Highest number of lookups observed running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodeProvider for MockGeocodeProvider {
    async fn lookup(&self, query: &str) -> ProviderResult<Option<GeoPoint>> {
        self.calls.write().unwrap().push(query.to_string());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failures.read().unwrap().contains(query) {
            return Err(GeocodeError::Status(503));
        }
        Ok(self.points.read().unwrap().get(query).copied())
    }
}

fn unavailable(what: &str) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("{} unavailable", what),
    ))
}

/// A cache whose every operation fails.
pub struct FailingGeocodeCache;

#[async_trait]
impl GeocodeCache for FailingGeocodeCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<CachedGeocode>> {
        Err(CacheError(unavailable("cache")))
    }

    async fn put(&self, _key: &str, _entry: CachedGeocode) -> CacheResult<()> {
        Err(CacheError(unavailable("cache")))
    }

    async fn remove(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError(unavailable("cache")))
    }
}

/// A listing store whose every operation fails with a storage error.
pub struct FailingListingStore;

#[async_trait]
impl ListingStore for FailingListingStore {
    async fn find_by_budget(&self, _min: i64, _max: Option<i64>) -> Result<Vec<Listing>> {
        Err(DiscoveryError::Storage(unavailable("store")))
    }

    async fn find_nearby(&self, _center: GeoPoint, _radius_km: f64) -> Result<Vec<Listing>> {
        Err(DiscoveryError::Storage(unavailable("store")))
    }

    async fn find_within_bounds(&self, _bbox: BoundingBox) -> Result<Vec<Listing>> {
        Err(DiscoveryError::Storage(unavailable("store")))
    }

    async fn find_by_owner(&self, _owner_id: UserId) -> Result<Vec<Listing>> {
        Err(DiscoveryError::Storage(unavailable("store")))
    }

    async fn find_by_id(&self, _id: ListingId) -> Result<Option<Listing>> {
        Err(DiscoveryError::Storage(unavailable("store")))
    }

    async fn insert(&self, _listing: &Listing) -> Result<()> {
        Err(DiscoveryError::Storage(unavailable("store")))
    }

    async fn replace(&self, _listing: &Listing) -> Result<bool> {
        Err(DiscoveryError::Storage(unavailable("store")))
    }

    async fn delete(&self, _id: ListingId) -> Result<bool> {
        Err(DiscoveryError::Storage(unavailable("store")))
    }
}

/// A fully populated scraped listing for tests to override field by field.
///
/// ```rust,ignore
/// let cheap = Listing { budget: 300, ..sample_listing() };
/// ```
pub fn sample_listing() -> Listing {
    Listing {
        id: ListingId::new(),
        title: "Bright room in a shared flat".to_string(),
        description: "Furnished, 18 m², two flatmates".to_string(),
        budget: 550,
        location: Some(GeoPoint::new(13.4050, 52.5200)),
        address: Address {
            street: Some("Hauptstr. 5".to_string()),
            city: Some("Berlin".to_string()),
            postal_code: Some("10115".to_string()),
            country: Some("DE".to_string()),
        },
        images: vec!["https://img.example.com/room-1.jpg".to_string()],
        source: ListingSource::Scraped,
        owner_id: Some(UserId::new()),
        contact_email: Some("landlord@example.com".to_string()),
        contact_phone: Some("+49 30 1234567".to_string()),
        source_url: Some("https://listings.example.com/ad/42".to_string()),
        status: ListingStatus::Active,
        created_at: None,
    }
}
