//! PostgreSQL store and geocode cache against a real database.
//!
//! Requires Docker. Results are cross-checked against the memory store so
//! both backends answer the same queries identically.

mod common;

use std::sync::Arc;

use chrono::{Duration as TimeDelta, TimeZone, Utc};
use common::TestHarness;
use discovery::testing::{sample_listing, MockClock, MockGeocodeProvider};
use discovery::{
    BoundingBox, CachedGeocode, GeoPoint, GeoResolver, GeoResolverConfig, GeocodeCache,
    GeocodeOutcome, Listing, ListingId, ListingStatus, ListingStore, MemoryListingStore,
    PostgresGeocodeCache, PostgresListingStore, UserId,
};
use test_context::test_context;

fn spread_listings() -> Vec<Listing> {
    let created = Utc.with_ymd_and_hms(2024, 5, 30, 8, 0, 0).unwrap();
    let points = [
        Some(GeoPoint::new(13.4050, 52.5200)),
        Some(GeoPoint::new(13.4490, 52.5200)),
        Some(GeoPoint::new(13.5230, 52.5200)),
        Some(GeoPoint::new(11.5820, 48.1351)),
        None,
    ];

    points
        .into_iter()
        .enumerate()
        .map(|(i, location)| Listing {
            budget: 400 + 100 * i as i64,
            location,
            created_at: Some(created),
            ..sample_listing()
        })
        .collect()
}

async fn seeded(ctx: &TestHarness) -> (PostgresListingStore, MemoryListingStore) {
    let listings = spread_listings();
    let postgres = PostgresListingStore::new(ctx.db_pool.clone());
    for listing in &listings {
        postgres.insert(listing).await.expect("insert failed");
    }
    (postgres, MemoryListingStore::with_listings(listings))
}

fn ids(listings: &[Listing]) -> Vec<ListingId> {
    let mut ids: Vec<ListingId> = listings.iter().map(|l| l.id).collect();
    ids.sort();
    ids
}

// =============================================================================
// Listings
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_insert_and_find_round_trips_every_field(ctx: &TestHarness) {
    let store = PostgresListingStore::new(ctx.db_pool.clone());
    let listing = Listing {
        created_at: Some(Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()),
        images: vec!["a.jpg".into(), "b.jpg".into()],
        ..sample_listing()
    };

    store.insert(&listing).await.unwrap();

    let found = store.find_by_id(listing.id).await.unwrap();
    assert_eq!(found, Some(listing));
    assert!(store.find_by_id(ListingId::new()).await.unwrap().is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_listing_without_point_or_creation_time(ctx: &TestHarness) {
    let store = PostgresListingStore::new(ctx.db_pool.clone());
    let listing = Listing {
        location: None,
        created_at: None,
        owner_id: None,
        ..sample_listing()
    };

    store.insert(&listing).await.unwrap();
    assert_eq!(store.find_by_id(listing.id).await.unwrap(), Some(listing));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_replace_and_delete_report_existence(ctx: &TestHarness) {
    let store = PostgresListingStore::new(ctx.db_pool.clone());
    let mut listing = sample_listing();
    store.insert(&listing).await.unwrap();

    listing.budget = 720;
    listing.status = ListingStatus::Rented;
    assert!(store.replace(&listing).await.unwrap());
    assert_eq!(store.find_by_id(listing.id).await.unwrap(), Some(listing.clone()));

    assert!(!store.replace(&sample_listing()).await.unwrap());

    assert!(store.delete(listing.id).await.unwrap());
    assert!(!store.delete(listing.id).await.unwrap());
    assert!(store.find_by_id(listing.id).await.unwrap().is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_budget_matches_memory_store(ctx: &TestHarness) {
    let (postgres, memory) = seeded(ctx).await;

    for (min, max) in [(500, Some(700)), (0, None), (650, None), (900, Some(100)), (400, Some(400))] {
        let expected = memory.find_by_budget(min, max).await.unwrap();
        let actual = postgres.find_by_budget(min, max).await.unwrap();
        assert_eq!(ids(&actual), ids(&expected), "budget {}..{:?}", min, max);
    }

    let in_range = postgres.find_by_budget(500, Some(700)).await.unwrap();
    assert_eq!(in_range.len(), 3);
    assert!(in_range.iter().all(|l| (500..=700).contains(&l.budget)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_nearby_matches_memory_store(ctx: &TestHarness) {
    let (postgres, memory) = seeded(ctx).await;
    let center = GeoPoint::new(13.4050, 52.5200);

    for radius in [0.0, 1.0, 5.0, 10.0, 600.0] {
        let expected = memory.find_nearby(center, radius).await.unwrap();
        let actual = postgres.find_nearby(center, radius).await.unwrap();
        assert_eq!(ids(&actual), ids(&expected), "radius {}", radius);
    }

    // Pointless listings never show up, however wide the radius
    let everything = postgres.find_nearby(center, 20_000.0).await.unwrap();
    assert_eq!(everything.len(), 4);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_bounds_matches_memory_store(ctx: &TestHarness) {
    let (postgres, memory) = seeded(ctx).await;

    let boxes = [
        BoundingBox::new(13.0, 52.0, 13.5, 53.0),
        BoundingBox::new(5.0, 47.0, 15.0, 55.0),
        BoundingBox::new(13.4050, 52.5200, 13.4050, 52.5200),
        BoundingBox::new(0.0, 0.0, 1.0, 1.0),
    ];

    for bbox in boxes {
        let expected = memory.find_within_bounds(bbox).await.unwrap();
        let actual = postgres.find_within_bounds(bbox).await.unwrap();
        assert_eq!(ids(&actual), ids(&expected), "{:?}", bbox);
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_find_by_owner(ctx: &TestHarness) {
    let store = PostgresListingStore::new(ctx.db_pool.clone());
    let owner = UserId::new();

    let mine = [
        Listing { owner_id: Some(owner), ..sample_listing() },
        Listing { owner_id: Some(owner), ..sample_listing() },
    ];
    for listing in mine.iter().chain([&sample_listing()]) {
        store.insert(listing).await.unwrap();
    }

    let found = store.find_by_owner(owner).await.unwrap();
    assert_eq!(ids(&found), ids(&mine));
    assert!(store.find_by_owner(UserId::new()).await.unwrap().is_empty());
}

// =============================================================================
// Geocode cache
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_cache_stores_positive_and_negative_outcomes(ctx: &TestHarness) {
    let cache = PostgresGeocodeCache::new(ctx.db_pool.clone());
    let expires_at = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();

    let found = CachedGeocode {
        outcome: GeocodeOutcome::Found(GeoPoint::new(13.4, 52.5)),
        expires_at,
    };
    let missing = CachedGeocode {
        outcome: GeocodeOutcome::NotFound,
        expires_at,
    };

    cache.put("geocode:a", found).await.unwrap();
    cache.put("geocode:b", missing).await.unwrap();

    assert_eq!(cache.get("geocode:a").await.unwrap(), Some(found));
    assert_eq!(cache.get("geocode:b").await.unwrap(), Some(missing));
    assert_eq!(cache.get("geocode:c").await.unwrap(), None);

    cache.remove("geocode:a").await.unwrap();
    assert_eq!(cache.get("geocode:a").await.unwrap(), None);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_cache_put_overwrites(ctx: &TestHarness) {
    let cache = PostgresGeocodeCache::new(ctx.db_pool.clone());
    let first = CachedGeocode {
        outcome: GeocodeOutcome::NotFound,
        expires_at: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
    };
    let second = CachedGeocode {
        outcome: GeocodeOutcome::Found(GeoPoint::new(11.58, 48.14)),
        expires_at: Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
    };

    cache.put("geocode:k", first).await.unwrap();
    cache.put("geocode:k", second).await.unwrap();

    assert_eq!(cache.get("geocode:k").await.unwrap(), Some(second));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_purge_removes_only_expired_rows(ctx: &TestHarness) {
    let cache = PostgresGeocodeCache::new(ctx.db_pool.clone());
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

    for (key, expires_at) in [
        ("geocode:old", now - TimeDelta::days(1)),
        ("geocode:edge", now),
        ("geocode:live", now + TimeDelta::days(1)),
    ] {
        cache
            .put(key, CachedGeocode { outcome: GeocodeOutcome::NotFound, expires_at })
            .await
            .unwrap();
    }

    assert_eq!(cache.purge_expired(now).await.unwrap(), 2);
    assert!(cache.get("geocode:old").await.unwrap().is_none());
    assert!(cache.get("geocode:edge").await.unwrap().is_none());
    assert!(cache.get("geocode:live").await.unwrap().is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_resolver_over_postgres_cache(ctx: &TestHarness) {
    let point = GeoPoint::new(13.41, 52.53);
    let provider = Arc::new(MockGeocodeProvider::new().with_point("torstr. 1, berlin", point));
    let clock = Arc::new(MockClock::default());
    let resolver = GeoResolver::new(
        provider.clone(),
        Arc::new(PostgresGeocodeCache::new(ctx.db_pool.clone())),
        clock.clone(),
        GeoResolverConfig::default(),
    );

    assert_eq!(resolver.resolve("Torstr. 1, Berlin").await, GeocodeOutcome::Found(point));
    assert_eq!(resolver.resolve("  TORSTR. 1,  berlin").await, GeocodeOutcome::Found(point));
    assert_eq!(resolver.resolve("Nowhere 9").await, GeocodeOutcome::NotFound);
    assert_eq!(resolver.resolve("nowhere 9").await, GeocodeOutcome::NotFound);
    assert_eq!(provider.call_count(), 2);

    // Entries outlive a restart of the resolver
    let restarted = GeoResolver::new(
        provider.clone(),
        Arc::new(PostgresGeocodeCache::new(ctx.db_pool.clone())),
        clock.clone(),
        GeoResolverConfig::default(),
    );
    assert_eq!(restarted.resolve("torstr. 1, berlin").await, GeocodeOutcome::Found(point));
    assert_eq!(provider.call_count(), 2);

    clock.advance(TimeDelta::days(31));
    restarted.resolve("torstr. 1, berlin").await;
    assert_eq!(provider.call_count(), 3);
}
