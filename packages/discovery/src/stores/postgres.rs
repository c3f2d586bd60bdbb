//! PostgreSQL storage.
//!
//! Expects the `listings` and `geocode_cache` tables and the
//! `haversine_distance(lat1, lon1, lat2, lon2)` SQL function from the server
//! migrations. Geospatial filters run in SQL as a prefilter and the pure
//! predicates from [`crate::geo`] are re-applied to the rows, so results match
//! [`MemoryListingStore`](super::MemoryListingStore) exactly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgPool, Postgres};
use sqlx::query::QueryAs;
use sqlx::FromRow;
use tracing::{debug, instrument};

use crate::error::{CacheError, CacheResult, DiscoveryError, Result};
use crate::geo::{within_radius, BoundingBox};
use crate::traits::{GeocodeCache, ListingStore};
use crate::types::{
    Address, CachedGeocode, GeoPoint, GeocodeOutcome, Listing, ListingId, UserId,
};

/// Slack added to the SQL radius so floating-point differences between
/// Postgres and Rust never drop a boundary match before the exact check.
const RADIUS_SLACK_KM: f64 = 0.01;

const LISTING_COLUMNS: &str = "id, title, description, budget, longitude, latitude, \
     street, city, postal_code, country, images, source, owner_id, \
     contact_email, contact_phone, source_url, status, created_at";

#[derive(Debug, FromRow)]
struct ListingRow {
    id: ListingId,
    title: String,
    description: String,
    budget: i64,
    longitude: Option<f64>,
    latitude: Option<f64>,
    street: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    images: Vec<String>,
    source: String,
    owner_id: Option<UserId>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    source_url: Option<String>,
    status: String,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ListingRow> for Listing {
    type Error = DiscoveryError;

    fn try_from(row: ListingRow) -> Result<Self> {
        let location = match (row.longitude, row.latitude) {
            (Some(lon), Some(lat)) => Some(GeoPoint::new(lon, lat)),
            _ => None,
        };

        Ok(Listing {
            id: row.id,
            title: row.title,
            description: row.description,
            budget: row.budget,
            location,
            address: Address {
                street: row.street,
                city: row.city,
                postal_code: row.postal_code,
                country: row.country,
            },
            images: row.images,
            source: row.source.parse()?,
            owner_id: row.owner_id,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            source_url: row.source_url,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

type ListingQuery<'q> = QueryAs<'q, Postgres, ListingRow, PgArguments>;

fn into_listings(rows: Vec<ListingRow>) -> Result<Vec<Listing>> {
    rows.into_iter().map(Listing::try_from).collect()
}

/// Listing store over a shared connection pool.
#[derive(Clone)]
pub struct PostgresListingStore {
    pool: PgPool,
}

impl PostgresListingStore {
    /// Reuse the server's pool; migrations are the server's job.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, query: ListingQuery<'_>) -> Result<Vec<Listing>> {
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(DiscoveryError::storage)?;
        into_listings(rows)
    }
}

#[async_trait]
impl ListingStore for PostgresListingStore {
    #[instrument(skip(self))]
    async fn find_by_budget(&self, min: i64, max: Option<i64>) -> Result<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM listings
             WHERE budget >= $1 AND ($2::BIGINT IS NULL OR budget <= $2)
             ORDER BY id",
            LISTING_COLUMNS
        );
        self.fetch(sqlx::query_as(&sql).bind(min).bind(max)).await
    }

    #[instrument(skip(self))]
    async fn find_nearby(&self, center: GeoPoint, radius_km: f64) -> Result<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM listings
             WHERE latitude IS NOT NULL
               AND longitude IS NOT NULL
               AND haversine_distance($1, $2, latitude, longitude) <= $3
             ORDER BY id",
            LISTING_COLUMNS
        );
        let mut listings = self
            .fetch(
                sqlx::query_as(&sql)
                    .bind(center.lat)
                    .bind(center.lon)
                    .bind(radius_km + RADIUS_SLACK_KM),
            )
            .await?;

        let prefiltered = listings.len();
        listings.retain(|l| {
            l.location
                .map_or(false, |point| within_radius(center, radius_km, point))
        });
        debug!(prefiltered, matched = listings.len(), "Nearby query");

        Ok(listings)
    }

    #[instrument(skip(self))]
    async fn find_within_bounds(&self, bbox: BoundingBox) -> Result<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM listings
             WHERE longitude BETWEEN $1 AND $3
               AND latitude BETWEEN $2 AND $4
             ORDER BY id",
            LISTING_COLUMNS
        );
        let mut listings = self
            .fetch(
                sqlx::query_as(&sql)
                    .bind(bbox.sw.lon)
                    .bind(bbox.sw.lat)
                    .bind(bbox.ne.lon)
                    .bind(bbox.ne.lat),
            )
            .await?;

        listings.retain(|l| l.location.map_or(false, |point| bbox.contains(point)));
        Ok(listings)
    }

    async fn find_by_owner(&self, owner_id: UserId) -> Result<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM listings WHERE owner_id = $1 ORDER BY id",
            LISTING_COLUMNS
        );
        self.fetch(sqlx::query_as(&sql).bind(owner_id)).await
    }

    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>> {
        let sql = format!("SELECT {} FROM listings WHERE id = $1", LISTING_COLUMNS);
        let row: Option<ListingRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DiscoveryError::storage)?;

        row.map(Listing::try_from).transpose()
    }

    #[instrument(skip(self, listing), fields(listing_id = %listing.id))]
    async fn insert(&self, listing: &Listing) -> Result<()> {
        sqlx::query(
            "INSERT INTO listings (
                id, title, description, budget, longitude, latitude,
                street, city, postal_code, country, images, source, owner_id,
                contact_email, contact_phone, source_url, status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(listing.id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.budget)
        .bind(listing.location.map(|p| p.lon))
        .bind(listing.location.map(|p| p.lat))
        .bind(&listing.address.street)
        .bind(&listing.address.city)
        .bind(&listing.address.postal_code)
        .bind(&listing.address.country)
        .bind(&listing.images)
        .bind(listing.source.to_string())
        .bind(listing.owner_id)
        .bind(&listing.contact_email)
        .bind(&listing.contact_phone)
        .bind(&listing.source_url)
        .bind(listing.status.to_string())
        .bind(listing.created_at)
        .execute(&self.pool)
        .await
        .map_err(DiscoveryError::storage)?;

        Ok(())
    }

    #[instrument(skip(self, listing), fields(listing_id = %listing.id))]
    async fn replace(&self, listing: &Listing) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE listings SET
                title = $2, description = $3, budget = $4,
                longitude = $5, latitude = $6,
                street = $7, city = $8, postal_code = $9, country = $10,
                images = $11, source = $12, owner_id = $13,
                contact_email = $14, contact_phone = $15, source_url = $16,
                status = $17, created_at = $18,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(listing.id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.budget)
        .bind(listing.location.map(|p| p.lon))
        .bind(listing.location.map(|p| p.lat))
        .bind(&listing.address.street)
        .bind(&listing.address.city)
        .bind(&listing.address.postal_code)
        .bind(&listing.address.country)
        .bind(&listing.images)
        .bind(listing.source.to_string())
        .bind(listing.owner_id)
        .bind(&listing.contact_email)
        .bind(&listing.contact_phone)
        .bind(&listing.source_url)
        .bind(listing.status.to_string())
        .bind(listing.created_at)
        .execute(&self.pool)
        .await
        .map_err(DiscoveryError::storage)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ListingId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DiscoveryError::storage)?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, FromRow)]
struct CacheRow {
    longitude: Option<f64>,
    latitude: Option<f64>,
    expires_at: DateTime<Utc>,
}

/// Geocode cache backed by the `geocode_cache` table. A row with NULL
/// coordinates is a cached "not found".
#[derive(Clone)]
pub struct PostgresGeocodeCache {
    pool: PgPool,
}

impl PostgresGeocodeCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Drop rows whose expiry has passed. Returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> CacheResult<u64> {
        let result = sqlx::query("DELETE FROM geocode_cache WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError(Box::new(e)))?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl GeocodeCache for PostgresGeocodeCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedGeocode>> {
        let row: Option<CacheRow> = sqlx::query_as(
            "SELECT longitude, latitude, expires_at FROM geocode_cache WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CacheError(Box::new(e)))?;

        Ok(row.map(|row| {
            let point = match (row.longitude, row.latitude) {
                (Some(lon), Some(lat)) => Some(GeoPoint::new(lon, lat)),
                _ => None,
            };
            CachedGeocode {
                outcome: GeocodeOutcome::from(point),
                expires_at: row.expires_at,
            }
        }))
    }

    async fn put(&self, key: &str, entry: CachedGeocode) -> CacheResult<()> {
        let point = entry.outcome.point();
        sqlx::query(
            "INSERT INTO geocode_cache (key, longitude, latitude, expires_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (key) DO UPDATE SET
                longitude = EXCLUDED.longitude,
                latitude = EXCLUDED.latitude,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()",
        )
        .bind(key)
        .bind(point.map(|p| p.lon))
        .bind(point.map(|p| p.lat))
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError(Box::new(e)))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        sqlx::query("DELETE FROM geocode_cache WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError(Box::new(e)))?;

        Ok(())
    }
}
