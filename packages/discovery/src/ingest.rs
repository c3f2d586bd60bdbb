//! Listing creation with geocoding.
//!
//! Both manual entries and scraped postings enter through
//! [`ListingIngestor`], which fills in coordinates from the address before
//! the listing is stored so it becomes geo-searchable.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::catalog::ListingCatalog;
use crate::error::{DiscoveryError, Result};
use crate::geocoding::GeoResolver;
use crate::types::{
    Address, GeoPoint, GeocodeOutcome, Listing, ListingId, ListingUpdate, NewListing,
    RequesterContext,
};

/// Per-batch tally from [`ListingIngestor::ingest_batch`].
#[derive(Debug, Default)]
pub struct IngestReport {
    pub created: Vec<Listing>,
    pub rejected: usize,
    pub ungeocoded: usize,
}

pub struct ListingIngestor {
    catalog: ListingCatalog,
    resolver: Arc<GeoResolver>,
}

impl ListingIngestor {
    pub fn new(catalog: ListingCatalog, resolver: Arc<GeoResolver>) -> Self {
        Self { catalog, resolver }
    }

    /// Geocode (if needed) and store one listing.
    ///
    /// An address that cannot be resolved leaves the point empty; the listing
    /// is still stored but won't match radius or viewport searches.
    #[instrument(skip(self, new_listing), fields(title = %new_listing.title, source = %new_listing.source))]
    pub async fn ingest(&self, mut new_listing: NewListing) -> Result<Listing> {
        new_listing.validate()?;

        if new_listing.location.is_none() {
            new_listing.location = self.locate(&new_listing.address).await;
        }

        self.catalog.create(new_listing).await
    }

    /// Owner update that keeps the point in step with the address.
    ///
    /// A new address without an explicit location is geocoded again; if it
    /// cannot be resolved the point is cleared rather than left at the old
    /// place.
    #[instrument(skip(self, requester, update))]
    pub async fn update(
        &self,
        id: ListingId,
        requester: &RequesterContext,
        mut update: ListingUpdate,
    ) -> Result<Listing> {
        update.validate()?;

        if update.needs_geocoding() {
            // Ownership first so strangers never reach the geocoder
            self.catalog.owned_by(id, requester).await?;
            let location = match &update.address {
                Some(address) => self.locate(address).await,
                None => None,
            };
            update.location = Some(location);
        }

        self.catalog.update(id, requester, update).await
    }

    async fn locate(&self, address: &Address) -> Option<GeoPoint> {
        let query = address.to_query()?;
        match self.resolver.resolve(&query).await {
            GeocodeOutcome::Found(point) => Some(point),
            GeocodeOutcome::NotFound => {
                warn!(address = %query, "Address not geocoded, listing will not be geo-searchable");
                None
            }
        }
    }

    /// Ingest a scraper batch. Invalid entries are logged and skipped.
    pub async fn ingest_batch(&self, batch: Vec<NewListing>) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for new_listing in batch {
            match self.ingest(new_listing).await {
                Ok(listing) => {
                    if listing.location.is_none() {
                        report.ungeocoded += 1;
                    }
                    report.created.push(listing);
                }
                Err(e @ DiscoveryError::Validation { .. }) => {
                    warn!(error = %e, "Skipping invalid listing");
                    report.rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            created = report.created.len(),
            rejected = report.rejected,
            ungeocoded = report.ungeocoded,
            "Ingested listing batch"
        );
        Ok(report)
    }
}
