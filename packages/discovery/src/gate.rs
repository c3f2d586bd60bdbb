//! Read path for listings.
//!
//! [`AccessGate`] fetches through the [`ListingCatalog`], runs the
//! visibility rules for the requester and returns either the full view or
//! the redacted one. Search results go through the same gate one listing at a
//! time, so a restricted listing never leaks contact details via search.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::catalog::ListingCatalog;
use crate::error::Result;
use crate::policy;
use crate::traits::Clock;
use crate::types::{Listing, ListingId, ListingView, RequesterContext, UserId};

/// Result of a single-listing read.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// The request named no listing; nothing to guard
    PassThrough,
    Listing(ListingView),
}

#[derive(Clone)]
pub struct AccessGate {
    catalog: ListingCatalog,
    clock: Arc<dyn Clock>,
}

impl AccessGate {
    pub fn new(catalog: ListingCatalog, clock: Arc<dyn Clock>) -> Self {
        Self { catalog, clock }
    }

    pub fn catalog(&self) -> &ListingCatalog {
        &self.catalog
    }

    /// Read one listing for `requester`.
    ///
    /// Fails with `ListingNotFound` when the id is unknown.
    #[instrument(skip(self, requester), fields(user_id = ?requester.user_id))]
    pub async fn read(
        &self,
        id: Option<ListingId>,
        requester: &RequesterContext,
    ) -> Result<GateOutcome> {
        let Some(id) = id else {
            return Ok(GateOutcome::PassThrough);
        };

        let listing = self.catalog.by_id(id).await?;
        Ok(GateOutcome::Listing(self.present(listing, requester)))
    }

    /// Apply the visibility decision to one listing.
    pub fn present(&self, listing: Listing, requester: &RequesterContext) -> ListingView {
        present_at(listing, requester, self.clock.now())
    }

    /// Apply visibility decisions to a result set, judged at a single instant.
    pub fn present_all(&self, listings: Vec<Listing>, requester: &RequesterContext) -> Vec<ListingView> {
        let now = self.clock.now();
        listings
            .into_iter()
            .map(|listing| present_at(listing, requester, now))
            .collect()
    }

    pub async fn by_budget(
        &self,
        min: i64,
        max: Option<i64>,
        requester: &RequesterContext,
    ) -> Result<Vec<ListingView>> {
        let listings = self.catalog.by_budget(min, max).await?;
        Ok(self.present_all(listings, requester))
    }

    pub async fn nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_km: Option<f64>,
        requester: &RequesterContext,
    ) -> Result<Vec<ListingView>> {
        let listings = self.catalog.nearby(lat, lon, radius_km).await?;
        Ok(self.present_all(listings, requester))
    }

    pub async fn within_bounds(
        &self,
        sw_lon: f64,
        sw_lat: f64,
        ne_lon: f64,
        ne_lat: f64,
        requester: &RequesterContext,
    ) -> Result<Vec<ListingView>> {
        let listings = self
            .catalog
            .within_bounds(sw_lon, sw_lat, ne_lon, ne_lat)
            .await?;
        Ok(self.present_all(listings, requester))
    }

    pub async fn by_owner(
        &self,
        owner_id: UserId,
        requester: &RequesterContext,
    ) -> Result<Vec<ListingView>> {
        let listings = self.catalog.by_owner(owner_id).await?;
        Ok(self.present_all(listings, requester))
    }
}

fn present_at(
    listing: Listing,
    requester: &RequesterContext,
    now: chrono::DateTime<chrono::Utc>,
) -> ListingView {
    let decision = policy::decide(&listing, requester, now);
    debug!(
        listing_id = %listing.id,
        restricted = decision.restricted,
        rule = decision.rule,
        "Visibility decided"
    );

    if decision.restricted {
        ListingView::redacted(listing)
    } else {
        ListingView::full(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryListingStore;
    use crate::testing::{sample_listing, MockClock};
    use crate::types::GeoPoint;
    use chrono::Duration as TimeDelta;

    fn gate_with(listings: Vec<Listing>) -> (AccessGate, Arc<MockClock>) {
        let clock = Arc::new(MockClock::default());
        let catalog = ListingCatalog::new(
            Arc::new(MemoryListingStore::with_listings(listings)),
            clock.clone(),
        );
        (AccessGate::new(catalog, clock.clone()), clock)
    }

    fn fresh_listing(clock: &MockClock) -> Listing {
        Listing {
            created_at: Some(clock.now()),
            ..sample_listing()
        }
    }

    fn view_of(outcome: GateOutcome) -> ListingView {
        match outcome {
            GateOutcome::Listing(view) => view,
            GateOutcome::PassThrough => panic!("expected a listing"),
        }
    }

    #[tokio::test]
    async fn test_restricted_json_has_no_owner_or_contact_keys() {
        let clock = MockClock::default();
        let listing = fresh_listing(&clock);
        let id = listing.id;
        let (gate, _) = gate_with(vec![listing.clone()]);

        let view = view_of(gate.read(Some(id), &RequesterContext::anonymous()).await.unwrap());
        assert!(view.restricted);

        let json = serde_json::to_value(&view).unwrap();
        let object = json.as_object().unwrap();
        for hidden in ["owner_id", "contact_email", "contact_phone", "source_url"] {
            assert!(!object.contains_key(hidden), "{} leaked", hidden);
        }
        assert_eq!(json["title"], listing.title);
        assert_eq!(json["budget"], listing.budget);
        assert_eq!(json["images"][0], listing.images[0]);
        assert_eq!(json["restricted"], true);
        assert!(json["address"]["street"].is_null());
        assert_eq!(json["address"]["city"], "Berlin");
    }

    #[tokio::test]
    async fn test_restricted_view_coarsens_location() {
        let clock = MockClock::default();
        let listing = Listing {
            location: Some(GeoPoint::new(13.404954, 52.520008)),
            ..fresh_listing(&clock)
        };
        let (gate, _) = gate_with(vec![listing.clone()]);

        let view = view_of(gate.read(Some(listing.id), &RequesterContext::anonymous()).await.unwrap());
        assert_eq!(view.location, Some(GeoPoint::new(13.40, 52.52)));
    }

    #[tokio::test]
    async fn test_owner_gets_full_view() {
        let clock = MockClock::default();
        let listing = fresh_listing(&clock);
        let owner = RequesterContext::user(listing.owner_id.unwrap());
        let (gate, _) = gate_with(vec![listing.clone()]);

        let view = view_of(gate.read(Some(listing.id), &owner).await.unwrap());
        assert!(!view.restricted);
        assert_eq!(view, ListingView::full(listing));
    }

    #[tokio::test]
    async fn test_restriction_lifts_as_time_passes() {
        let clock = MockClock::default();
        let listing = fresh_listing(&clock);
        let (gate, gate_clock) = gate_with(vec![listing.clone()]);
        let anonymous = RequesterContext::anonymous();

        assert!(view_of(gate.read(Some(listing.id), &anonymous).await.unwrap()).restricted);

        gate_clock.advance(TimeDelta::hours(25));
        let view = view_of(gate.read(Some(listing.id), &anonymous).await.unwrap());
        assert!(!view.restricted);
        assert_eq!(view.contact_email, listing.contact_email);
    }

    #[tokio::test]
    async fn test_missing_id_passes_through() {
        let (gate, _) = gate_with(vec![]);
        let outcome = gate.read(None, &RequesterContext::anonymous()).await.unwrap();
        assert_eq!(outcome, GateOutcome::PassThrough);
    }

    #[tokio::test]
    async fn test_unknown_listing_is_not_found() {
        let (gate, _) = gate_with(vec![]);
        let err = gate
            .read(Some(ListingId::new()), &RequesterContext::anonymous())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_search_results_are_gated_per_listing() {
        let clock = MockClock::default();
        let fresh = Listing {
            budget: 600,
            ..fresh_listing(&clock)
        };
        let old = Listing {
            budget: 700,
            created_at: Some(clock.now() - TimeDelta::days(3)),
            ..sample_listing()
        };
        let (gate, _) = gate_with(vec![fresh.clone(), old.clone()]);

        let views = gate
            .by_budget(500, Some(800), &RequesterContext::anonymous())
            .await
            .unwrap();
        assert_eq!(views.len(), 2);

        let fresh_view = views.iter().find(|v| v.id == fresh.id).unwrap();
        let old_view = views.iter().find(|v| v.id == old.id).unwrap();
        assert!(fresh_view.restricted && fresh_view.owner_id.is_none());
        assert!(!old_view.restricted && old_view.owner_id == old.owner_id);
    }
}
