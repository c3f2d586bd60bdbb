use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::coarsen_point;
use crate::types::{
    Address, GeoPoint, Listing, ListingId, ListingSource, ListingStatus, UserId,
};

/// Outgoing representation of a listing.
///
/// When `restricted` is set the owner and direct-contact fields are absent
/// from the serialized form, the street line is dropped and the point is
/// coarsened to roughly 1 km.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingView {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub budget: i64,
    pub location: Option<GeoPoint>,
    pub address: Address,
    pub images: Vec<String>,
    pub source: ListingSource,
    pub status: ListingStatus,
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Set when early access hid contact details; clients show an upsell.
    pub restricted: bool,
}

impl ListingView {
    pub fn full(listing: Listing) -> Self {
        Self {
            id: listing.id,
            title: listing.title,
            description: listing.description,
            budget: listing.budget,
            location: listing.location,
            address: listing.address,
            images: listing.images,
            source: listing.source,
            status: listing.status,
            created_at: listing.created_at,
            owner_id: listing.owner_id,
            contact_email: listing.contact_email,
            contact_phone: listing.contact_phone,
            source_url: listing.source_url,
            restricted: false,
        }
    }

    pub fn redacted(listing: Listing) -> Self {
        let address = Address {
            street: None,
            ..listing.address
        };

        Self {
            id: listing.id,
            title: listing.title,
            description: listing.description,
            budget: listing.budget,
            location: listing.location.map(coarsen_point),
            address,
            images: listing.images,
            source: listing.source,
            status: listing.status,
            created_at: listing.created_at,
            owner_id: None,
            contact_email: None,
            contact_phone: None,
            source_url: None,
            restricted: true,
        }
    }
}
