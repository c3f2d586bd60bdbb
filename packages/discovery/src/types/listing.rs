use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DiscoveryError, Result};
use crate::types::{ListingId, UserId};

/// A WGS84 point, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// True when both components are finite and inside WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(DiscoveryError::validation(format!(
                "coordinates out of range: lon={}, lat={}",
                self.lon, self.lat
            )))
        }
    }
}

/// Structured postal address of a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// One-line form handed to the geocoder, e.g. "Hauptstr. 5, 10115, Berlin, DE".
    pub fn to_query(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.street, &self.postal_code, &self.city, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Where a listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSource {
    Manual,
    Scraped,
}

impl std::fmt::Display for ListingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingSource::Manual => write!(f, "manual"),
            ListingSource::Scraped => write!(f, "scraped"),
        }
    }
}

impl std::str::FromStr for ListingSource {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "manual" => Ok(ListingSource::Manual),
            "scraped" => Ok(ListingSource::Scraped),
            _ => Err(DiscoveryError::validation(format!(
                "invalid listing source: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    Active,
    Inactive,
    Rented,
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingStatus::Active => write!(f, "active"),
            ListingStatus::Inactive => write!(f, "inactive"),
            ListingStatus::Rented => write!(f, "rented"),
        }
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(ListingStatus::Active),
            "inactive" => Ok(ListingStatus::Inactive),
            "rented" => Ok(ListingStatus::Rented),
            _ => Err(DiscoveryError::validation(format!(
                "invalid listing status: {}",
                s
            ))),
        }
    }
}

/// A room listing as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,

    /// Monthly rent in whole currency units
    pub budget: i64,

    pub location: Option<GeoPoint>,
    pub address: Address,
    pub images: Vec<String>,
    pub source: ListingSource,

    /// Scraped listings stay ownerless until claimed
    pub owner_id: Option<UserId>,

    // Direct contact; hidden during early access
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub source_url: Option<String>,

    pub status: ListingStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub budget: i64,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub images: Vec<String>,
    pub source: ListingSource,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl NewListing {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(DiscoveryError::validation("title must not be empty"));
        }
        if self.budget < 0 {
            return Err(DiscoveryError::validation("budget must be >= 0"));
        }
        if let Some(point) = &self.location {
            point.validate()?;
        }
        if self.source == ListingSource::Manual && self.owner_id.is_none() {
            return Err(DiscoveryError::validation(
                "manual listings require an owner",
            ));
        }
        Ok(())
    }

    /// Materialize into a stored listing with a fresh id.
    pub fn into_listing(self, created_at: DateTime<Utc>) -> Listing {
        Listing {
            id: ListingId::new(),
            title: self.title,
            description: self.description,
            budget: self.budget,
            location: self.location,
            address: self.address,
            images: self.images,
            source: self.source,
            owner_id: self.owner_id,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            source_url: self.source_url,
            status: ListingStatus::Active,
            created_at: Some(created_at),
        }
    }
}

/// Partial update; an absent field leaves the listing unchanged.
///
/// `location`, `contact_email` and `contact_phone` are three-state: absent
/// keeps the value, `null` clears it, anything else replaces it. A new
/// address without a location clears the point, since the old coordinates
/// no longer describe the room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget: Option<i64>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<GeoPoint>>,
    pub address: Option<Address>,
    pub images: Option<Vec<String>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<Option<String>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<Option<String>>,
    pub status: Option<ListingStatus>,
}

/// A present field, `null` included, deserializes to `Some`.
fn nullable<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ListingUpdate {
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(DiscoveryError::validation("title must not be empty"));
        }
        if matches!(self.budget, Some(b) if b < 0) {
            return Err(DiscoveryError::validation("budget must be >= 0"));
        }
        if let Some(Some(point)) = &self.location {
            point.validate()?;
        }
        Ok(())
    }

    /// True when the address changes and no explicit point came with it.
    pub fn needs_geocoding(&self) -> bool {
        self.address.is_some() && self.location.is_none()
    }

    /// Apply onto an existing listing in place.
    pub fn apply(self, listing: &mut Listing) {
        if let Some(title) = self.title {
            listing.title = title;
        }
        if let Some(description) = self.description {
            listing.description = description;
        }
        if let Some(budget) = self.budget {
            listing.budget = budget;
        }
        match (self.location, self.address) {
            (Some(location), address) => {
                listing.location = location;
                if let Some(address) = address {
                    listing.address = address;
                }
            }
            (None, Some(address)) => {
                listing.location = None;
                listing.address = address;
            }
            (None, None) => {}
        }
        if let Some(images) = self.images {
            listing.images = images;
        }
        if let Some(email) = self.contact_email {
            listing.contact_email = email;
        }
        if let Some(phone) = self.contact_phone {
            listing.contact_phone = phone;
        }
        if let Some(status) = self.status {
            listing.status = status;
        }
    }
}
