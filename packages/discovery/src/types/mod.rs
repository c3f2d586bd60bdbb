//! Domain types shared by the stores, the policy and the gate.

pub mod geocode;
pub mod id;
pub mod listing;
pub mod requester;
pub mod view;

pub use geocode::{CachedGeocode, GeocodeOutcome};
pub use id::Id;
pub use listing::{
    Address, GeoPoint, Listing, ListingSource, ListingStatus, ListingUpdate, NewListing,
};
pub use requester::RequesterContext;
pub use view::ListingView;

/// Marker for room listings.
pub struct Room;

/// Marker for accounts known to the identity provider.
pub struct Account;

pub type ListingId = Id<Room>;
pub type UserId = Id<Account>;
