//! Listing search and CRUD endpoints.
//!
//! Every listing that leaves these handlers passes through the access gate,
//! so early-access redaction applies to search results as well as reads.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use discovery::{
    Address, DiscoveryError, GateOutcome, GeoPoint, ListingId, ListingSource, ListingUpdate,
    ListingView, NewListing, UserId,
};
use serde::Deserialize;
use tracing::info;

use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::middleware::{AuthUser, Requester};

#[derive(Debug, Deserialize)]
pub struct BudgetParams {
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct BoundsParams {
    pub sw_lon: f64,
    pub sw_lat: f64,
    pub ne_lon: f64,
    pub ne_lat: f64,
}

/// Body of `POST /listings`. The creator becomes the owner.
#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
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
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

/// `GET /listings?budget_min=&budget_max=`
pub async fn listings_by_budget(
    Extension(state): Extension<AppState>,
    Requester(requester): Requester,
    Query(params): Query<BudgetParams>,
) -> ApiResult<Json<Vec<ListingView>>> {
    let views = state
        .gate
        .by_budget(params.budget_min.unwrap_or(0), params.budget_max, &requester)
        .await?;
    Ok(Json(views))
}

/// `GET /listings/nearby?lat=&lon=&radius_km=`
pub async fn nearby_listings(
    Extension(state): Extension<AppState>,
    Requester(requester): Requester,
    Query(params): Query<NearbyParams>,
) -> ApiResult<Json<Vec<ListingView>>> {
    let views = state
        .gate
        .nearby(params.lat, params.lon, params.radius_km, &requester)
        .await?;
    Ok(Json(views))
}

/// `GET /listings/bounds?sw_lon=&sw_lat=&ne_lon=&ne_lat=`
pub async fn listings_in_bounds(
    Extension(state): Extension<AppState>,
    Requester(requester): Requester,
    Query(params): Query<BoundsParams>,
) -> ApiResult<Json<Vec<ListingView>>> {
    let views = state
        .gate
        .within_bounds(
            params.sw_lon,
            params.sw_lat,
            params.ne_lon,
            params.ne_lat,
            &requester,
        )
        .await?;
    Ok(Json(views))
}

/// `GET /listings/:id`
pub async fn get_listing(
    Extension(state): Extension<AppState>,
    Requester(requester): Requester,
    Path(id): Path<ListingId>,
) -> ApiResult<Json<ListingView>> {
    match state.gate.read(Some(id), &requester).await? {
        GateOutcome::Listing(view) => Ok(Json(view)),
        GateOutcome::PassThrough => Err(DiscoveryError::ListingNotFound { id }.into()),
    }
}

/// `GET /owners/:owner_id/listings`
pub async fn owner_listings(
    Extension(state): Extension<AppState>,
    Requester(requester): Requester,
    Path(owner_id): Path<UserId>,
) -> ApiResult<Json<Vec<ListingView>>> {
    let views = state.gate.by_owner(owner_id, &requester).await?;
    Ok(Json(views))
}

/// `POST /listings`
pub async fn create_listing(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(body): Json<CreateListingRequest>,
) -> ApiResult<(StatusCode, Json<ListingView>)> {
    let new_listing = NewListing {
        title: body.title,
        description: body.description,
        budget: body.budget,
        location: body.location,
        address: body.address,
        images: body.images,
        source: ListingSource::Manual,
        owner_id: Some(user.user_id),
        contact_email: body.contact_email,
        contact_phone: body.contact_phone,
        source_url: None,
    };

    let listing = state.ingestor.ingest(new_listing).await?;
    info!(listing_id = %listing.id, user_id = %user.user_id, geocoded = listing.location.is_some(), "Listing published");
    Ok((
        StatusCode::CREATED,
        Json(state.gate.present(listing, &user.requester)),
    ))
}

/// `PATCH /listings/:id`
///
/// A new address without a location is geocoded again. `null` clears the
/// location or a contact field.
pub async fn update_listing(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<ListingId>,
    Json(update): Json<ListingUpdate>,
) -> ApiResult<Json<ListingView>> {
    let listing = state.ingestor.update(id, &user.requester, update).await?;
    Ok(Json(state.gate.present(listing, &user.requester)))
}

/// `DELETE /listings/:id`
pub async fn delete_listing(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<ListingId>,
) -> Result<StatusCode, ApiError> {
    state.catalog().delete(id, &user.requester).await?;
    Ok(StatusCode::NO_CONTENT)
}
