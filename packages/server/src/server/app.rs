//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::get,
    Router,
};
use discovery::{
    AccessGate, Clock, GeoResolver, GeocodeProviderExt, ListingCatalog, ListingIngestor,
    NominatimProvider, PostgresGeocodeCache, PostgresListingStore, SystemClock,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::auth::JwtService;
use crate::server::middleware::{jwt_auth_middleware, with_rate_limit};
use crate::server::routes::{
    create_listing, delete_listing, get_listing, health_handler, listings_by_budget,
    listings_in_bounds, nearby_listings, owner_listings, update_listing,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checked by the health endpoint; `None` when running on memory stores
    pub db_pool: Option<PgPool>,
    pub gate: AccessGate,
    pub ingestor: Arc<ListingIngestor>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn catalog(&self) -> &ListingCatalog {
        self.gate.catalog()
    }
}

/// Wire the Postgres stores, the throttled Nominatim resolver and JWT
/// verification from configuration.
pub fn build_state(pool: PgPool, config: &Config) -> Result<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let catalog = ListingCatalog::new(
        Arc::new(PostgresListingStore::new(pool.clone())),
        clock.clone(),
    );

    let provider = NominatimProvider::new(config.nominatim.clone())
        .context("Failed to create geocoding client")?
        .throttled(clock.clone(), config.geocoder_min_delay);
    let resolver = GeoResolver::new(
        Arc::new(provider),
        Arc::new(PostgresGeocodeCache::new(pool.clone())),
        clock.clone(),
        config.geocode_cache.clone(),
    );

    Ok(AppState {
        db_pool: Some(pool),
        gate: AccessGate::new(catalog.clone(), clock),
        ingestor: Arc::new(ListingIngestor::new(catalog, Arc::new(resolver))),
        jwt_service: Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone())),
    })
}

fn api_routes() -> Router {
    Router::new()
        .route("/listings", get(listings_by_budget).post(create_listing))
        .route("/listings/nearby", get(nearby_listings))
        .route("/listings/bounds", get(listings_in_bounds))
        .route(
            "/listings/:id",
            get(get_listing).patch(update_listing).delete(delete_listing),
        )
        .route("/owners/:owner_id/listings", get(owner_listings))
}

fn with_shared_layers(router: Router, state: AppState) -> Router {
    let jwt_service = state.jwt_service.clone();

    // Applied in reverse order - last added runs first
    router
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

/// Routes with auth and tracing but no rate limiting or CORS.
///
/// Used by tests driving the router with `oneshot`, where no peer address
/// is available for per-IP limiting.
pub fn build_router(state: AppState) -> Router {
    with_shared_layers(api_routes(), state)
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Result<Router> {
    // Health check is exempt from rate limiting
    let api = with_rate_limit(api_routes())?;

    Ok(with_shared_layers(api, state).layer(cors_layer(allowed_origins)))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}
