//! Test fixtures: listings, tokens and an in-memory application.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration as TimeDelta, Utc};
use discovery::testing::{sample_listing, MockClock, MockGeocodeProvider};
use discovery::{
    AccessGate, GeoPoint, GeoResolver, GeoResolverConfig, Listing, ListingCatalog,
    ListingIngestor, MemoryGeocodeCache, MemoryListingStore,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use server_core::domains::auth::{Claims, JwtService};
use server_core::server::{build_router, AppState};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_secret";
pub const TEST_JWT_ISSUER: &str = "roomshare-tests";

/// A listing at `point` that is `age` old relative to `now`.
pub fn listing_at(point: GeoPoint, now: DateTime<Utc>, age: TimeDelta) -> Listing {
    Listing {
        location: Some(point),
        created_at: Some(now - age),
        ..sample_listing()
    }
}

/// Signed bearer token for `user_id` with the given entitlements.
pub fn token_for(user_id: Uuid, is_pro: bool, pass_expires_at: Option<DateTime<Utc>>) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        user_id,
        is_pro,
        pass_expires_at,
        exp: (now + TimeDelta::hours(1)).timestamp(),
        iat: now.timestamp(),
        iss: TEST_JWT_ISSUER.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// The full router over memory stores, a mock clock and a mock geocoder.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<MockClock>,
    pub provider: Arc<MockGeocodeProvider>,
}

impl TestApp {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self::with_provider(listings, MockGeocodeProvider::new())
    }

    pub fn with_provider(listings: Vec<Listing>, provider: MockGeocodeProvider) -> Self {
        let clock = Arc::new(MockClock::default());
        let provider = Arc::new(provider);

        let catalog = ListingCatalog::new(
            Arc::new(MemoryListingStore::with_listings(listings)),
            clock.clone(),
        );
        let resolver = GeoResolver::new(
            provider.clone(),
            Arc::new(MemoryGeocodeCache::new()),
            clock.clone(),
            GeoResolverConfig::default(),
        );

        let state = AppState {
            db_pool: None,
            gate: AccessGate::new(catalog.clone(), clock.clone()),
            ingestor: Arc::new(ListingIngestor::new(catalog, Arc::new(resolver))),
            jwt_service: Arc::new(JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string())),
        };

        Self {
            router: build_router(state),
            clock,
            provider,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        use discovery::Clock;
        self.clock.now()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send("GET", uri, token, None).await
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty or
    /// not JSON).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }
}
