// Per-IP request rate limiting using tower-governor
//
// Client IP comes from X-Forwarded-For / X-Real-IP / Forwarded when present,
// else the peer address, so the server needs
// `into_make_service_with_connect_info::<SocketAddr>()`.

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};

/// Sustained requests per second per client IP
pub const REQUESTS_PER_SECOND: u64 = 10;

/// Requests a client may burst above the sustained rate
pub const BURST_SIZE: u32 = 20;

/// Wrap `router` in the per-IP limiter. Over-limit clients get 429 with
/// `x-ratelimit-*` headers.
pub fn with_rate_limit(router: Router) -> Result<Router> {
    let config = GovernorConfigBuilder::default()
        // Replenish interval, not a rate
        .per_millisecond(1000 / REQUESTS_PER_SECOND)
        .burst_size(BURST_SIZE)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish()
        .context("Invalid rate limiter configuration")?;

    Ok(router.layer(GovernorLayer {
        config: Arc::new(config),
    }))
}
