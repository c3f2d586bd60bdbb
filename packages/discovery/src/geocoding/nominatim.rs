//! Nominatim (OpenStreetMap) geocoding client.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{GeocodeError, ProviderResult};
use crate::traits::GeocodeProvider;
use crate::types::GeoPoint;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Nominatim API search hit
#[derive(Debug, Deserialize)]
struct NominatimHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NominatimConfig {
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying agent
    pub user_agent: String,
    /// Comma-separated ISO 3166-1 alpha-2 codes, e.g. "de" or "de,at"
    pub country_codes: Option<String>,
    pub timeout: Duration,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("roomshare-discovery/", env!("CARGO_PKG_VERSION")).to_string(),
            country_codes: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct NominatimProvider {
    client: reqwest::Client,
    config: NominatimConfig,
}

impl NominatimProvider {
    pub fn new(config: NominatimConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeocodeError::Http(Box::new(e)))?;

        Ok(Self { client, config })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl GeocodeProvider for NominatimProvider {
    #[instrument(skip(self))]
    async fn lookup(&self, query: &str) -> ProviderResult<Option<GeoPoint>> {
        let mut params = vec![("q", query), ("format", "json"), ("limit", "1")];
        if let Some(codes) = self.config.country_codes.as_deref() {
            params.push(("countrycodes", codes));
        }

        let response = self
            .client
            .get(self.search_url())
            .query(&params)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Geocoding provider returned an error status");
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let hits: Vec<NominatimHit> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GeocodeError::Timeout
            } else {
                GeocodeError::Decode(e.to_string())
            }
        })?;

        let Some(hit) = hits.into_iter().next() else {
            debug!("No geocoding match");
            return Ok(None);
        };

        let point = parse_hit(&hit)?;
        debug!(
            lon = point.lon,
            lat = point.lat,
            display_name = hit.display_name.as_deref().unwrap_or(""),
            "Geocoded address"
        );

        Ok(Some(point))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GeocodeError {
    if e.is_timeout() {
        GeocodeError::Timeout
    } else {
        GeocodeError::Http(Box::new(e))
    }
}

fn parse_hit(hit: &NominatimHit) -> ProviderResult<GeoPoint> {
    let lat: f64 = hit
        .lat
        .parse()
        .map_err(|e| GeocodeError::Decode(format!("invalid latitude {:?}: {}", hit.lat, e)))?;
    let lon: f64 = hit
        .lon
        .parse()
        .map_err(|e| GeocodeError::Decode(format!("invalid longitude {:?}: {}", hit.lon, e)))?;

    let point = GeoPoint::new(lon, lat);
    if !point.is_valid() {
        return Err(GeocodeError::Decode(format!(
            "coordinates out of range: lon={}, lat={}",
            lon, lat
        )));
    }

    Ok(point)
}
