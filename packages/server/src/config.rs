use anyhow::{Context, Result};
use discovery::{GeoResolverConfig, NominatimConfig};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
    pub nominatim: NominatimConfig,
    pub geocoder_min_delay: Duration,
    pub geocode_cache: GeoResolverConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nominatim_defaults = NominatimConfig::default();
        let cache_defaults = GeoResolverConfig::default();

        let min_delay_ms: u64 = parse_or(&lookup, "GEOCODER_MIN_DELAY_MS", 1000)?;
        let ttl_days: i64 = parse_or(&lookup, "GEOCODE_CACHE_TTL_DAYS", cache_defaults.ttl.num_days())?;
        if ttl_days <= 0 {
            anyhow::bail!("GEOCODE_CACHE_TTL_DAYS must be positive");
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parse_or(&lookup, "PORT", 8080)?,
            jwt_secret: lookup("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "roomshare".to_string()),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or_default(),
            nominatim: NominatimConfig {
                base_url: lookup("GEOCODER_BASE_URL").unwrap_or(nominatim_defaults.base_url),
                user_agent: lookup("GEOCODER_USER_AGENT").unwrap_or(nominatim_defaults.user_agent),
                country_codes: Some(
                    lookup("GEOCODER_COUNTRY_CODES").unwrap_or_else(|| "de".to_string()),
                )
                .filter(|codes| !codes.trim().is_empty()),
                timeout: nominatim_defaults.timeout,
            },
            geocoder_min_delay: Duration::from_millis(min_delay_ms),
            geocode_cache: GeoResolverConfig {
                ttl: chrono::Duration::days(ttl_days),
                cache_negative: parse_or(&lookup, "GEOCODE_CACHE_NEGATIVE", cache_defaults.cache_negative)?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

/// Comma-separated origin list; blanks are dropped.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
