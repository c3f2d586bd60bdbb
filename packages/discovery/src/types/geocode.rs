use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::GeoPoint;

/// Answer to "where is this address?".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeocodeOutcome {
    Found(GeoPoint),
    NotFound,
}

impl GeocodeOutcome {
    pub fn point(&self) -> Option<GeoPoint> {
        match self {
            GeocodeOutcome::Found(point) => Some(*point),
            GeocodeOutcome::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, GeocodeOutcome::Found(_))
    }
}

impl From<Option<GeoPoint>> for GeocodeOutcome {
    fn from(point: Option<GeoPoint>) -> Self {
        point.map_or(GeocodeOutcome::NotFound, GeocodeOutcome::Found)
    }
}

/// A cached outcome, positive or negative, with its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedGeocode {
    pub outcome: GeocodeOutcome,
    pub expires_at: DateTime<Utc>,
}

impl CachedGeocode {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
