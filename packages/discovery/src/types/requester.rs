use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Listing, UserId};

/// Who is asking, as resolved by the identity provider.
///
/// Anonymous requests use `RequesterContext::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterContext {
    pub user_id: Option<UserId>,

    /// Unlimited-access role
    pub is_pro: bool,

    /// Time-boxed access pass
    pub pass_expires_at: Option<DateTime<Utc>>,
}

impl RequesterContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn with_pro(mut self, is_pro: bool) -> Self {
        self.is_pro = is_pro;
        self
    }

    pub fn with_pass_until(mut self, expires_at: DateTime<Utc>) -> Self {
        self.pass_expires_at = Some(expires_at);
        self
    }

    /// Pass is active only while its expiry lies strictly in the future.
    pub fn has_active_pass(&self, now: DateTime<Utc>) -> bool {
        matches!(self.pass_expires_at, Some(expires_at) if expires_at > now)
    }

    pub fn owns(&self, listing: &Listing) -> bool {
        match (self.user_id, listing.owner_id) {
            (Some(me), Some(owner)) => me == owner,
            _ => false,
        }
    }
}
