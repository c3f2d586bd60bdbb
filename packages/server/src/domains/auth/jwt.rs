use anyhow::Result;
use chrono::{DateTime, Utc};
use discovery::{RequesterContext, UserId};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims - entitlements issued by the identity provider
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,     // Subject (user_id as string)
    pub user_id: Uuid,   // Account UUID
    #[serde(default)]
    pub is_pro: bool,    // Unlimited-access role
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub pass_expires_at: Option<DateTime<Utc>>, // Time-boxed access pass
    pub exp: i64,        // Expiration timestamp
    #[serde(default)]
    pub iat: i64,        // Issued at timestamp
    pub iss: String,     // Issuer
}

impl Claims {
    pub fn requester(&self) -> RequesterContext {
        RequesterContext {
            user_id: Some(UserId::from_uuid(self.user_id)),
            is_pro: self.is_pro,
            pass_expires_at: self.pass_expires_at,
        }
    }
}

/// JWT Service - verifies tokens issued elsewhere (HS256)
#[derive(Clone)]
pub struct JwtService {
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    /// Create new JWT service with secret and issuer
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Verify and decode a JWT token
    ///
    /// Returns claims if token is valid, unexpired and from our issuer
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}
