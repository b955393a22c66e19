//! Caller identity resolution.
//!
//! Handlers never talk to a token format directly: they ask the injected
//! [`IdentityProvider`] who is calling, and get `None` for anonymous callers.

use axum::http::HeaderMap;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use storefront_types::api::Claims;

/// The resolved caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

pub trait IdentityProvider: Send + Sync {
    /// Resolve the caller from request headers. Missing, malformed or expired
    /// credentials all resolve to `None`; this never fails.
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// HS256 JWT bearer tokens: issues them at login and resolves them on requests.
#[derive(Clone)]
pub struct JwtIdentity {
    secret: String,
    ttl: chrono::Duration,
}

impl JwtIdentity {
    pub fn new(secret: impl Into<String>, ttl: chrono::Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> anyhow::Result<String> {
        let expires = chrono::Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| anyhow::anyhow!("token lifetime out of range"))?;
        let exp = usize::try_from(expires.timestamp())
            .map_err(|_| anyhow::anyhow!("token expiry before the epoch"))?;
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            exp,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .ok()
        .map(|data| data.claims)
    }
}

impl IdentityProvider for JwtIdentity {
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        let Authorization(bearer) = headers.typed_get::<Authorization<Bearer>>()?;
        let claims = self.verify(bearer.token())?;
        Some(Identity {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
