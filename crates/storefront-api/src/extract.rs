use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

/// The caller as resolved by the state's identity provider, if any.
///
/// Extraction never rejects, so handlers decide for themselves when an
/// anonymous caller is an error and in which order checks run.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Identity>);

impl Caller {
    pub fn require(self) -> Result<Identity, ApiError> {
        self.0.ok_or(ApiError::Unauthenticated)
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Caller(state.identity.resolve(&parts.headers)))
    }
}

/// Parse a JSON request body. Bodies are taken as raw bytes and parsed inside
/// the handler, after authentication, so a bad body never masks a 401. An
/// empty body parses as `{}`.
pub fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(raw)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}
