//! # Authentication Middleware
//!
//! Bearer tokens map to account addresses. The service keeps a table of
//! `address=token` pairs; a request that presents a known token acts as that
//! address.
//!
//! ```text
//! Authorization: Bearer {token}
//! ```
//!
//! Reads are public: a request without an `Authorization` header passes
//! through anonymously. Mutating handlers take a [`CallerIdentity`], which
//! rejects anonymous requests with 401. A header that is present but wrong
//! is always rejected, whatever the route.
//!
//! Whether the authenticated address may mutate the ledger is decided by
//! the ledger's own admin set, not here.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use certreg_core::Address;

use crate::config::ConfigError;
use crate::error::AppError;

// -- Secrets -----------------------------------------------------------------

/// A bearer token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken([REDACTED])")
    }
}

/// One `address=token` credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub address: Address,
    pub token: SecretToken,
}

impl std::str::FromStr for ApiKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, token) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidApiKey("expected address=token".into()))?;
        let address = Address::new(address)
            .map_err(|e| ConfigError::InvalidApiKey(format!("bad address: {e}")))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::InvalidApiKey(format!(
                "empty token for {address}"
            )));
        }
        Ok(Self {
            address,
            token: SecretToken::new(token),
        })
    }
}

// -- CallerIdentity ----------------------------------------------------------

/// The authenticated account behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub address: Address,
}

/// Reads the identity the auth middleware injected. Anonymous requests are
/// rejected with 401.
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))
    }
}

// -- Auth Configuration ------------------------------------------------------

/// The credential table, injected into request extensions.
#[derive(Clone, Default)]
pub struct AuthConfig {
    keys: Arc<Vec<ApiKey>>,
}

impl AuthConfig {
    /// Build the table.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateToken`] when two entries share a token, since
    /// the caller would be ambiguous.
    pub fn new(keys: Vec<ApiKey>) -> Result<Self, ConfigError> {
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].iter().any(|earlier| earlier.token == key.token) {
                return Err(ConfigError::DuplicateToken(key.address.to_string()));
            }
        }
        Ok(Self {
            keys: Arc::new(keys),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// The address owning `provided`, if any. Every key is compared so the
    /// time taken does not depend on which key matched.
    pub fn resolve(&self, provided: &str) -> Option<Address> {
        let mut found = None;
        for key in self.keys.iter() {
            if constant_time_token_eq(provided.as_bytes(), key.token.as_bytes()) && found.is_none()
            {
                found = Some(key.address.clone());
            }
        }
        found
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("keys", &self.keys.len())
            .finish()
    }
}

// -- Token Validation --------------------------------------------------------

/// Constant-time comparison of bearer tokens. Lengths that differ still
/// cost one comparison.
fn constant_time_token_eq(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

// -- Middleware --------------------------------------------------------------

/// Resolve the bearer token, if any, into a [`CallerIdentity`].
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();

    let Some(value) = request.headers().get(header::AUTHORIZATION) else {
        return next.run(request).await;
    };

    let Some(provided) = value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) else {
        tracing::warn!("authentication failed: non-Bearer authorization scheme");
        return unauthorized_response("authorization header must use Bearer scheme");
    };

    match config.resolve(provided.trim()) {
        Some(address) => {
            tracing::debug!(caller = %address, "authenticated request");
            request.extensions_mut().insert(CallerIdentity { address });
            next.run(request).await
        }
        None => {
            tracing::warn!("authentication failed: invalid bearer token");
            unauthorized_response("invalid bearer token")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}
