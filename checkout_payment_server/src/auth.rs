//! The authentication boundary.
//!
//! Identity is resolved exactly once, here, by verifying the access token in the `cps_access_token` header.
//! Handlers receive an [`AuthenticatedIdentity`] as an extracted parameter and the core never sees tokens, or
//! learns where an owner id came from. Tokens are HS256 JWTs carrying the owner id and a role; issuing them is
//! the job of the (out of scope) login flow, but [`TokenIssuer`] is provided for tooling and tests.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const AUTH_HEADER: &str = "cps_access_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// A purchaser. May place orders and list their own.
    Customer,
    /// Fulfilment staff. May additionally list every fulfillable order.
    Fulfillment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The owner id of the authenticated identity.
    pub sub: String,
    pub role: Role,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

//-------------------------------------------   TokenIssuer   ---------------------------------------------------------
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn issue_token(
        &self,
        owner_id: &checkout_payment_engine::db_types::OwnerId,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Result<String, ServerError> {
        let claims = JwtClaims { sub: owner_id.as_str().to_string(), role, exp: expires_at.timestamp() };
        encode(&Header::default(), &claims, &self.key)
            .map_err(|e| ServerError::Unspecified(format!("Could not serialize access token. {e}")))
    }
}

//------------------------------------------   TokenVerifier   --------------------------------------------------------
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes()), validation: Validation::new(Algorithm::HS256) }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        Ok(data.claims)
    }
}

//---------------------------------------   AuthenticatedIdentity   ---------------------------------------------------
/// The identity a request acts as, resolved and validated at the boundary. This is the only source of owner ids
/// for core operations; request bodies are never consulted.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub owner_id: checkout_payment_engine::db_types::OwnerId,
    pub role: Role,
}

impl AuthenticatedIdentity {
    pub fn require_fulfillment(&self) -> Result<(), ServerError> {
        if self.role == Role::Fulfillment {
            Ok(())
        } else {
            Err(ServerError::InsufficientPermissions("This endpoint requires the Fulfillment role.".to_string()))
        }
    }
}

impl FromRequest for AuthenticatedIdentity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_identity(req))
    }
}

fn extract_identity(req: &HttpRequest) -> Result<AuthenticatedIdentity, ServerError> {
    let verifier = req
        .app_data::<web::Data<TokenVerifier>>()
        .ok_or_else(|| ServerError::ConfigurationError("No token verifier is registered with the app.".to_string()))?;
    let header = req.headers().get(AUTH_HEADER).ok_or(AuthError::MissingToken)?;
    let token = header.to_str().map_err(|e| {
        debug!("💻️ Could not read access token. {e}");
        AuthError::PoorlyFormattedToken(e.to_string())
    })?;
    let claims = verifier.verify(token).map_err(|e| {
        debug!("💻️ Access token failed verification. {e}");
        e
    })?;
    trace!("💻️ Request authenticated for {}", claims.sub);
    Ok(AuthenticatedIdentity { owner_id: claims.sub.into(), role: claims.role })
}
