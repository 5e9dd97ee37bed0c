use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    models::identity::Identity,
};

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    identity: Identity,
    iat: i64,
    exp: i64,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issues a token for `identity`, valid from `now` for the configured lifetime.
    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            identity: identity.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Returns the identity of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<Identity> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.identity)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))
    }
}
