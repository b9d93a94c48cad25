//! Manage json web tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};

/// Tokens expire one hour after issuance; expiry is the only lifetime bound,
/// there is no server-side revocation list.
pub const EXPIRATION_TIME: u64 = 60 * 60; // 1 hour, in seconds.

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the JWT was issued.
    pub iat: u64,
    /// Identifies the instance that issued the JWT.
    pub iss: String,
    /// User ID.
    pub sub: String,
}

/// Manage JWT tokens.
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    name: String,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    ///
    /// The secret is process-wide configuration and must never be logged.
    pub fn new(name: &str, secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(ServerError::Internal {
                details: "empty JWT secret".into(),
                source: None,
            });
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            name: name.to_owned(),
        })
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Create a new signed token for `user_id`.
    pub fn create(&self, user_id: &str) -> Result<String> {
        let time = Self::now();
        let claims = Claims {
            exp: time + EXPIRATION_TIME,
            iat: time,
            iss: self.name.clone(),
            sub: user_id.to_owned(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|err| {
            ServerError::Internal {
                details: "JWT signing failed".into(),
                source: Some(Box::new(err)),
            }
        })
    }

    /// Decode and check a token. Signature and expiry must both hold.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ServerError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_round_trip() {
        let manager = TokenManager::new("folio", SECRET).unwrap();

        let token = manager.create("some-user-id").unwrap();
        let claims = manager.decode(&token).unwrap();

        assert_eq!(claims.sub, "some-user-id");
        assert_eq!(claims.iss, "folio");
        assert_eq!(claims.exp, claims.iat + EXPIRATION_TIME);
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = TokenManager::new("folio", SECRET).unwrap();

        // Forge a token whose expiry is well past the validation leeway.
        let time = TokenManager::now();
        let claims = Claims {
            exp: time - 2 * EXPIRATION_TIME,
            iat: time - 3 * EXPIRATION_TIME,
            iss: "folio".into(),
            sub: "some-user-id".into(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(manager.decode(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let manager = TokenManager::new("folio", SECRET).unwrap();
        let other = TokenManager::new("folio", "another-secret").unwrap();

        let token = other.create("some-user-id").unwrap();
        assert!(manager.decode(&token).is_err());
    }

    #[test]
    fn test_empty_secret_refused() {
        assert!(TokenManager::new("folio", "").is_err());
    }
}
