pub mod auth;
pub mod portfolio;
pub mod status;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::error::ServerError;
use crate::token::Claims;

/// JSON extractor running schema validation on the parsed body.
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Identity carried by the token claims.
///
/// A token whose subject is not a well-formed user ID never matches a row,
/// so it is treated like any other invalid token.
pub fn owner(claims: &Claims) -> Result<Uuid, ServerError> {
    Uuid::parse_str(&claims.sub).map_err(|_| ServerError::Unauthorized)
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub(crate) fn state(pool: sqlx::PgPool) -> crate::AppState {
    use std::sync::Arc;

    use crate::config::{Argon2, Configuration};
    use crate::crypto::PasswordManager;
    use crate::database::Database;
    use crate::storage::MemoryStore;
    use crate::token::TokenManager;

    // Light hashing parameters keep the test suite fast.
    let argon2 = Argon2 {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
        hash_length: 32,
    };

    crate::AppState {
        config: Arc::new(Configuration::default()),
        db: Database { postgres: pool },
        crypto: Arc::new(
            PasswordManager::new(Some(argon2)).expect("argon2 params"),
        ),
        token: TokenManager::new("folio", "test secret").expect("jwt secret"),
        storage: Arc::new(MemoryStore::default()),
    }
}
