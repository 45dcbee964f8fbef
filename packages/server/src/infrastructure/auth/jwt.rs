//! HS256 JWT authenticator.
//!
//! Tokens are issued elsewhere (the account service); this side only
//! verifies them. The `sub` claim carries the user identifier and `exp` is
//! required. The signing secret is handed over at construction; there is no
//! process-wide key.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::domain::{AuthError, Authenticator, UserId};

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

pub struct JwtAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, credential: &str) -> Result<UserId, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        let token = decode::<Claims>(credential, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(UserId::new(token.claims.sub)?)
    }
}
