//! Bearer token verification

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::UserClaims,
};

/// Validates HMAC-signed tokens and extracts the caller's user id
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // exp is checked when present but not required
        validation.required_spec_claims.clear();

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify the raw `Authorization` header value, with or without a `Bearer ` prefix
    pub fn verify(&self, credential: Option<&str>) -> AppResult<i64> {
        let credential = credential.map(str::trim).unwrap_or_default();
        let token = credential.strip_prefix("Bearer ").unwrap_or(credential).trim();

        if token.is_empty() {
            return Err(AppError::MissingCredential);
        }

        let data = decode::<UserClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::InvalidCredential(e.to_string()))?;

        tracing::debug!("Authenticated user {}", data.claims.user_id);
        Ok(data.claims.user_id)
    }

    /// Mint a token for the given claims
    pub fn issue_token(&self, claims: &UserClaims) -> AppResult<String> {
        Ok(encode(&Header::default(), claims, &self.encoding_key)?)
    }
}
