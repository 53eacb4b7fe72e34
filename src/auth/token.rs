// JWT token generation and validation service

use crate::auth::error::AuthError;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // shop_id
    pub email: String,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

/// Token service for JWT operations
pub struct TokenService {
    secret: String,
    access_token_duration: i64,  // in seconds
    refresh_token_duration: i64, // in seconds
}

impl TokenService {
    /// Create a new TokenService with secret key
    /// Access tokens expire in 15 minutes, refresh tokens in 7 days
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            access_token_duration: 900,     // 15 minutes
            refresh_token_duration: 604800, // 7 days
        }
    }

    /// Seconds a refresh token stays valid; the repository stores the same
    /// expiry so database and JWT agree
    pub fn refresh_token_duration(&self) -> i64 {
        self.refresh_token_duration
    }

    /// Generate an access token
    pub fn generate_access_token(&self, shop_id: i32, email: &str) -> Result<String, AuthError> {
        self.generate(shop_id, email, self.access_token_duration)
    }

    /// Generate a refresh token
    pub fn generate_refresh_token(&self, shop_id: i32, email: &str) -> Result<String, AuthError> {
        self.generate(shop_id, email, self.refresh_token_duration)
    }

    fn generate(&self, shop_id: i32, email: &str, duration: i64) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();

        let claims = Claims {
            sub: shop_id,
            email: email.to_string(),
            iat: now,
            exp: now + duration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Validate an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_token(token)
    }

    /// Validate a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_token(token)
    }

    fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::default();

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            if e.to_string().contains("ExpiredSignature") {
                AuthError::ExpiredToken
            } else {
                AuthError::InvalidToken
            }
        })
    }

    /// Generate both access and refresh tokens
    pub fn generate_token_pair(
        &self,
        shop_id: i32,
        email: &str,
    ) -> Result<(String, String), AuthError> {
        let access_token = self.generate_access_token(shop_id, email)?;
        let refresh_token = self.generate_refresh_token(shop_id, email)?;
        Ok((access_token, refresh_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_service() -> TokenService {
        TokenService::new("test_secret_key_for_testing_purposes".to_string())
    }

    #[test]
    fn test_generated_access_token_round_trips() {
        let service = test_service();

        let token = service.generate_access_token(42, "owner@shop.example").unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "owner@shop.example");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_pair_has_distinct_expiries() {
        let service = test_service();

        let (access, refresh) = service.generate_token_pair(1, "owner@shop.example").unwrap();
        let access_claims = service.validate_access_token(&access).unwrap();
        let refresh_claims = service.validate_refresh_token(&refresh).unwrap();

        assert!(refresh_claims.exp > access_claims.exp);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let service = test_service();
        let other = TokenService::new("a_completely_different_secret".to_string());

        let token = service.generate_access_token(7, "owner@shop.example").unwrap();
        assert!(matches!(
            other.validate_access_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let claims = Claims {
            sub: 1,
            email: "owner@shop.example".to_string(),
            iat: Utc::now().timestamp() - 1000,
            exp: Utc::now().timestamp() - 500,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test_secret_key_for_testing_purposes".as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            test_service().validate_access_token(&token),
            Err(AuthError::ExpiredToken)
        ));
    }

    proptest! {
        #[test]
        fn prop_valid_tokens_round_trip(
            shop_id in 1i32..1000000,
            email in "[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)"
        ) {
            let service = test_service();
            let token = service.generate_access_token(shop_id, &email)?;
            let claims = service.validate_access_token(&token).unwrap();

            prop_assert_eq!(claims.sub, shop_id);
            prop_assert_eq!(claims.email, email);
        }

        #[test]
        fn prop_malformed_tokens_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            let service = test_service();
            prop_assert!(service.validate_access_token(&malformed).is_err());
        }
    }
}
