// Authentication extractor for protected routes

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::auth::{error::AuthError, token::TokenService};

/// Authenticated shop extractor for protected routes
///
/// Every domain handler consumes the shop identity through this extractor;
/// nothing downstream ever sees the raw token.
#[derive(Debug, Clone)]
pub struct AuthenticatedShop {
    pub shop_id: i32,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedShop
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| AuthError::ConfigError("JWT_SECRET not configured".to_string()))?;

        let token_service = TokenService::new(jwt_secret);
        let claims = token_service.validate_access_token(token)?;

        Ok(AuthenticatedShop {
            shop_id: claims.sub,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(auth_value: &str) -> Parts {
        let req = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, auth_value)
            .body(())
            .unwrap();

        let (parts, _) = req.into_parts();
        parts
    }

    #[tokio::test]
    async fn test_valid_token_is_accepted() {
        std::env::set_var("JWT_SECRET", "test_secret_key_for_testing_purposes");

        let service = TokenService::new("test_secret_key_for_testing_purposes".to_string());
        let token = service.generate_access_token(42, "owner@shop.example").unwrap();

        let mut parts = parts_with_auth(&format!("Bearer {}", token));
        let shop = AuthenticatedShop::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert_eq!(shop.shop_id, 42);
        assert_eq!(shop.email, "owner@shop.example");
    }

    #[tokio::test]
    async fn test_missing_authorization_header() {
        let req = Request::builder().uri("/").body(()).unwrap();
        let (mut parts, _) = req.into_parts();

        let result = AuthenticatedShop::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_invalid_bearer_format() {
        std::env::set_var("JWT_SECRET", "test_secret_key_for_testing_purposes");

        for auth_value in ["Basic dXNlcjpwYXNz", "token_without_bearer", "Bearer"] {
            let mut parts = parts_with_auth(auth_value);
            let result = AuthenticatedShop::from_request_parts(&mut parts, &()).await;
            assert!(result.is_err(), "header {:?} should be rejected", auth_value);
        }
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected() {
        std::env::set_var("JWT_SECRET", "test_secret_key_for_testing_purposes");

        let mut parts = parts_with_auth("Bearer not.a.valid.jwt");
        let result = AuthenticatedShop::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }
}
