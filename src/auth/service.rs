// Authentication service - business logic layer

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, ShopResponse},
    password::PasswordService,
    repository::{ShopRepository, TokenRepository},
    token::TokenService,
};

/// Authentication service coordinating all auth operations
#[derive(Clone)]
pub struct AuthService {
    shop_repo: ShopRepository,
    token_repo: TokenRepository,
    token_service: Arc<TokenService>,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        shop_repo: ShopRepository,
        token_repo: TokenRepository,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            shop_repo,
            token_repo,
            token_service,
        }
    }

    /// Register a new shop account
    pub async fn register(
        &self,
        shop_name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        PasswordService::validate_password_strength(password)?;

        let password_hash = PasswordService::hash_password(password)?;
        let shop = self
            .shop_repo
            .create_shop(shop_name, email, &password_hash)
            .await?;

        tracing::info!("Registered shop {} ({})", shop.id, shop.name);
        self.issue_tokens(shop.into()).await
    }

    /// Login a shop
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let shop = self
            .shop_repo
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !PasswordService::verify_password(password, &shop.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_tokens(shop.into()).await
    }

    /// Rotate a refresh token into a fresh token pair
    ///
    /// The presented token must be a valid JWT and still present (unexpired)
    /// in the database; it is invalidated before the new pair is issued.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        self.token_service.validate_refresh_token(refresh_token)?;

        let stored = self
            .token_repo
            .verify_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let shop = self
            .shop_repo
            .find_by_id(stored.shop_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.token_repo.invalidate_token(refresh_token).await?;

        self.issue_tokens(shop.into()).await
    }

    /// Get the current shop's account information
    pub async fn get_current_shop(&self, shop_id: i32) -> Result<ShopResponse, AuthError> {
        let shop = self
            .shop_repo
            .find_by_id(shop_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(shop.into())
    }

    async fn issue_tokens(&self, shop: ShopResponse) -> Result<AuthResponse, AuthError> {
        let (access_token, refresh_token) = self
            .token_service
            .generate_token_pair(shop.id, &shop.email)?;

        let expires_at =
            Utc::now() + Duration::seconds(self.token_service.refresh_token_duration());
        self.token_repo
            .store_refresh_token(shop.id, &refresh_token, expires_at)
            .await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            shop,
        })
    }
}
