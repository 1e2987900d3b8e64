//! Authenticator: sign-up, sign-in, refresh rotation, and logout.

use service_core::error::AppError;
use std::sync::Arc;

use super::jwt::JwtService;
use super::store::YearbookStore;
use crate::models::{Session, User};
use crate::utils::{hash_password, verify_password};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn YearbookStore>,
    jwt: JwtService,
    refresh_token_expiry_days: i64,
}

/// Result of sign-up/sign-in: a signed access token, the raw refresh token
/// (for the cookie), and the authenticated user.
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Result of a successful refresh rotation.
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn YearbookStore>,
        jwt: JwtService,
        refresh_token_expiry_days: i64,
    ) -> Self {
        Self {
            store,
            jwt,
            refresh_token_expiry_days,
        }
    }

    pub async fn sign_up(
        &self,
        full_name: String,
        email: String,
        password: String,
    ) -> Result<IssuedTokens, AppError> {
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(anyhow::anyhow!("Email already in use")));
        }

        let password_hash = hash_password(&password).map_err(AppError::InternalError)?;
        let user = User::new(full_name, email, password_hash);

        // The unique index still backs this up if two sign-ups race past
        // the lookup above; the store surfaces that as the same conflict.
        self.store.insert_user(&user).await?;

        tracing::info!(user_id = %user.user_id, "User registered");

        self.issue_tokens(user).await
    }

    pub async fn sign_in(&self, email: String, password: String) -> Result<IssuedTokens, AppError> {
        // One failure path for unknown email and wrong password, so
        // responses cannot be used to enumerate accounts.
        let invalid = || AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"));

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&password, &user.password_hash) {
            return Err(invalid());
        }

        tracing::info!(user_id = %user.user_id, "User signed in");

        self.issue_tokens(user).await
    }

    /// Exchange a presented refresh token for a new access token, rotating
    /// the session's stored fingerprint in the same store operation.
    pub async fn refresh(
        &self,
        presented_token: Option<&str>,
    ) -> Result<RefreshedTokens, AppError> {
        let token = presented_token
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("No refresh token provided")))?;

        let current_hash = Session::hash_token(token);
        let new_token = Session::generate_token();
        let new_hash = Session::hash_token(&new_token);
        let new_expiry =
            chrono::Utc::now() + chrono::Duration::days(self.refresh_token_expiry_days);

        // Covers expired lineages, forged tokens, and reuse of a token
        // already superseded by rotation.
        let session = self
            .store
            .rotate_session(&current_hash, &new_hash, new_expiry)
            .await?
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid refresh token")))?;

        let user = self
            .store
            .find_user_by_id(session.user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(session_id = %session.session_id, "Session without owning user");
                AppError::Unauthorized(anyhow::anyhow!("Invalid refresh token"))
            })?;

        let access_token = self
            .jwt
            .generate_access_token(user.user_id, user.role)
            .map_err(AppError::InternalError)?;

        tracing::info!(user_id = %user.user_id, "Refresh token rotated");

        Ok(RefreshedTokens {
            access_token,
            refresh_token: new_token,
        })
    }

    /// Delete every session matching the presented token's fingerprint.
    /// Returns whether a token was presented at all; a missing cookie is an
    /// intentional no-op success, and a stale one deletes zero rows.
    pub async fn logout(&self, presented_token: Option<&str>) -> Result<bool, AppError> {
        let Some(token) = presented_token else {
            return Ok(false);
        };

        let deleted = self
            .store
            .delete_sessions_by_token_hash(&Session::hash_token(token))
            .await?;

        tracing::info!(sessions_deleted = deleted, "User logged out");
        Ok(true)
    }

    async fn issue_tokens(&self, user: User) -> Result<IssuedTokens, AppError> {
        let refresh_token = Session::generate_token();
        let session = Session::new(
            user.user_id,
            Session::hash_token(&refresh_token),
            self.refresh_token_expiry_days,
        );
        self.store.insert_session(&session).await?;

        let access_token = self
            .jwt
            .generate_access_token(user.user_id, user.role)
            .map_err(AppError::InternalError)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            user,
        })
    }
}
