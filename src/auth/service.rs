/// Authentication Service
///
/// Registration, login, refresh and access-token verification on top of an
/// injected `CredentialStore`. bcrypt work runs on the blocking pool.

use std::sync::Arc;

use crate::auth::claims::{Claims, Identity};
use crate::auth::jwt::TokenIssuer;
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::configuration::{JwtSettings, PasswordSettings};
use crate::error::{AppError, AuthError, StoreError, ValidationError};
use crate::store::{CredentialStore, NewUser, PublicUser, UserRecord};
use crate::validators::{is_valid_email, is_valid_name};

/// Hashed once at startup and verified against when an email is unknown,
/// so both login failure paths cost one bcrypt verification.
const TIMING_DUMMY_PASSWORD: &str = "tribridge-timing-equalizer";

/// Result of a successful register or login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
    hash_cost: u32,
    dummy_hash: String,
}

impl AuthService {
    /// # Errors
    /// - `AppError::Config` if the JWT settings are unusable
    /// - `AppError::Internal` if the dummy hash cannot be computed
    pub fn new(
        store: Arc<dyn CredentialStore>,
        jwt: &JwtSettings,
        password: &PasswordSettings,
    ) -> Result<Self, AppError> {
        jwt.validate()?;
        let dummy_hash = hash_password(TIMING_DUMMY_PASSWORD, password.hash_cost)?;

        Ok(Self {
            store,
            issuer: TokenIssuer::new(jwt),
            hash_cost: password.hash_cost,
            dummy_hash,
        })
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Register a new user and issue its first token pair
    ///
    /// # Errors
    /// - `ValidationError` if a field is missing or malformed
    /// - `StoreError::DuplicateEmail` if the email is taken
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthSession, AppError> {
        if email.trim().is_empty() || password.is_empty() || full_name.trim().is_empty() {
            return Err(ValidationError::MissingRegistrationFields.into());
        }

        let email = is_valid_email(email)?;
        let full_name = is_valid_name(full_name)?;
        validate_password(password)?;

        // Fail fast before paying for a hash; `create` still enforces uniqueness
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(StoreError::DuplicateEmail(email).into());
        }

        let password_hash = self.hash(password).await?;
        let user = self
            .store
            .create(NewUser {
                email,
                full_name,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.session_for(&user)
    }

    /// Authenticate with email and password
    ///
    /// # Errors
    /// - `ValidationError::MissingLoginCredentials` if either field is blank
    /// - `AuthError::InvalidCredentials` for an unknown email, a wrong password
    ///   or a password over the bcrypt input limit
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingLoginCredentials.into());
        }

        // bcrypt ignores bytes past the limit, so a longer input could match a
        // stored prefix
        if validate_password(password).is_err() {
            let _ = self.verify(password, &self.dummy_hash).await;
            return Err(AuthError::InvalidCredentials.into());
        }

        let user = match self.store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                let _ = self.verify(password, &self.dummy_hash).await;
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !self.verify(password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.session_for(&user)
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The user is not looked up again; a refresh token for a user that no
    /// longer exists still mints access tokens until it expires.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(AuthError::MissingRefreshToken.into());
        }

        let claims = self.issuer.verify_refresh_token(refresh_token)?;
        let access_token = self.issuer.issue_access_token(&claims.user_id, &claims.email)?;

        tracing::info!(user_id = %claims.user_id, "Access token refreshed");
        Ok(access_token)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Identity, AppError> {
        Ok(self.issuer.verify_access_token(token)?)
    }

    /// Load the user behind verified access-token claims
    pub async fn current_user(&self, claims: &Claims) -> Result<PublicUser, AppError> {
        let user_id = claims.user_id()?;

        self.store
            .find_by_id(user_id)
            .await?
            .map(|user| PublicUser::from(&user))
            .ok_or_else(|| AuthError::UnknownUser.into())
    }

    fn session_for(&self, user: &UserRecord) -> Result<AuthSession, AppError> {
        let user_id = user.id.to_string();

        Ok(AuthSession {
            access_token: self.issuer.issue_access_token(&user_id, &user.email)?,
            refresh_token: self.issuer.issue_refresh_token(&user_id, &user.email)?,
            user: PublicUser::from(user),
        })
    }

    async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.hash_cost;

        tokio::task::spawn_blocking(move || hash_password(&password, cost)).await?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?
    }
}
