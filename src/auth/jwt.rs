/// JWT Token Generation and Validation
///
/// Access and refresh tokens are HS256 JWTs signed with two distinct
/// secrets, so a token of one kind never verifies as the other.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, Identity};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

#[derive(Clone, Copy, Debug, PartialEq)]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_seconds: i64,
}

impl SigningKeys {
    fn new(secret: &str, expiry_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }
}

/// Signs and verifies both token kinds
#[derive(Clone)]
pub struct TokenIssuer {
    access: SigningKeys,
    refresh: SigningKeys,
    issuer: String,
}

impl TokenIssuer {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            access: SigningKeys::new(&config.access_secret, config.access_token_expiry),
            refresh: SigningKeys::new(&config.refresh_secret, config.refresh_token_expiry),
            issuer: config.issuer.clone(),
        }
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Access token lifetime in seconds
    pub fn access_token_expiry(&self) -> i64 {
        self.access.expiry_seconds
    }

    /// Generate a new access token for a user
    ///
    /// # Errors
    /// Returns `AppError::Internal` if encoding fails
    pub fn issue_access_token(&self, user_id: &str, email: &str) -> Result<String, AppError> {
        self.sign(TokenKind::Access, user_id, email)
    }

    /// Generate a new refresh token for a user
    pub fn issue_refresh_token(&self, user_id: &str, email: &str) -> Result<String, AppError> {
        self.sign(TokenKind::Refresh, user_id, email)
    }

    /// Validate an access token and return the identity it carries
    ///
    /// # Errors
    /// `AuthError::TokenExpired` once `exp` has passed, `AuthError::TokenInvalid`
    /// for a bad signature, wrong issuer or malformed token
    pub fn verify_access_token(&self, token: &str) -> Result<Identity, AuthError> {
        self.access_claims(token).map(|claims| claims.identity())
    }

    /// Validate a refresh token and return its claims
    ///
    /// Every failure collapses to `AuthError::InvalidRefreshToken`.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(TokenKind::Refresh, token)
            .map_err(|_| AuthError::InvalidRefreshToken)
    }

    /// Decode access-token claims for request extensions
    pub fn access_claims(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(TokenKind::Access, token).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })
    }

    fn sign(&self, kind: TokenKind, user_id: &str, email: &str) -> Result<String, AppError> {
        let keys = self.keys(kind);
        let claims = Claims::new(user_id, email, keys.expiry_seconds, &self.issuer);

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(kind = ?kind, "JWT validation error: {}", e);
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            access_secret: "test-access-secret-at-least-32-characters".to_string(),
            refresh_secret: "test-refresh-secret-at-least-32-characters".to_string(),
            access_token_expiry: 86400,
            refresh_token_expiry: 604800,
            issuer: "tribridge".to_string(),
        }
    }

    fn sign_raw(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode claims")
    }

    #[test]
    fn test_access_token_round_trip() {
        let issuer = TokenIssuer::new(&get_test_config());

        let token = issuer
            .issue_access_token("user-1", "a@b.com")
            .expect("Failed to generate token");
        let identity = issuer
            .verify_access_token(&token)
            .expect("Failed to validate token");

        assert_eq!(identity.user_id, "user-1");
        assert_eq!(identity.email, "a@b.com");
    }

    #[test]
    fn test_access_token_expires_after_24_hours() {
        let issuer = TokenIssuer::new(&get_test_config());
        let token = issuer.issue_access_token("user-1", "a@b.com").unwrap();

        let claims = issuer.access_claims(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_invalid_token() {
        let issuer = TokenIssuer::new(&get_test_config());
        let result = issuer.verify_access_token("invalid.token.here");

        assert_eq!(result, Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_tampered_token() {
        let issuer = TokenIssuer::new(&get_test_config());
        let token = issuer.issue_access_token("user-1", "a@b.com").unwrap();

        let tampered = format!("{}X", token);
        assert!(issuer.verify_access_token(&tampered).is_err());
    }

    #[test]
    fn test_expired_token_with_valid_signature() {
        let config = get_test_config();
        let issuer = TokenIssuer::new(&config);
        let claims = Claims::new("user-1", "a@b.com", -30, &config.issuer);
        let token = sign_raw(&claims, &config.access_secret);

        assert_eq!(issuer.verify_access_token(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_wrong_issuer() {
        let mut config = get_test_config();
        let token = TokenIssuer::new(&config)
            .issue_access_token("user-1", "a@b.com")
            .unwrap();

        config.issuer = "wrong-issuer".to_string();
        let result = TokenIssuer::new(&config).verify_access_token(&token);

        assert_eq!(result, Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_refresh_round_trip() {
        let issuer = TokenIssuer::new(&get_test_config());
        let token = issuer.issue_refresh_token("user-1", "a@b.com").unwrap();

        let claims = issuer.verify_refresh_token(&token).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.exp - claims.iat, 604800);
    }

    #[test]
    fn test_access_token_rejected_as_refresh_token() {
        let issuer = TokenIssuer::new(&get_test_config());
        let access = issuer.issue_access_token("user-1", "a@b.com").unwrap();

        assert_eq!(
            issuer.verify_refresh_token(&access),
            Err(AuthError::InvalidRefreshToken)
        );
    }

    #[test]
    fn test_refresh_token_rejected_as_access_token() {
        let issuer = TokenIssuer::new(&get_test_config());
        let refresh = issuer.issue_refresh_token("user-1", "a@b.com").unwrap();

        assert_eq!(issuer.verify_access_token(&refresh), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_expired_refresh_token() {
        let config = get_test_config();
        let issuer = TokenIssuer::new(&config);
        let claims = Claims::new("user-1", "a@b.com", -30, &config.issuer);
        let token = sign_raw(&claims, &config.refresh_secret);

        assert_eq!(
            issuer.verify_refresh_token(&token),
            Err(AuthError::InvalidRefreshToken)
        );
    }
}
