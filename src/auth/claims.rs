/// JWT Claims structure
///
/// Payload shared by access and refresh tokens. The two token kinds carry
/// the same claims and differ only in signing secret and lifetime.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// JWT Claims for access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User ID (UUID string)
    pub user_id: String,
    /// User email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

/// The `{userId, email}` pair a verified token proves
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

impl Claims {
    /// Create new claims expiring `expiry_seconds` from now
    pub fn new(user_id: &str, email: &str, expiry_seconds: i64, issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            user_id: user_id.to_string(),
            email: email.to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer.to_string(),
        }
    }

    /// Parse the user ID claim
    ///
    /// # Errors
    /// Returns `AuthError::TokenInvalid` if the claim is not a UUID
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.user_id).map_err(|_| AuthError::TokenInvalid)
    }

    #[cfg(test)]
    fn is_expired(&self) -> bool {
        self.exp < chrono::Utc::now().timestamp()
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4().to_string();
        let claims = Claims::new(&user_id, "a@b.com", 3600, "tribridge");

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_serialize_camel_case() {
        let claims = Claims::new("42", "a@b.com", 60, "tribridge");
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["userId"], "42");
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(&user_id.to_string(), "a@b.com", 3600, "tribridge");

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_user_id() {
        let claims = Claims::new("not-a-uuid", "a@b.com", 3600, "tribridge");
        assert_eq!(claims.user_id(), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_expired_claims() {
        let claims = Claims::new("42", "a@b.com", -10, "tribridge");
        assert!(claims.is_expired());
    }
}
