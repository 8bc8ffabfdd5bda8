use axum::http::{HeaderMap, header};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub email: String,
    pub exp: usize,
}

/// One-time tokens for the password-reset and verification flows. Scoped by
/// purpose so an access token can never stand in for a reset token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Reset,
    Verify,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionClaims {
    pub sub: String,
    pub purpose: TokenPurpose,
    pub exp: usize,
}

pub fn create_token(user_id: &Uuid, email: &str, secret: &str) -> Result<String, ApiError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| ApiError::Internal("Failed to calculate expiration".into()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token creation failed: {}", e)))
}

pub fn validate_token(headers: &HeaderMap, secret: &str) -> Result<Claims, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    // Check for "Bearer " prefix
    if !auth_header.starts_with("Bearer ") {
        return Err(ApiError::Unauthorized);
    }

    let token = &auth_header[7..];

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}

pub fn create_action_token(
    user_id: &Uuid,
    purpose: TokenPurpose,
    secret: &str,
) -> Result<String, ApiError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(1))
        .ok_or_else(|| ApiError::Internal("Failed to calculate expiration".into()))?
        .timestamp() as usize;

    let claims = ActionClaims {
        sub: user_id.to_string(),
        purpose,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token creation failed: {}", e)))
}

/// Validates a reset/verify token and returns the user it was issued for.
pub fn validate_action_token(
    token: &str,
    purpose: TokenPurpose,
    secret: &str,
) -> Result<Uuid, ApiError> {
    let claims = decode::<ActionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Validation("Invalid or expired token".into()))?;

    if claims.purpose != purpose {
        return Err(ApiError::Validation("Invalid or expired token".into()));
    }

    Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Validation("Invalid or expired token".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "unit-test-secret";

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn access_token_round_trips() {
        let user_id = Uuid::new_v4();
        let token = create_token(&user_id, "a@b.com", SECRET).unwrap();

        let claims = validate_token(&bearer_headers(&token), SECRET).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "a@b.com");
    }

    #[test]
    fn missing_or_malformed_header_is_rejected() {
        assert!(matches!(
            validate_token(&HeaderMap::new(), SECRET),
            Err(ApiError::Unauthorized)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            validate_token(&headers, SECRET),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token(&Uuid::new_v4(), "a@b.com", "other").unwrap();
        assert!(validate_token(&bearer_headers(&token), SECRET).is_err());
    }

    #[test]
    fn action_token_round_trips_for_matching_purpose() {
        let user_id = Uuid::new_v4();
        let token = create_action_token(&user_id, TokenPurpose::Reset, SECRET).unwrap();
        assert_eq!(
            validate_action_token(&token, TokenPurpose::Reset, SECRET).unwrap(),
            user_id
        );
    }

    #[test]
    fn action_token_purpose_mismatch_is_rejected() {
        let token = create_action_token(&Uuid::new_v4(), TokenPurpose::Verify, SECRET).unwrap();
        assert!(validate_action_token(&token, TokenPurpose::Reset, SECRET).is_err());
    }

    #[test]
    fn access_token_is_not_a_valid_action_token() {
        let token = create_token(&Uuid::new_v4(), "a@b.com", SECRET).unwrap();
        assert!(validate_action_token(&token, TokenPurpose::Reset, SECRET).is_err());
    }
}
