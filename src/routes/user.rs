use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use bcrypt::{DEFAULT_COST, hash, verify};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{TokenPurpose, create_action_token, create_token, validate_action_token, validate_token},
    db::NewUser,
    dto::{
        EmailRequest, LoginForm, RegisterRequest, ResetPasswordRequest, TokenResponse,
        UpdateUserRequest, UserResponse, VerifyRequest,
    },
    errors::ApiError,
    state::AppState,
};

/// POST /auth/register
/// Body: { "email": "...", "password": "..." }
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if state.users.find_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::EmailTaken);
    }

    let hashed_password = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    let user = state
        .users
        .insert(NewUser {
            email: payload.email,
            hashed_password,
        })
        .await?;

    info!("New user registered: {}", user.email);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /auth/jwt/login
/// Form: username=<email>&password=<password>
pub async fn login(
    State(state): State<AppState>,
    Form(payload): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .users
        .find_by_email(&payload.username)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    // Verify password
    let valid = verify(&payload.password, &user.hashed_password)
        .map_err(|e| ApiError::Internal(format!("Password verification failed: {}", e)))?;

    if !valid || !user.is_active {
        return Err(ApiError::InvalidCredentials);
    }

    let token = create_token(&user.id, &user.email, &state.jwt_secret)?;

    info!("User logged in: {}", user.email);

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

/// POST /auth/forgot-password
/// Body: { "email": "..." }
///
/// Responds 202 whether or not the account exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<StatusCode, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if let Some(user) = state.users.find_by_email(&payload.email).await? {
        let token = create_action_token(&user.id, TokenPurpose::Reset, &state.jwt_secret)?;
        info!(
            "User {} has forgot their password. Reset token: {}",
            user.id, token
        );
    }

    Ok(StatusCode::ACCEPTED)
}

/// POST /auth/reset-password
/// Body: { "token": "...", "password": "..." }
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let user_id = validate_action_token(&payload.token, TokenPurpose::Reset, &state.jwt_secret)?;

    let hashed_password = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    state
        .users
        .update_password(user_id, &hashed_password)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("Password reset for user {}", user_id);

    Ok(StatusCode::OK)
}

/// POST /auth/request-verify-token
/// Body: { "email": "..." }
pub async fn request_verify_token(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<StatusCode, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if let Some(user) = state.users.find_by_email(&payload.email).await? {
        let token = create_action_token(&user.id, TokenPurpose::Verify, &state.jwt_secret)?;
        info!(
            "Verification requested for user {}. Verification token: {}",
            user.id, token
        );
    }

    Ok(StatusCode::ACCEPTED)
}

/// POST /auth/verify
/// Body: { "token": "..." }
pub async fn verify_user(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = validate_action_token(&payload.token, TokenPurpose::Verify, &state.jwt_secret)?;

    let user = state
        .users
        .mark_verified(user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("User {} verified", user.id);

    Ok(Json(user.into()))
}

/// GET /users/me
/// Headers: Authorization: Bearer <token>
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, ApiError> {
    let claims = validate_token(&headers, &state.jwt_secret)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(user.into()))
}

/// PATCH /users/me
/// Headers: Authorization: Bearer <token>
/// Body: { "email": ..., "password": ... } (both optional)
pub async fn update_me(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let claims = validate_token(&headers, &state.jwt_secret)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?;

    let mut user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Some(email) = payload.email {
        user = state
            .users
            .update_email(user_id, &email)
            .await?
            .ok_or(ApiError::NotFound)?;
    }

    if let Some(password) = payload.password {
        let hashed_password = hash(&password, DEFAULT_COST)
            .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;
        user = state
            .users
            .update_password(user_id, &hashed_password)
            .await?
            .ok_or(ApiError::NotFound)?;
    }

    Ok(Json(user.into()))
}
